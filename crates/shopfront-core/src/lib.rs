pub mod app_config;
pub mod cart;
pub mod config;
pub mod error;
pub mod format;
pub mod ids;
pub mod lenient;
pub mod orders;
pub mod products;
pub mod users;
pub mod variant;

pub use app_config::{AppConfig, CartFailurePolicy, Environment};
pub use cart::{clamp_quantity, validate_add_to_cart, AddToCartRequest, Cart, CartLine};
pub use config::{load_app_config, load_app_config_from_env, DEFAULT_ORDER_CREATE_ENDPOINTS};
pub use error::{ConfigError, ValidationError};
pub use format::format_currency;
pub use ids::EntityId;
pub use orders::{CreateOrderRequest, Order, OrderLine, OrderReceipt, ShippingAddress};
pub use products::{resolve_image_source, Product, Variant};
pub use users::{Credentials, LoginRequest, RegisterRequest, UserProfile};
pub use variant::{distinct_colors, distinct_sizes, find_variant, resolve_variant};

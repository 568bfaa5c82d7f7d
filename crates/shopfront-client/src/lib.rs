pub mod cache;
pub mod cart_controller;
pub mod client;
pub(crate) mod envelope;
pub mod error;
pub(crate) mod fallback;
pub mod session;

pub use cache::{ProductCache, ProductSource, SharedApiError};
pub use cart_controller::{
    CartBackend, CartController, CartEvent, ControllerSettings, LinePhase, QuantityChange,
    DEFAULT_DEBOUNCE,
};
pub use client::{ApiClient, ProductQuery, DEFAULT_API_PREFIX, DEFAULT_TIMEOUT_MS};
pub use error::ApiError;
pub use session::{Session, SessionEvent};

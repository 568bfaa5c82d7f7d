use thiserror::Error;

use crate::ids::EntityId;

/// Client-side validation failures. These are detected before any request
/// is made and never reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no variant matches the selected options for product {product_id}")]
    UnresolvedVariant { product_id: EntityId },

    #[error("variant {variant_id} is out of stock")]
    OutOfStock { variant_id: EntityId },

    #[error("requested {requested} of variant {variant_id} but only {available} in stock")]
    QuantityExceedsStock {
        variant_id: EntityId,
        requested: u32,
        available: u32,
    },

    #[error("cart line {line_id} is not in the cart")]
    UnknownCartLine { line_id: EntityId },

    #[error("missing {0} id")]
    MissingId(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

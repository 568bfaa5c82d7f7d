//! Catalog types: products and their purchasable color/size variants.
//!
//! ## Observed shape from the commerce API
//!
//! ### Identifiers
//! Products carry `id`, but older records were exported with `_id` or
//! `uuid`. All three are accepted.
//!
//! ### `price`
//! Either a JSON number or a decimal string (`"199000.00"`). Unparseable or
//! missing prices decode to `0` rather than failing the whole product.
//!
//! ### `stock`
//! Product-level stock is sometimes published as `quantity`. Missing → `0`.
//! Variant-level stock that is missing or non-numeric is treated as
//! unbounded (`None`), because the backend omits it for made-to-order items.
//!
//! ### `category`
//! A plain string on list endpoints, a `{ "id", "name" }` object on detail.
//!
//! ### `image_url`
//! A relative upload path, an absolute URL, or an object with `url`, `src`,
//! or `path`. See [`resolve_image_source`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::EntityId;
use crate::lenient;

/// Path prefix under which the backend serves uploaded product images.
pub const UPLOAD_PREFIX: &str = "/uploads";

/// A product as returned by `GET /v1/products` and `GET /v1/products/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(alias = "_id", alias = "uuid")]
    pub id: EntityId,

    /// Display name. Some records only carry `title`.
    #[serde(alias = "title", default = "default_product_name")]
    pub name: String,

    #[serde(default, deserialize_with = "string_or_empty")]
    pub description: String,

    #[serde(default, deserialize_with = "lenient::decimal_or_zero")]
    pub price: Decimal,

    #[serde(alias = "quantity", default, deserialize_with = "lenient::count_or_zero")]
    pub stock: u32,

    /// Category name; empty when the product is uncategorized.
    #[serde(default, deserialize_with = "category_name")]
    pub category: String,

    /// Raw image reference. Use [`Product::image`] for a servable path.
    #[serde(default)]
    pub image_url: Option<Value>,

    /// Variants embedded in the detail response, when the backend includes them.
    #[serde(default)]
    pub variants: Vec<Variant>,

    /// Variant to use when the product has no explicit variants.
    #[serde(default)]
    pub default_variant_id: Option<EntityId>,
}

impl Product {
    /// Returns a servable image path for this product, if it has one.
    #[must_use]
    pub fn image(&self) -> Option<String> {
        self.image_url.as_ref().and_then(resolve_image_source)
    }

    /// Returns `true` when the product itself is purchasable as a single
    /// implicit variant.
    #[must_use]
    pub fn is_single_variant(&self) -> bool {
        self.variants.is_empty()
    }
}

/// A purchasable color/size combination of a [`Product`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: EntityId,

    #[serde(default, alias = "productId")]
    pub product_id: Option<EntityId>,

    #[serde(
        default,
        alias = "color_name",
        alias = "colorName",
        deserialize_with = "lenient::optional_label"
    )]
    pub color: Option<String>,

    #[serde(
        default,
        alias = "size_name",
        alias = "sizeName",
        deserialize_with = "lenient::optional_label"
    )]
    pub size: Option<String>,

    /// Unit price override; `None` means "use the product price".
    #[serde(default, deserialize_with = "lenient::optional_decimal")]
    pub price: Option<Decimal>,

    /// Units available. `None` is unbounded.
    #[serde(default, alias = "quantity", deserialize_with = "lenient::optional_count")]
    pub stock: Option<u32>,
}

impl Variant {
    /// Unit price for this variant, falling back to `product_price`.
    #[must_use]
    pub fn effective_price(&self, product_price: Decimal) -> Decimal {
        self.price.unwrap_or(product_price)
    }

    /// Returns `true` when at least one unit can be bought.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock.is_none_or(|s| s > 0)
    }
}

fn default_product_name() -> String {
    "No name".to_owned()
}

fn string_or_empty<'de, D: serde::Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(match raw {
        Some(Value::String(s)) => s,
        _ => String::new(),
    })
}

fn category_name<'de, D: serde::Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    lenient::optional_label(d).map(Option::unwrap_or_default)
}

/// Turns the backend's assorted image references into a path the storefront
/// can serve.
///
/// - backslashes are normalized to `/`
/// - `http(s)://` URLs pass through untouched
/// - protocol-relative `//cdn/x.jpg` gets an `http:` scheme
/// - absolute paths (including `/uploads/...`) pass through
/// - `uploads/x.jpg` gains a leading slash
/// - anything else is assumed to be a bare upload file name
#[must_use]
pub fn resolve_image_source(raw: &Value) -> Option<String> {
    let source = match raw {
        Value::String(s) => s.clone(),
        Value::Object(map) => ["url", "src", "path"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .unwrap_or_default()
            .to_owned(),
        _ => return None,
    };
    let source = source.replace('\\', "/");
    let source = source.trim();
    if source.is_empty() {
        return None;
    }

    let lower = source.to_ascii_lowercase();
    let resolved = if lower.starts_with("http://") || lower.starts_with("https://") {
        source.to_owned()
    } else if let Some(rest) = source.strip_prefix("//") {
        format!("http://{rest}")
    } else if source.starts_with('/') {
        source.to_owned()
    } else if source.starts_with("uploads") {
        format!("/{source}")
    } else {
        format!("{UPLOAD_PREFIX}/{source}")
    };
    Some(resolved)
}

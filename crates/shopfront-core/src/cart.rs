//! Cart snapshot types and the pure quantity math behind optimistic updates.
//!
//! The backend owns the cart. Everything here operates on a local mirror
//! that is replaced wholesale by each server response; the helpers only
//! compute the estimate shown between a change and its confirmation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::EntityId;
use crate::lenient;
use crate::products::{Product, Variant};
use crate::variant::find_variant;

/// A user's cart as returned by `GET /v1/cart` and every cart mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartLine>,

    #[serde(default, deserialize_with = "lenient::decimal_or_zero")]
    pub total: Decimal,

    /// Payment method code the backend has on file for this cart.
    #[serde(default)]
    pub method: Option<i64>,
}

/// One variant and its requested quantity within a [`Cart`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: EntityId,

    #[serde(default)]
    pub variant: Option<Variant>,

    /// Owning product, when the backend sends it beside the variant.
    #[serde(default, alias = "productId")]
    pub product_id: Option<EntityId>,

    /// Id of the `product` object some backends embed on the line.
    #[serde(
        default,
        rename = "product",
        deserialize_with = "lenient::optional_ref_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub embedded_product_id: Option<EntityId>,

    #[serde(default, deserialize_with = "lenient::count_or_zero")]
    pub quantity: u32,

    /// Unit price captured on the line, if the backend sends one.
    #[serde(default, deserialize_with = "lenient::optional_decimal")]
    pub price: Option<Decimal>,

    /// Server-computed line total; local estimates overwrite it until the
    /// next snapshot arrives.
    #[serde(default, deserialize_with = "lenient::optional_decimal")]
    pub line_total: Option<Decimal>,
}

impl CartLine {
    /// Unit price: the line's own price, else the variant's, else zero.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.price
            .or_else(|| self.variant.as_ref().and_then(|v| v.price))
            .unwrap_or_default()
    }

    /// Stock ceiling for this line. `None` is unbounded.
    #[must_use]
    pub fn max_stock(&self) -> Option<u32> {
        self.variant.as_ref().and_then(|v| v.stock)
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn estimated_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }

    /// The product this line belongs to: the variant's, else the line's own
    /// `product_id`, else the embedded `product` object's id.
    #[must_use]
    pub fn owning_product_id(&self) -> Option<&EntityId> {
        self.variant
            .as_ref()
            .and_then(|v| v.product_id.as_ref())
            .or(self.product_id.as_ref())
            .or(self.embedded_product_id.as_ref())
    }
}

impl Cart {
    /// The local state used when there is no authenticated session.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn line(&self, line_id: &EntityId) -> Option<&CartLine> {
        self.items.iter().find(|l| &l.id == line_id)
    }

    /// Sum of the lines' estimated totals.
    #[must_use]
    pub fn estimated_total(&self) -> Decimal {
        self.items.iter().map(CartLine::estimated_total).sum()
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u64 {
        self.items.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Applies an already-clamped quantity to a line and recomputes the line
    /// and cart estimates. Returns the previous quantity.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownCartLine`] if `line_id` is not in the cart.
    pub fn apply_quantity(
        &mut self,
        line_id: &EntityId,
        quantity: u32,
    ) -> Result<u32, ValidationError> {
        let line = self
            .items
            .iter_mut()
            .find(|l| &l.id == line_id)
            .ok_or_else(|| ValidationError::UnknownCartLine {
                line_id: line_id.clone(),
            })?;
        let previous = line.quantity;
        line.quantity = quantity;
        line.line_total = Some(line.estimated_total());
        self.total = self.estimated_total();
        Ok(previous)
    }
}

/// Clamps a requested quantity to `[0, max_stock]`. `None` stock is unbounded.
#[must_use]
pub fn clamp_quantity(desired: i64, max_stock: Option<u32>) -> u32 {
    let upper = max_stock.unwrap_or(u32::MAX);
    let bounded = desired.clamp(0, i64::from(upper));
    u32::try_from(bounded).unwrap_or(upper)
}

/// Payload for `POST /v1/cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddToCartRequest {
    pub variant_id: EntityId,
    pub quantity: u32,
}

/// Validates an add-to-cart action against the product's variants and stock.
///
/// Quantities below one are raised to one. With no variants the product is
/// its own single variant: `default_variant_id` is used and the product's
/// stock is the ceiling.
///
/// # Errors
///
/// - [`ValidationError::UnresolvedVariant`] when no variant can be determined.
/// - [`ValidationError::OutOfStock`] when the resolved variant has no stock.
/// - [`ValidationError::QuantityExceedsStock`] when more is requested than is available.
pub fn validate_add_to_cart(
    product: &Product,
    variants: &[Variant],
    selected_color: Option<&str>,
    selected_size: Option<&str>,
    quantity: u32,
) -> Result<AddToCartRequest, ValidationError> {
    let quantity = quantity.max(1);

    let (variant_id, stock) = if variants.is_empty() {
        let id = product.default_variant_id.clone().ok_or_else(|| {
            ValidationError::UnresolvedVariant {
                product_id: product.id.clone(),
            }
        })?;
        (id, Some(product.stock))
    } else {
        let variant = find_variant(variants, selected_color, selected_size).ok_or_else(|| {
            ValidationError::UnresolvedVariant {
                product_id: product.id.clone(),
            }
        })?;
        (variant.id.clone(), variant.stock)
    };

    match stock {
        Some(0) => Err(ValidationError::OutOfStock { variant_id }),
        Some(available) if quantity > available => Err(ValidationError::QuantityExceedsStock {
            variant_id,
            requested: quantity,
            available,
        }),
        _ => Ok(AddToCartRequest {
            variant_id,
            quantity,
        }),
    }
}

#[cfg(test)]
#[path = "cart_test.rs"]
mod tests;

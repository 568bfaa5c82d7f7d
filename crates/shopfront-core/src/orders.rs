//! Orders and shipping addresses.
//!
//! Order payloads differ between the backend's order endpoints, so most
//! fields accept several spellings. Totals go through the same lenient
//! decimal decoding as product prices.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ids::EntityId;
use crate::lenient;
use crate::products::Variant;

const DEFAULT_STATUS: &str = "processing";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: EntityId,

    /// Human-facing order code, when the backend issues one.
    #[serde(default, alias = "order_code")]
    pub code: Option<String>,

    #[serde(default, alias = "state")]
    pub status: Option<String>,

    #[serde(
        default,
        alias = "total_amount",
        alias = "amount",
        deserialize_with = "lenient::decimal_or_zero"
    )]
    pub total: Decimal,

    /// Raw timestamp as sent. See [`Order::created_at`].
    #[serde(default, rename = "created_at", alias = "createdAt")]
    pub created_at_raw: Option<String>,

    #[serde(default, alias = "order_items", alias = "lines")]
    pub items: Vec<OrderLine>,

    #[serde(
        default,
        alias = "shippingAddress",
        alias = "address",
        alias = "delivery_address",
        deserialize_with = "shipping_address"
    )]
    pub shipping_address: Option<ShippingAddress>,

    #[serde(default, alias = "userId", alias = "customer_id")]
    pub user_id: Option<EntityId>,

    #[serde(default)]
    pub note: Option<String>,
}

impl Order {
    /// The code customers see: `code` if issued, else the id.
    #[must_use]
    pub fn display_code(&self) -> String {
        self.code
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }

    #[must_use]
    pub fn status(&self) -> &str {
        self.status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_STATUS)
    }

    /// Creation time, when the backend sent an RFC 3339 timestamp.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at_raw
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Distinct owning product ids across the order lines, in line order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = Vec::new();
        for id in self.items.iter().filter_map(OrderLine::owning_product_id) {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(default)]
    pub id: Option<EntityId>,

    #[serde(default, alias = "product_variant", alias = "item")]
    pub variant: Option<Variant>,

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

    #[serde(default, deserialize_with = "lenient::optional_decimal")]
    pub price: Option<Decimal>,
}

impl OrderLine {
    #[must_use]
    pub fn owning_product_id(&self) -> Option<&EntityId> {
        self.variant
            .as_ref()
            .and_then(|v| v.product_id.as_ref())
            .or(self.product_id.as_ref())
            .or(self.embedded_product_id.as_ref())
    }
}

/// A delivery address as attached to an order or saved on a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    #[serde(
        default,
        alias = "full_name",
        alias = "fullName",
        alias = "fullname",
        alias = "recipient_name",
        alias = "receiver_name",
        alias = "receiverName",
        deserialize_with = "lenient::optional_text"
    )]
    pub name: Option<String>,

    #[serde(
        default,
        alias = "phone_number",
        alias = "phoneNumber",
        alias = "mobile",
        deserialize_with = "lenient::optional_text"
    )]
    pub phone: Option<String>,

    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub email: Option<String>,

    #[serde(
        default,
        alias = "address_line1",
        alias = "line1",
        deserialize_with = "lenient::optional_text"
    )]
    pub address: Option<String>,

    /// Street line, sent by some backends beside or instead of `address`.
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub street: Option<String>,

    #[serde(default, alias = "ward_name", deserialize_with = "lenient::optional_text")]
    pub ward: Option<String>,

    #[serde(default, alias = "district_name", deserialize_with = "lenient::optional_text")]
    pub district: Option<String>,

    #[serde(
        default,
        alias = "city_name",
        alias = "province",
        alias = "province_name",
        deserialize_with = "lenient::optional_text"
    )]
    pub city: Option<String>,

    #[serde(
        default,
        alias = "zip",
        alias = "zipcode",
        deserialize_with = "lenient::optional_text"
    )]
    pub postal_code: Option<String>,

    #[serde(
        default,
        alias = "address_text",
        alias = "addressLine",
        deserialize_with = "lenient::optional_text"
    )]
    pub full_address: Option<String>,

    #[serde(
        default,
        alias = "isDefault",
        alias = "default",
        deserialize_with = "lenient::truthy"
    )]
    pub is_default: bool,
}

impl ShippingAddress {
    /// Single display line: `full_address` when present, otherwise the
    /// non-empty parts of address (or street), ward, district, and city
    /// joined by `", "`.
    #[must_use]
    pub fn display_line(&self) -> String {
        if let Some(full) = self.full_address.as_deref().filter(|s| !s.trim().is_empty()) {
            return full.to_owned();
        }
        let line = self.address.as_ref().or(self.street.as_ref());
        [line, self.ward.as_ref(), self.district.as_ref(), self.city.as_ref()]
            .into_iter()
            .filter_map(|p| p.map(String::as_str))
            .filter(|p| !p.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Accepts a bare string (the whole address line) or an address object.
fn shipping_address<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ShippingAddress>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(match raw {
        Some(Value::String(line)) if !line.trim().is_empty() => Some(ShippingAddress {
            full_address: Some(line),
            ..ShippingAddress::default()
        }),
        Some(obj @ Value::Object(_)) => serde_json::from_value(obj).ok(),
        _ => None,
    })
}

/// Payload for creating an order from the current cart.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    /// Payment method code understood by the backend.
    pub method: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<ShippingAddress>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CreateOrderRequest {
    #[must_use]
    pub fn new(method: i64) -> Self {
        Self {
            method,
            shipping_address: None,
            note: None,
        }
    }
}

/// What the backend hands back after creating an order. Only the
/// reference fields are read; the body shape varies between endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderReceipt {
    #[serde(default, alias = "_id", alias = "order_id", alias = "orderId")]
    pub id: Option<EntityId>,

    #[serde(default, alias = "order_code", alias = "orderCode")]
    pub code: Option<String>,

    #[serde(default, alias = "state")]
    pub status: Option<String>,

    #[serde(
        default,
        alias = "total_amount",
        alias = "amount",
        deserialize_with = "lenient::optional_decimal"
    )]
    pub total: Option<Decimal>,
}

impl OrderReceipt {
    /// Human-facing reference: the order code, else `#<id>`, else empty.
    #[must_use]
    pub fn reference(&self) -> String {
        match (&self.code, &self.id) {
            (Some(code), _) if !code.trim().is_empty() => code.clone(),
            (_, Some(id)) => format!("#{id}"),
            _ => String::new(),
        }
    }
}

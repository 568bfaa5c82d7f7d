//! Account profile types.

use serde::{Deserialize, Serialize};

use crate::ids::EntityId;
use crate::lenient;
use crate::orders::ShippingAddress;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: EntityId,

    #[serde(
        default,
        alias = "fullName",
        alias = "full_name",
        deserialize_with = "lenient::optional_text"
    )]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub email: Option<String>,

    #[serde(
        default,
        alias = "phone_number",
        alias = "phoneNumber",
        deserialize_with = "lenient::optional_text"
    )]
    pub phone: Option<String>,

    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub role: Option<String>,

    /// Saved address book, when the backend has one for this user.
    #[serde(default)]
    pub addresses: Vec<ShippingAddress>,

    // Older accounts store a single address directly on the profile.
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub address: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub street: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub ward: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub district: Option<String>,
    #[serde(default, alias = "province", deserialize_with = "lenient::optional_text")]
    pub city: Option<String>,
}

impl UserProfile {
    /// The address to prefill at checkout.
    ///
    /// Picks the address flagged as default, else the first saved address,
    /// else an address assembled from the profile's own address fields.
    /// Name and phone fall back to the profile's when the address lacks them.
    #[must_use]
    pub fn default_address(&self) -> Option<ShippingAddress> {
        let picked = self
            .addresses
            .iter()
            .find(|a| a.is_default)
            .or_else(|| self.addresses.first())
            .cloned()
            .or_else(|| self.inline_address());

        picked.map(|mut a| {
            if a.name.is_none() {
                a.name.clone_from(&self.name);
            }
            if a.phone.is_none() {
                a.phone.clone_from(&self.phone);
            }
            a
        })
    }

    fn inline_address(&self) -> Option<ShippingAddress> {
        let has_any = [
            &self.address,
            &self.street,
            &self.ward,
            &self.district,
            &self.city,
        ]
        .into_iter()
        .any(Option::is_some);
        has_any.then(|| ShippingAddress {
            address: self.address.clone(),
            street: self.street.clone(),
            ward: self.ward.clone(),
            district: self.district.clone(),
            city: self.city.clone(),
            ..ShippingAddress::default()
        })
    }
}

/// Result of a successful login, after the token has been extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    /// Lowercased role, empty when the backend did not report one.
    pub role: String,
}

/// Payload for `POST /v1/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    /// Builds a login request with the email trimmed and lowercased.
    #[must_use]
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_lowercase(),
            password: password.to_owned(),
        }
    }
}

/// Payload for `POST /v1/auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl RegisterRequest {
    #[must_use]
    pub fn new(name: &str, email: &str, password: &str) -> Self {
        Self {
            name: name.trim().to_owned(),
            email: email.trim().to_lowercase(),
            password: password.to_owned(),
            phone: None,
        }
    }
}

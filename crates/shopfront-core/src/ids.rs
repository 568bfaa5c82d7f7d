//! Backend identifiers.
//!
//! The commerce API is inconsistent about id types: products usually come
//! back with numeric ids, while some collections use string keys (`_id`,
//! `uuid`). [`EntityId`] accepts either and remembers nothing about the
//! original JSON type beyond what the string itself says.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque identifier for products, variants, cart lines, orders, and users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for an empty or whitespace-only id, which no backend record has.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Returns the id as an integer when it is one (`"42"` → `42`).
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// Canonical integer ids go back out as JSON numbers so request payloads
/// carry the same type the backend handed us. `"007"` stays a string.
impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_u64().filter(|n| n.to_string() == self.0) {
            Some(n) => serializer.serialize_u64(n),
            None => serializer.serialize_str(&self.0),
        }
    }
}

struct EntityIdVisitor;

impl Visitor<'_> for EntityIdVisitor {
    type Value = EntityId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or integer identifier")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Err(E::custom("identifier must not be empty"));
        }
        Ok(EntityId::from(trimmed))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(EntityId::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(EntityId(v.to_string()))
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(EntityIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_numbers_and_strings() {
        let n: EntityId = serde_json::from_str("42").unwrap();
        let s: EntityId = serde_json::from_str("\"abc-1\"").unwrap();
        assert_eq!(n.as_str(), "42");
        assert_eq!(s.as_str(), "abc-1");
    }

    #[test]
    fn rejects_blank_string() {
        assert!(serde_json::from_str::<EntityId>("\"  \"").is_err());
    }

    #[test]
    fn numeric_ids_serialize_as_numbers() {
        assert_eq!(serde_json::to_string(&EntityId::from(7u64)).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&EntityId::from("sku-7")).unwrap(),
            "\"sku-7\""
        );
    }

    #[test]
    fn zero_padded_ids_stay_strings() {
        let id: EntityId = serde_json::from_str("\"007\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"007\"");
        assert_eq!(serde_json::to_string(&EntityId::from("0")).unwrap(), "0");
    }
}

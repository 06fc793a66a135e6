//! Strongly-typed identifiers for platform records
//!
//! The record platform addresses every record by a positive integer
//! "internal id". Callers send these either as JSON numbers or as numeric
//! strings (query parameters are always strings), so every identifier accepts
//! both on input and is always written back as a number.
//!
//! Newtype wrappers keep a sales order id from being passed where a customer
//! or item reference is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when parsing an internal id
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("internal id must be a positive integer, got {0:?}")]
    NotNumeric(String),

    #[error("internal id must be greater than zero")]
    Zero,
}

/// Untyped wire form of an identifier, number or string
#[doc(hidden)]
#[derive(Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(u64),
    Text(String),
}

fn parse_raw(raw: RawId) -> Result<u64, IdError> {
    let value = match raw {
        RawId::Number(n) => n,
        RawId::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| IdError::NotNumeric(s.clone()))?,
    };
    if value == 0 {
        return Err(IdError::Zero);
    }
    Ok(value)
}

macro_rules! define_id {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "RawId", into = "u64")]
        pub struct $name(u64);

        impl $name {
            /// Creates an identifier, rejecting zero
            pub fn new(value: u64) -> Result<Self, IdError> {
                if value == 0 {
                    return Err(IdError::Zero);
                }
                Ok(Self(value))
            }

            /// Returns the raw numeric value
            pub fn value(&self) -> u64 {
                self.0
            }

            /// Returns a human readable label for log and error messages
            pub fn label() -> &'static str {
                $label
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_raw(RawId::Text(s.to_string())).map(Self)
            }
        }

        impl TryFrom<RawId> for $name {
            type Error = IdError;

            fn try_from(raw: RawId) -> Result<Self, Self::Error> {
                parse_raw(raw).map(Self)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }
    };
}

// Generic record identifier used by the record service contract
define_id!(InternalId, "record");

// Typed references used by the sales order requests
define_id!(SalesOrderId, "sales order");
define_id!(EntityId, "entity");
define_id!(ItemId, "item");

macro_rules! into_internal {
    ($($name:ident),*) => {
        $(
            impl From<$name> for InternalId {
                fn from(id: $name) -> InternalId {
                    InternalId(id.0)
                }
            }

            impl From<InternalId> for $name {
                fn from(id: InternalId) -> $name {
                    $name(id.0)
                }
            }
        )*
    };
}

into_internal!(SalesOrderId, EntityId, ItemId);

/// Record types known to the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    #[serde(rename = "salesorder")]
    SalesOrder,
}

impl RecordType {
    /// Identifier used in record representations (`salesorder`)
    pub fn script_id(&self) -> &'static str {
        match self {
            RecordType::SalesOrder => "salesorder",
        }
    }

    /// Path segment used by the REST record API (`salesOrder`)
    pub fn rest_path(&self) -> &'static str {
        match self {
            RecordType::SalesOrder => "salesOrder",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.script_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_string() {
        let id: SalesOrderId = "23327".parse().unwrap();
        assert_eq!(id.value(), 23327);
        assert_eq!(id.to_string(), "23327");
    }

    #[test]
    fn test_zero_rejected() {
        assert_eq!("0".parse::<InternalId>(), Err(IdError::Zero));
        assert_eq!(EntityId::new(0), Err(IdError::Zero));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!("abc".parse::<ItemId>(), Err(IdError::NotNumeric(_))));
        assert!(matches!("-4".parse::<ItemId>(), Err(IdError::NotNumeric(_))));
    }

    #[test]
    fn test_deserialize_number_or_string() {
        let from_number: EntityId = serde_json::from_str("534").unwrap();
        let from_string: EntityId = serde_json::from_str("\"534\"").unwrap();
        assert_eq!(from_number, from_string);
        assert!(serde_json::from_str::<EntityId>("0").is_err());
        assert!(serde_json::from_str::<EntityId>("-1").is_err());
        assert!(serde_json::from_str::<EntityId>("null").is_err());
    }

    #[test]
    fn test_serializes_as_number() {
        let id = ItemId::new(338).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "338");
    }

    #[test]
    fn test_typed_ids_convert_through_internal_id() {
        let so = SalesOrderId::new(42).unwrap();
        let internal: InternalId = so.into();
        let back: SalesOrderId = internal.into();
        assert_eq!(so, back);
    }

    #[test]
    fn test_record_type_names() {
        assert_eq!(RecordType::SalesOrder.script_id(), "salesorder");
        assert_eq!(RecordType::SalesOrder.rest_path(), "salesOrder");
        assert_eq!(
            serde_json::to_string(&RecordType::SalesOrder).unwrap(),
            "\"salesorder\""
        );
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// The value carried by one sample.
///
/// A trapper item is created with exactly one value type on the server, so the
/// variant chosen here must agree with the [`ValueType`](crate::zabbix::ValueType)
/// the item was provisioned with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemValue {
    Boolean(bool),
    Unsigned(u64),
    Float(f64),
    Text(String),
}

impl ItemValue {
    /// Gauges and rates can be NaN or infinite; the server rejects those.
    pub fn is_finite(&self) -> bool {
        match self {
            ItemValue::Float(v) => v.is_finite(),
            _ => true,
        }
    }
}

impl fmt::Display for ItemValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemValue::Boolean(v) => write!(f, "{v}"),
            ItemValue::Unsigned(v) => write!(f, "{v}"),
            ItemValue::Float(v) => write!(f, "{v}"),
            ItemValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<u64> for ItemValue {
    fn from(value: u64) -> Self {
        ItemValue::Unsigned(value)
    }
}

impl From<u32> for ItemValue {
    fn from(value: u32) -> Self {
        ItemValue::Unsigned(value as u64)
    }
}

impl From<f64> for ItemValue {
    fn from(value: f64) -> Self {
        ItemValue::Float(value)
    }
}

impl From<bool> for ItemValue {
    fn from(value: bool) -> Self {
        ItemValue::Boolean(value)
    }
}

impl From<String> for ItemValue {
    fn from(value: String) -> Self {
        ItemValue::Text(value)
    }
}

impl From<&str> for ItemValue {
    fn from(value: &str) -> Self {
        ItemValue::Text(value.to_string())
    }
}

/// One `(host, key, value)` triple as pushed to a trapper item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub host: String,
    pub key: String,
    pub value: ItemValue,
}

impl Sample {
    pub fn new(host: impl Into<String>, key: impl Into<String>, value: impl Into<ItemValue>) -> Self {
        Self {
            host: host.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_serializes_with_wire_field_names() {
        let sample = Sample::new("10.0.0.5", "app-requests", 42u64);
        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(json, r#"{"host":"10.0.0.5","key":"app-requests","value":42}"#);
    }

    #[test]
    fn test_item_value_variants_serialize_untagged() {
        assert_eq!(serde_json::to_string(&ItemValue::Boolean(false)).unwrap(), "false");
        assert_eq!(serde_json::to_string(&ItemValue::Float(0.5)).unwrap(), "0.5");
        assert_eq!(
            serde_json::to_string(&ItemValue::from("disk full")).unwrap(),
            r#""disk full""#
        );
    }

    #[test]
    fn test_non_finite_floats_are_flagged() {
        assert!(!ItemValue::Float(f64::NAN).is_finite());
        assert!(!ItemValue::Float(f64::INFINITY).is_finite());
        assert!(ItemValue::Float(1.5).is_finite());
        assert!(ItemValue::Unsigned(0).is_finite());
    }
}

//! Wire types for the twin API.
//!
//! These match the JSON returned by the `/api/hdt` endpoints. The same
//! [`PropertyRecord`] shape is used by the stream feed, so samples coming from
//! polling and from the stream can be handled by the same code.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Name of the field that carries a sample's epoch-millisecond timestamp.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// A scalar carried by a property field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Default for Scalar {
    fn default() -> Self {
        Scalar::Other(serde_json::Value::Null)
    }
}

impl Scalar {
    /// Returns the numeric value, if this scalar is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Whole numbers print without a trailing ".0"
            Scalar::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Other(v) => write!(f, "{}", v),
        }
    }
}

/// A typed value record: `{ "value": ... }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    #[serde(default)]
    pub value: Scalar,
}

impl FieldValue {
    pub fn number(n: f64) -> Self {
        Self {
            value: Scalar::Number(n),
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self {
            value: Scalar::Text(s.into()),
        }
    }
}

/// Field name to value map of a property sample.
///
/// Keeps fields in the order they appear in the JSON document, which is the
/// order used when inferring chart series from a sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap(Vec<(String, FieldValue)>);

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing an existing one with the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for ValueMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ValueMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueMapVisitor;

        impl<'de> Visitor<'de> for ValueMapVisitor {
            type Value = ValueMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to value records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ValueMap, A::Error> {
                let mut map = ValueMap::new();
                while let Some((key, value)) = access.next_entry::<String, FieldValue>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(ValueMapVisitor)
    }
}

/// The `value` envelope of a property record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyValue {
    #[serde(rename = "valueMap", default)]
    pub value_map: ValueMap,
}

/// One property sample of a twin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub key: String,
    #[serde(default)]
    pub value: PropertyValue,
}

impl PropertyRecord {
    pub fn new(key: impl Into<String>, value_map: ValueMap) -> Self {
        Self {
            key: key.into(),
            value: PropertyValue { value_map },
        }
    }

    pub fn value_map(&self) -> &ValueMap {
        &self.value.value_map
    }

    /// The numeric `timestamp` field, if present.
    pub fn timestamp(&self) -> Option<f64> {
        self.value_map().get(TIMESTAMP_FIELD).and_then(|f| f.value.as_number())
    }
}

/// Current state of a twin as returned by `GET /api/hdt/{id}/state`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HdtStatus {
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
}

/// Property descriptor returned by `GET /api/hdt/{id}/state/properties`.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDescriptor {
    pub value: DescriptorValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DescriptorValue {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATE_JSON: &str = r#"{
        "properties": [
            {
                "key": "heart-rate",
                "value": {
                    "valueMap": {
                        "timestamp": { "value": 1700000000000 },
                        "bpm": { "value": 72 },
                        "note": { "value": "resting" }
                    }
                }
            },
            {
                "key": "flags",
                "value": { "valueMap": { "ok": { "value": true } } }
            }
        ]
    }"#;

    #[test]
    fn parses_state_snapshot() {
        let status: HdtStatus = serde_json::from_str(STATE_JSON).unwrap();
        assert_eq!(status.properties.len(), 2);

        let hr = &status.properties[0];
        assert_eq!(hr.key, "heart-rate");
        assert_eq!(hr.timestamp(), Some(1_700_000_000_000.0));
        assert_eq!(hr.value_map().get("bpm"), Some(&FieldValue::number(72.0)));
        assert_eq!(hr.value_map().get("note"), Some(&FieldValue::text("resting")));

        let flags = &status.properties[1];
        assert_eq!(
            flags.value_map().get("ok").unwrap().value,
            Scalar::Other(serde_json::Value::Bool(true))
        );
        assert!(flags.timestamp().is_none());
    }

    #[test]
    fn value_map_keeps_document_order() {
        let map: ValueMap =
            serde_json::from_str(r#"{"zeta":{"value":1},"alpha":{"value":2},"mid":{"value":3}}"#)
                .unwrap();
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn missing_properties_default_to_empty() {
        let status: HdtStatus = serde_json::from_str("{}").unwrap();
        assert!(status.properties.is_empty());
    }

    #[test]
    fn text_timestamp_is_not_numeric() {
        let record = PropertyRecord::new(
            "mood",
            [("timestamp", FieldValue::text("yesterday"))].into_iter().collect(),
        );
        assert!(record.timestamp().is_none());
    }

    #[test]
    fn scalar_display() {
        assert_eq!(Scalar::Number(70.0).to_string(), "70");
        assert_eq!(Scalar::Number(36.6).to_string(), "36.6");
        assert_eq!(Scalar::Text("ok".into()).to_string(), "ok");
        assert_eq!(Scalar::default().to_string(), "null");
    }

    #[test]
    fn descriptor_exposes_nested_id() {
        let descriptors: Vec<PropertyDescriptor> =
            serde_json::from_str(r#"[{"value":{"id":"heart-rate","extra":1}}]"#).unwrap();
        assert_eq!(descriptors[0].value.id, "heart-rate");
    }
}

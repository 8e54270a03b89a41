//! Structured metadata attached to each log entry
//!
//! `Meta` is an ordered open mapping from field name to [`MetaValue`], a closed
//! set of JSON-representable values. Errors get their own variant so both
//! pipelines can expand them into a message plus the chain of causes.

use super::error::{LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Expanded form of an error value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorDetail {
    pub message: String,
    pub stack: Vec<String>,
}

impl ErrorDetail {
    /// Capture an error and its `source()` chain
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut stack = vec![err.to_string()];
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push(format!("caused by: {}", cause));
            source = cause.source();
        }
        Self {
            message: err.to_string(),
            stack,
        }
    }
}

/// Value type for metadata fields
///
/// Written JSON carries no type tags. When a record is read back, an object
/// with exactly a string `message` and a string-list `stack` becomes
/// [`MetaValue::Error`], even if it was logged as a [`MetaValue::Map`]. Any
/// other key set stays a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<MetaValue>),
    Error(ErrorDetail),
    Map(Meta),
}

impl MetaValue {
    /// Convert any serializable value, falling back to its `Debug` text when
    /// it has no JSON representation
    pub fn from_serialize<T>(value: &T) -> Self
    where
        T: Serialize + fmt::Debug + ?Sized,
    {
        match Self::try_from_serialize(value) {
            Ok(converted) => converted,
            Err(_) => MetaValue::String(format!("{:?}", value)),
        }
    }

    /// Strict conversion through `serde_json`
    pub fn try_from_serialize<T>(value: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_value(value)
            .map_err(|e| LoggerError::serialization("<value>", e.to_string()))?;
        Ok(MetaValue::from(json))
    }

    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            MetaValue::Null => serde_json::Value::Null,
            MetaValue::Bool(b) => serde_json::Value::Bool(*b),
            MetaValue::Int(i) => serde_json::Value::Number((*i).into()),
            MetaValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            MetaValue::String(s) => serde_json::Value::String(s.clone()),
            MetaValue::List(items) => {
                serde_json::Value::Array(items.iter().map(MetaValue::to_json_value).collect())
            }
            MetaValue::Error(detail) => serde_json::json!({
                "message": detail.message,
                "stack": detail.stack,
            }),
            MetaValue::Map(meta) => meta.to_json_value(),
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::String(s) => f.write_str(s),
            other => write!(f, "{}", other.to_json_value()),
        }
    }
}

impl From<serde_json::Value> for MetaValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => MetaValue::Null,
            serde_json::Value::Bool(b) => MetaValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => MetaValue::Int(i),
                None => n.as_f64().map(MetaValue::Float).unwrap_or(MetaValue::Null),
            },
            serde_json::Value::String(s) => MetaValue::String(s),
            serde_json::Value::Array(items) => {
                MetaValue::List(items.into_iter().map(MetaValue::from).collect())
            }
            serde_json::Value::Object(map) => MetaValue::Map(Meta::from(map)),
        }
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::String(s)
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::String(s.to_string())
    }
}

impl From<i64> for MetaValue {
    fn from(i: i64) -> Self {
        MetaValue::Int(i)
    }
}

impl From<i32> for MetaValue {
    fn from(i: i32) -> Self {
        MetaValue::Int(i64::from(i))
    }
}

impl From<u32> for MetaValue {
    fn from(i: u32) -> Self {
        MetaValue::Int(i64::from(i))
    }
}

impl From<u16> for MetaValue {
    fn from(i: u16) -> Self {
        MetaValue::Int(i64::from(i))
    }
}

impl From<u64> for MetaValue {
    fn from(i: u64) -> Self {
        i64::try_from(i)
            .map(MetaValue::Int)
            .unwrap_or(MetaValue::Float(i as f64))
    }
}

impl From<usize> for MetaValue {
    fn from(i: usize) -> Self {
        MetaValue::from(i as u64)
    }
}

impl From<f64> for MetaValue {
    fn from(f: f64) -> Self {
        MetaValue::Float(f)
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        MetaValue::Bool(b)
    }
}

impl From<Meta> for MetaValue {
    fn from(meta: Meta) -> Self {
        MetaValue::Map(meta)
    }
}

impl<T: Into<MetaValue>> From<Vec<T>> for MetaValue {
    fn from(items: Vec<T>) -> Self {
        MetaValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<MetaValue>> From<Option<T>> for MetaValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(MetaValue::Null)
    }
}

/// Metadata mapping for one log entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meta {
    fields: BTreeMap<String, MetaValue>,
}

impl Meta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<MetaValue>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a field (mutable version)
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<MetaValue>,
    {
        self.fields.insert(key.into(), value.into());
    }

    /// Add an error field, expanded into message and cause chain
    pub fn with_error<K>(mut self, key: K, err: &(dyn std::error::Error + 'static)) -> Self
    where
        K: Into<String>,
    {
        self.fields
            .insert(key.into(), MetaValue::Error(ErrorDetail::from_error(err)));
        self
    }

    /// Add any serializable value; values without a JSON form are stored as
    /// their `Debug` text and the problem is reported on stderr
    pub fn with_serialized<K, T>(mut self, key: K, value: &T) -> Self
    where
        K: Into<String>,
        T: Serialize + fmt::Debug + ?Sized,
    {
        let key = key.into();
        let converted = match MetaValue::try_from_serialize(value) {
            Ok(converted) => converted,
            Err(_) => {
                let err = LoggerError::serialization(&key, "value has no JSON representation");
                eprintln!("[LOGGER WARNING] {}; storing debug text instead", err);
                MetaValue::from_serialize(value)
            }
        };
        self.fields.insert(key, converted);
        self
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.fields.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<MetaValue> {
        self.fields.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetaValue)> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json_value()))
                .collect(),
        )
    }

    /// Compact single-line JSON rendering
    #[must_use]
    pub fn to_json_string(&self) -> String {
        self.to_json_value().to_string()
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Meta {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            fields: map
                .into_iter()
                .map(|(k, v)| (k, MetaValue::from(v)))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<MetaValue>> FromIterator<(K, V)> for Meta {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for Meta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_string())
    }
}

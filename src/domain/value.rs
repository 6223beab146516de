// Value coercion for path vars, query params and headers

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// A value that can be emitted into a path, query string or header
///
/// Every variant has a canonical string form (see the `Display` impl).
/// Timestamps render as RFC 3339 with whole seconds, floats use the shortest
/// representation, and `Computed` values are produced on demand.
#[derive(Clone)]
pub enum PathValue {
    String(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Timestamp(DateTime<FixedOffset>),
    Uuid(Uuid),
    Json(serde_json::Value),
    Computed(Arc<dyn Fn() -> String + Send + Sync>),
}

impl PathValue {
    /// Wrap a closure whose result is evaluated each time the value is emitted
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        PathValue::Computed(Arc::new(f))
    }

    /// Coerce any serializable value via its JSON form
    pub fn json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        Ok(PathValue::Json(serde_json::to_value(value)?))
    }

    /// JSON `null` stands for a missing value
    pub fn is_absent(&self) -> bool {
        matches!(self, PathValue::Json(serde_json::Value::Null))
    }
}

impl fmt::Display for PathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathValue::String(s) => f.write_str(s),
            PathValue::Int(i) => write!(f, "{}", i),
            PathValue::UInt(u) => write!(f, "{}", u),
            PathValue::Float(v) => write!(f, "{}", v),
            PathValue::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            PathValue::Timestamp(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
            PathValue::Uuid(id) => write!(f, "{}", id),
            // JSON strings lose their quotes, everything else is emitted as JSON text
            PathValue::Json(serde_json::Value::String(s)) => f.write_str(s),
            PathValue::Json(v) => write!(f, "{}", v),
            PathValue::Computed(func) => f.write_str(&func()),
        }
    }
}

impl fmt::Debug for PathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathValue::Computed(_) => f.write_str("Computed(..)"),
            other => write!(f, "{:?}", other.to_string()),
        }
    }
}

impl PartialEq for PathValue {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Serialize for PathValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<String> for PathValue {
    fn from(value: String) -> Self {
        PathValue::String(value)
    }
}

impl From<&str> for PathValue {
    fn from(value: &str) -> Self {
        PathValue::String(value.to_string())
    }
}

impl From<&String> for PathValue {
    fn from(value: &String) -> Self {
        PathValue::String(value.clone())
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for PathValue {
            fn from(value: $t) -> Self {
                PathValue::Int(value as i64)
            }
        })*
    };
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for PathValue {
            fn from(value: $t) -> Self {
                PathValue::UInt(value as u64)
            }
        })*
    };
}

from_signed!(i8, i16, i32, i64, isize);
from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for PathValue {
    fn from(value: f32) -> Self {
        PathValue::Float(value as f64)
    }
}

impl From<f64> for PathValue {
    fn from(value: f64) -> Self {
        PathValue::Float(value)
    }
}

impl From<bool> for PathValue {
    fn from(value: bool) -> Self {
        PathValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for PathValue {
    fn from(value: DateTime<Utc>) -> Self {
        PathValue::Timestamp(value.fixed_offset())
    }
}

impl From<DateTime<FixedOffset>> for PathValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        PathValue::Timestamp(value)
    }
}

impl From<Uuid> for PathValue {
    fn from(value: Uuid) -> Self {
        PathValue::Uuid(value)
    }
}

impl From<serde_json::Value> for PathValue {
    fn from(value: serde_json::Value) -> Self {
        PathValue::Json(value)
    }
}

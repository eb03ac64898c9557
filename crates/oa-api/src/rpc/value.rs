use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// An XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `<nil/>`
    Nil,
    /// `<boolean>`
    Bool(bool),
    /// `<int>`, `<i4>` or `<i8>`
    Int(i64),
    /// `<double>`
    Double(f64),
    /// `<string>`, or a `<value>` without a type element
    String(String),
    /// `<dateTime.iso8601>`, kept verbatim
    DateTime(String),
    /// `<base64>`, decoded
    Base64(Vec<u8>),
    /// `<array>`
    Array(Vec<Value>),
    /// `<struct>`
    Struct(BTreeMap<String, Value>),
}

impl Value {
    /// Returns `true` for [`Value::Nil`].
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Boolean payload.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Integer payload.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric payload, widening integers.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "platform integers are identifiers and counters well inside f64 range"
    )]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(value) => Some(*value),
            Self::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// String payload, also for `dateTime.iso8601` values.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) | Self::DateTime(value) => Some(value),
            _ => None,
        }
    }

    /// Array elements.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Struct members.
    #[must_use]
    pub const fn as_struct(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Struct(members) => Some(members),
            _ => None,
        }
    }

    /// Struct member lookup; `None` for non-structs.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_struct().and_then(|members| members.get(key))
    }

    /// Converts into JSON. Binary payloads become standard base64 strings.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::Nil => Json::Null,
            Self::Bool(value) => Json::Bool(*value),
            Self::Int(value) => Json::from(*value),
            Self::Double(value) => {
                serde_json::Number::from_f64(*value).map_or(Json::Null, Json::Number)
            }
            Self::String(value) | Self::DateTime(value) => Json::String(value.clone()),
            Self::Base64(bytes) => Json::String(STANDARD.encode(bytes)),
            Self::Array(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Struct(members) => Json::Object(
                members
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    /// Converts from JSON. Integers that fit `i64` stay integers.
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Self::Nil,
            Json::Bool(value) => Self::Bool(*value),
            Json::Number(number) => number
                .as_i64()
                .map(Self::Int)
                .or_else(|| number.as_f64().map(Self::Double))
                .unwrap_or(Self::Nil),
            Json::String(value) => Self::String(value.clone()),
            Json::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            Json::Object(members) => Self::Struct(
                members
                    .iter()
                    .map(|(key, value)| (key.clone(), Self::from_json(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Base64(value)
    }
}

impl From<Vec<Self>> for Value {
    fn from(value: Vec<Self>) -> Self {
        Self::Array(value)
    }
}

impl From<BTreeMap<String, Self>> for Value {
    fn from(value: BTreeMap<String, Self>) -> Self {
        Self::Struct(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn json_conversion_preserves_structure() {
        let json = json!({"id": 7, "ratio": 0.5, "tags": ["a", null], "on": true});
        let value = Value::from_json(&json);

        assert_eq!(value.get("id").and_then(Value::as_i64), Some(7));
        assert_eq!(value.get("ratio").and_then(Value::as_f64), Some(0.5));
        assert_eq!(value.get("on").and_then(Value::as_bool), Some(true));
        let tags = value.get("tags").and_then(Value::as_array).expect("tags");
        assert!(tags[1].is_nil());
        assert_eq!(value.to_json(), json);
    }

    #[rstest]
    fn binary_payloads_render_as_base64() {
        assert_eq!(Value::Base64(b"key".to_vec()).to_json(), json!("a2V5"));
    }

    #[rstest]
    #[case(Value::from(None::<i64>), Value::Nil)]
    #[case(Value::from(Some("x")), Value::String("x".into()))]
    #[case(Value::from(3_u32), Value::Int(3))]
    fn conversions(#[case] actual: Value, #[case] expected: Value) {
        assert_eq!(actual, expected);
    }
}

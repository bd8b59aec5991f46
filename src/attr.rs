//! Attribute values, line fields, and the map types shared by spans and
//! backends.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

/// Span attribute data: the newest write for each key wins.
pub type AttrMap = HashMap<String, AttrValue>;

/// The multi-valued search index: every appended value for a key is kept,
/// in order.
pub type IndexMap = HashMap<String, Vec<String>>;

/// Field storage for one log line; stays on the stack if there are few
/// enough fields.
pub(crate) type FieldSet = SmallVec<[Field; 3]>;

/// A value attached to a span attribute or a log line field.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum AttrValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttrValue::String(v) => v.fmt(f),
            AttrValue::I64(v) => v.fmt(f),
            AttrValue::U64(v) => v.fmt(f),
            AttrValue::F64(v) => v.fmt(f),
            AttrValue::Bool(v) => v.fmt(f),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::I64(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::I64(value.into())
    }
}

impl From<u64> for AttrValue {
    fn from(value: u64) -> Self {
        AttrValue::U64(value)
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::U64(value.into())
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::F64(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

/// One key/value pair on a log line or in a seed's prefill.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Field {
    key: String,
    value: AttrValue,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Field {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &AttrValue {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(AttrValue::from("x"), AttrValue::String("x".to_owned()));
        assert_eq!(AttrValue::from(3_i32), AttrValue::I64(3));
        assert_eq!(AttrValue::from(3_u32), AttrValue::U64(3));
        assert_eq!(AttrValue::from(true), AttrValue::Bool(true));
    }

    #[test]
    fn display() {
        assert_eq!(AttrValue::from("hi").to_string(), "hi");
        assert_eq!(AttrValue::from(-4_i64).to_string(), "-4");
        assert_eq!(AttrValue::from(false).to_string(), "false");
    }

    #[test]
    fn field_accessors() {
        let field = Field::new("status", 200_u32);
        assert_eq!(field.key(), "status");
        assert_eq!(*field.value(), AttrValue::U64(200));
    }
}

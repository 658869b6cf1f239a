//! The tree value data model.
//!
//! [`TreeValue`] is the shared substrate for both patterns and observed
//! snapshots: a tagged union of scalars, lists and string-keyed maps. Values
//! are immutable once constructed; the matcher never mutates either operand.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::error::ParseError;

/// A scalar numeric value.
///
/// Numbers compare numerically regardless of their textual representation,
/// so a pattern `replicas: 4` matches an observed `replicas: 4.0`.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    /// Signed integer
    Int(i64),
    /// Floating point
    Float(f64),
}

impl Number {
    /// The value as a float, used for cross-representation comparison.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

/// A parsed document: the recursive data structure shared by patterns and
/// observed snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeValue {
    /// Explicit null
    Null,
    /// Boolean scalar
    Bool(bool),
    /// Numeric scalar
    Number(Number),
    /// String scalar
    String(String),
    /// Ordered sequence of values
    List(Vec<TreeValue>),
    /// Mapping with unique string keys
    Map(BTreeMap<String, TreeValue>),
}

/// Parse a YAML (or JSON) document into a [`TreeValue`].
///
/// This is the single parsing entry point: malformed input is fatal and
/// reported immediately, no other component interprets raw bytes.
pub fn from_yaml_slice(bytes: &[u8]) -> Result<TreeValue, ParseError> {
    let value: serde_yaml::Value = serde_yaml::from_slice(bytes)?;
    TreeValue::try_from(value)
}

/// Parse a YAML (or JSON) string into a [`TreeValue`].
pub fn from_yaml_str(input: &str) -> Result<TreeValue, ParseError> {
    let value: serde_yaml::Value = serde_yaml::from_str(input)?;
    TreeValue::try_from(value)
}

/// Render a scalar mapping key to its string form.
fn scalar_key(key: &serde_yaml::Value) -> Result<String, ParseError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => {
            Err(ParseError::NonScalarKey)
        }
        serde_yaml::Value::Tagged(tagged) => scalar_key(&tagged.value),
    }
}

impl TryFrom<serde_yaml::Value> for TreeValue {
    type Error = ParseError;

    fn try_from(value: serde_yaml::Value) -> Result<Self, ParseError> {
        Ok(match value {
            serde_yaml::Value::Null => Self::Null,
            serde_yaml::Value::Bool(b) => Self::Bool(b),
            serde_yaml::Value::Number(n) => {
                // i64 covers every integer Kubernetes emits; anything wider
                // falls back to float comparison.
                let number = n
                    .as_i64()
                    .map_or_else(|| Number::Float(n.as_f64().unwrap_or(f64::NAN)), Number::Int);
                Self::Number(number)
            }
            serde_yaml::Value::String(s) => Self::String(s),
            serde_yaml::Value::Sequence(seq) => Self::List(
                seq.into_iter()
                    .map(Self::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            serde_yaml::Value::Mapping(mapping) => {
                let mut map = BTreeMap::new();
                for (key, val) in mapping {
                    let key = scalar_key(&key)?;
                    if map.insert(key.clone(), Self::try_from(val)?).is_some() {
                        return Err(ParseError::DuplicateKey(key));
                    }
                }
                Self::Map(map)
            }
            serde_yaml::Value::Tagged(tagged) => Self::try_from(tagged.value)?,
        })
    }
}

impl Serialize for TreeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(Number::Int(i)) => serializer.serialize_i64(*i),
            Self::Number(Number::Float(f)) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => serializer.collect_seq(items),
            Self::Map(map) => serializer.collect_map(map),
        }
    }
}

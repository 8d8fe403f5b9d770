//! Message definitions for the broker
//!
//! A `Message` is an ordered set of named string fields. Field order is the
//! insertion order and is what the codec writes to the wire; the broker
//! never reorders fields.
//!
//! Producers holding loosely-typed data can go through
//! [`Message::from_json`], which is where a payload that is not a mapping
//! gets rejected.

use serde_json::Value;

use crate::utils::error::{EncodingError, PublishError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    fields: Vec<(String, String)>,
}

impl Message {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Builder form of [`Message::insert`].
    pub fn with_field(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Set `key` to `value`. An existing key keeps its position and only
    /// has its value replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a message from a JSON payload.
    ///
    /// The payload must be an object. Strings are taken as-is, numbers and
    /// booleans are stringified; `null`, arrays and nested objects have no
    /// string form and are rejected.
    pub fn from_json(payload: &Value) -> Result<Self, PublishError> {
        let Value::Object(map) = payload else {
            return Err(PublishError::InvalidMessageType {
                found: json_kind(payload),
            });
        };

        map.iter()
            .map(|(key, value)| -> Result<(String, String), PublishError> {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    other => {
                        return Err(EncodingError::UnsupportedValue {
                            field: key.clone(),
                            kind: json_kind(other),
                        }
                        .into());
                    }
                };
                Ok((key.clone(), text))
            })
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Message
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut message = Message::new();
        for (key, value) in iter {
            message.insert(key, value);
        }
        message
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

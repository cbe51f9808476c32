//! Structured response documents and the decoder that produces them.
//!
//! # Design
//! A document is always a JSON object. A missing or blank body decodes to the
//! empty object rather than an absence, so "the server said nothing" and "the
//! server said something unparseable" stay distinguishable.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DecodeError;

/// A JSON object returned by the remote API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Document {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err(DecodeError::NotAnObject("null")),
            Value::Bool(_) => Err(DecodeError::NotAnObject("a boolean")),
            Value::Number(_) => Err(DecodeError::NotAnObject("a number")),
            Value::String(_) => Err(DecodeError::NotAnObject("a string")),
            Value::Array(_) => Err(DecodeError::NotAnObject("an array")),
        }
    }
}

/// Decode a response body.
///
/// A zero content length or a blank body yields an empty document.
pub fn decode(body: &str, content_length: Option<u64>) -> Result<Document, DecodeError> {
    if content_length == Some(0) || body.trim().is_empty() {
        return Ok(Document::new());
    }
    let value: Value = serde_json::from_str(body)?;
    Document::try_from(value)
}

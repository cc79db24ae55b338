// ABOUTME: Value model for template variables
// ABOUTME: Defines the renderable value kinds and their textual forms

use std::sync::Arc;

/// A value bound to a template variable.
///
/// Sequences are held behind an `Arc` so binding one is O(1) and the caller
/// can keep sharing the underlying storage across renders.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f32),
    Text(String),
    TextSeq(Arc<Vec<String>>),
}

impl Value {
    /// Human-readable name of the value kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "string",
            Value::TextSeq(_) => "string sequence",
        }
    }

    /// Render the value to its canonical text form.
    ///
    /// Returns `None` for sequences: they have no direct text form and may
    /// only be iterated by a `{% for %}` loop.
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::TextSeq(_) => None,
        }
    }

    /// Build a sequence value from anything yielding strings
    pub fn seq<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::TextSeq(Arc::new(items.into_iter().map(Into::into).collect()))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::TextSeq(Arc::new(v))
    }
}

impl From<Arc<Vec<String>>> for Value {
    fn from(v: Arc<Vec<String>>) -> Self {
        Value::TextSeq(v)
    }
}

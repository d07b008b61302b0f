use std::fmt;

use crate::particles::LabelValue;

/// A single cell of a STAR table
#[derive(Debug, Clone, PartialEq)]
pub enum StarValue {
    /// Integer column value
    Int(i64),
    /// Floating-point column value, written with six decimals
    Float(f64),
    /// Text column value
    Text(String),
    /// No value for this row
    Missing,
}

impl StarValue {
    /// Parse a token read from a STAR file, preferring integers, then floats
    pub fn parse(token: &str) -> Self {
        if token == "None" {
            return Self::Missing;
        }
        if let Ok(i) = token.parse::<i64>() {
            return Self::Int(i);
        }
        if let Ok(f) = token.parse::<f64>() {
            return Self::Float(f);
        }
        Self::Text(token.to_string())
    }

    /// Numeric view of the value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view of the value
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Text view of the value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value can be written so that it reads back unchanged
    ///
    /// Text holding a double quote has no STAR representation.
    pub fn is_representable(&self) -> bool {
        !matches!(self, Self::Text(s) if s.contains('"'))
    }
}

/// Text that would read back as something else unless quoted
fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.contains(char::is_whitespace)
        || s.starts_with(['_', '#'])
        || s.starts_with("data_")
        || s == "loop_"
        || !matches!(StarValue::parse(s), StarValue::Text(_))
}

impl fmt::Display for StarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{:.6}", v),
            Self::Text(s) if needs_quotes(s) => write!(f, "\"{}\"", s),
            Self::Text(s) => f.write_str(s),
            Self::Missing => f.write_str("None"),
        }
    }
}

impl From<i64> for StarValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for StarValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u64> for StarValue {
    fn from(v: u64) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for StarValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for StarValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for StarValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<&LabelValue> for StarValue {
    fn from(v: &LabelValue) -> Self {
        match v {
            LabelValue::Int(i) => Self::Int(*i),
            LabelValue::Float(f) => Self::Float(*f),
            LabelValue::Text(s) => Self::Text(s.clone()),
        }
    }
}

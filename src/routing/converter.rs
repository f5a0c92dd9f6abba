//! Typed path-parameter converters.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Closed set of placeholder converters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Converter {
    #[default]
    Str,
    Int,
    Float,
}

/// A path component that the bound converter refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert {input:?} with {converter:?} converter")]
pub struct ConversionError {
    pub converter: Converter,
    pub input: String,
}

impl Converter {
    /// Resolve a converter tag; unknown tags fall back to `Str`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "int" => Converter::Int,
            "float" => Converter::Float,
            _ => Converter::Str,
        }
    }

    /// Convert one path component.
    pub fn parse(&self, input: &str) -> Result<ParamValue, ConversionError> {
        let fail = || ConversionError {
            converter: *self,
            input: input.to_string(),
        };
        match self {
            Converter::Str => Ok(ParamValue::Str(input.to_string())),
            Converter::Int => input.parse().map(ParamValue::Int).map_err(|_| fail()),
            Converter::Float => input.parse().map(ParamValue::Float).map_err(|_| fail()),
        }
    }
}

/// A converted path parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => write!(f, "{}", s),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{}", x),
        }
    }
}

/// Parameters extracted by a route match, in segment order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathParams {
    values: Vec<(String, ParamValue)>,
}

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: &str, value: ParamValue) {
        self.values.push((name.to_string(), value));
    }

    /// Get a parameter by name. A repeated name resolves to its last occurrence.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.iter().rfind(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParamValue::as_int)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::as_float)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, ParamValue)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (&'a str, ParamValue)>>(iter: I) -> Self {
        let mut params = PathParams::new();
        for (name, value) in iter {
            params.push(name, value);
        }
        params
    }
}

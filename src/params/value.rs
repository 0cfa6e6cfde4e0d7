//! Typed parameter values.
//!
//! A [`Parameter`] fixes its [`ValueType`] when it is declared. Setting a value
//! from text coerces to that type; text that does not parse leaves the
//! parameter untouched instead of failing, so a single malformed field never
//! spoils the rest of a request.

use std::fmt;

use super::options::OptionSet;

// =============================================================================
// Kinds and Types
// =============================================================================

/// Visibility class of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Exchanged with the client on the wire
    Wire,
    /// Computed by the server, never accepted from or sent to the client
    Internal,
    /// Filled in by the server for the client's use
    Client,
    /// Name not in the schema, preserved as received
    Unknown,
}

/// Declared value type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Str,
    Int,
    Float,
    Options,
}

// =============================================================================
// ParamValue
// =============================================================================

/// A parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Options(OptionSet),
}

impl ParamValue {
    /// The type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            ParamValue::Str(_) => ValueType::Str,
            ParamValue::Int(_) => ValueType::Int,
            ParamValue::Float(_) => ValueType::Float,
            ParamValue::Options(_) => ValueType::Options,
        }
    }

    /// Coerce `text` to a value of type `ty`.
    ///
    /// Returns `None` if the text does not parse. Surrounding whitespace is
    /// ignored for numeric types.
    pub fn parse(ty: ValueType, text: &str) -> Option<Self> {
        match ty {
            ValueType::Str => Some(ParamValue::Str(text.to_string())),
            ValueType::Int => text.trim().parse().ok().map(ParamValue::Int),
            ValueType::Float => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(ParamValue::Float),
            ValueType::Options => Some(ParamValue::Options(OptionSet::parse(text))),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Options(o) => write!(f, "{}", o),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        ParamValue::Int(i64::from(i))
    }
}

impl From<u32> for ParamValue {
    fn from(i: u32) -> Self {
        ParamValue::Int(i64::from(i))
    }
}

impl From<usize> for ParamValue {
    fn from(i: usize) -> Self {
        ParamValue::Int(i as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<OptionSet> for ParamValue {
    fn from(o: OptionSet) -> Self {
        ParamValue::Options(o)
    }
}

// =============================================================================
// Parameter
// =============================================================================

/// A named, typed request parameter with a default and an optional value.
///
/// Reads fall back to the default; [`has_value`](Self::has_value) only
/// reports whether a value was explicitly set.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    kind: ParamKind,
    value_type: ValueType,
    default: Option<ParamValue>,
    value: Option<ParamValue>,
}

impl Parameter {
    /// Declare a parameter with a default value. The default fixes the type.
    pub fn with_default(name: impl Into<String>, kind: ParamKind, default: ParamValue) -> Self {
        Self {
            name: name.into(),
            kind,
            value_type: default.value_type(),
            default: Some(default),
            value: None,
        }
    }

    /// Declare a parameter without a default.
    pub fn declare(name: impl Into<String>, kind: ParamKind, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            kind,
            value_type,
            default: None,
            value: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Whether a value has been explicitly set.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// The set value, or the default if none was set.
    pub fn value(&self) -> Option<&ParamValue> {
        self.value.as_ref().or(self.default.as_ref())
    }

    pub fn default_value(&self) -> Option<&ParamValue> {
        self.default.as_ref()
    }

    /// Set from text, coercing to the declared type.
    ///
    /// Returns `false` and keeps the previous value if `text` does not parse.
    pub fn set_from_str(&mut self, text: &str) -> bool {
        match ParamValue::parse(self.value_type, text) {
            Some(value) => {
                self.value = Some(value);
                true
            }
            None => false,
        }
    }

    /// Set a typed value. Returns `false` if the type does not match.
    pub fn set(&mut self, value: ParamValue) -> bool {
        // ints widen into float parameters
        let value = match (self.value_type, value) {
            (ValueType::Float, ParamValue::Int(i)) => ParamValue::Float(i as f64),
            (_, value) => value,
        };
        if value.value_type() != self.value_type {
            return false;
        }
        self.value = Some(value);
        true
    }

    /// Drop the set value, reverting to the default.
    pub fn clear(&mut self) {
        self.value = None;
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.value()? {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value()? {
            ParamValue::Int(i) => Some(*i),
            ParamValue::Float(f) => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.value()? {
            ParamValue::Float(f) => Some(*f),
            ParamValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_options(&self) -> Option<&OptionSet> {
        match self.value()? {
            ParamValue::Options(o) => Some(o),
            _ => None,
        }
    }

    /// Mutable access to the option set, promoting the default to a set value.
    pub(crate) fn options_mut(&mut self) -> Option<&mut OptionSet> {
        if self.value_type != ValueType::Options {
            return None;
        }
        if self.value.is_none() {
            let initial = match &self.default {
                Some(ParamValue::Options(o)) => o.clone(),
                _ => OptionSet::new(),
            };
            self.value = Some(ParamValue::Options(initial));
        }
        match self.value.as_mut() {
            Some(ParamValue::Options(o)) => Some(o),
            _ => None,
        }
    }

    /// The effective value as wire text, empty if there is none.
    pub fn to_wire_string(&self) -> String {
        self.value().map(ToString::to_string).unwrap_or_default()
    }
}

//! Validator chain support
//!
//! A validator is a stateless check over an already-coerced [`Value`]: it
//! either passes silently or fails with a human-readable message. Fields run
//! their validators in declared order and stop at the first failure.
//!
//! Custom rules plug in through the same [`Validator`] trait, or through
//! [`FnValidator`] for one-off closures:
//!
//! ```
//! use protoform::validators::{FnValidator, Validator};
//! use protoform::Value;
//!
//! let even = FnValidator::new(|value| match value.as_i64() {
//!     Some(n) if n % 2 == 0 => Ok(()),
//!     _ => Err("Must be an even integer".to_string()),
//! });
//!
//! assert!(even.validate(&Value::Int(4)).is_ok());
//! assert!(even.validate(&Value::Int(5)).is_err());
//! ```

use crate::formats;
use crate::types::Value;
use once_cell::sync::OnceCell;
use regex::Regex;

// ============================================================================
// Validator Trait
// ============================================================================

/// Check contract applied to an already-coerced value
///
/// Implementations hold only construction parameters; they must not carry
/// per-validation state, since the same validator instance is shared across
/// every clone of its field prototype.
pub trait Validator: Send + Sync {
    /// Validate the value, failing with a human-readable message
    fn validate(&self, value: &Value) -> Result<(), String>;
}

// ============================================================================
// Required
// ============================================================================

/// Fails on null values
///
/// Pair this with a non-nullable field to surface missing keys: the field
/// pipeline passes null through coercion untouched so this check can report
/// it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Required;

impl Validator for Required {
    fn validate(&self, value: &Value) -> Result<(), String> {
        if value.is_null() {
            Err("The value is required".to_string())
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Length
// ============================================================================

/// Inclusive length bounds over strings (in characters) and lists
#[derive(Debug, Clone, Copy)]
pub struct Length {
    min: Option<usize>,
    max: Option<usize>,
}

impl Length {
    /// Require at least `min` items or characters
    pub fn min(min: usize) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Require at most `max` items or characters
    pub fn max(max: usize) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    /// Require a length between `min` and `max`, inclusive
    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    fn length_of(value: &Value) -> Result<usize, String> {
        match value {
            Value::String(s) => Ok(s.chars().count()),
            Value::List(items) => Ok(items.len()),
            other => Err(format!(
                "Length applies to strings and lists, got {}",
                other.type_name()
            )),
        }
    }
}

impl Validator for Length {
    fn validate(&self, value: &Value) -> Result<(), String> {
        let length = Self::length_of(value)?;

        match (self.min, self.max) {
            (Some(min), Some(max)) if length < min || length > max => Err(format!(
                "Must be between {} and {} in length",
                min, max
            )),
            (Some(min), None) if length < min => {
                Err(format!("Can not be shorter than {}", min))
            }
            (None, Some(max)) if length > max => {
                Err(format!("Can not be longer than {}", max))
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Number Range
// ============================================================================

/// Inclusive numeric bounds over integers and floats
#[derive(Debug, Clone, Copy)]
pub struct NumberRange {
    min: Option<f64>,
    max: Option<f64>,
}

impl NumberRange {
    /// Require a value of at least `min`
    pub fn min(min: impl Into<f64>) -> Self {
        Self {
            min: Some(min.into()),
            max: None,
        }
    }

    /// Require a value of at most `max`
    pub fn max(max: impl Into<f64>) -> Self {
        Self {
            min: None,
            max: Some(max.into()),
        }
    }

    /// Require a value between `min` and `max`, inclusive
    pub fn between(min: impl Into<f64>, max: impl Into<f64>) -> Self {
        Self {
            min: Some(min.into()),
            max: Some(max.into()),
        }
    }
}

impl Validator for NumberRange {
    fn validate(&self, value: &Value) -> Result<(), String> {
        let number = value
            .as_f64()
            .ok_or_else(|| format!("Expected a number, got {}", value.type_name()))?;

        match (self.min, self.max) {
            (Some(min), Some(max)) if number < min || number > max => {
                Err(format!("Must be between {} and {}", min, max))
            }
            (Some(min), None) if number < min => {
                Err(format!("Can not be less than {}", min))
            }
            (None, Some(max)) if number > max => {
                Err(format!("Can not be greater than {}", max))
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Membership
// ============================================================================

fn render_values(values: &[Value]) -> String {
    let rendered: Vec<String> = values
        .iter()
        .map(|v| match v {
            Value::String(s) => format!("\"{}\"", s),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            other => format!("{:?}", other),
        })
        .collect();
    format!("[{}]", rendered.join(", "))
}

/// The value must be one of the allowed values
#[derive(Debug, Clone)]
pub struct AnyOf {
    values: Vec<Value>,
}

impl AnyOf {
    /// Create from the allowed set
    pub fn new<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator for AnyOf {
    fn validate(&self, value: &Value) -> Result<(), String> {
        if self.values.contains(value) {
            Ok(())
        } else {
            Err(format!("Must be one of {}", render_values(&self.values)))
        }
    }
}

/// The value must not be one of the forbidden values
#[derive(Debug, Clone)]
pub struct NoneOf {
    values: Vec<Value>,
}

impl NoneOf {
    /// Create from the forbidden set
    pub fn new<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator for NoneOf {
    fn validate(&self, value: &Value) -> Result<(), String> {
        if self.values.contains(value) {
            Err(format!("Can not be one of {}", render_values(&self.values)))
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Pattern
// ============================================================================

/// The string value must match a regex pattern
///
/// The pattern compiles on first use and the compiled regex is cached for the
/// validator's lifetime. An invalid pattern is reported as a validation
/// failure rather than a panic.
pub struct Pattern {
    pattern: String,
    compiled: OnceCell<Regex>,
}

impl Pattern {
    /// Create from a regex pattern string
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            compiled: OnceCell::new(),
        }
    }
}

impl Validator for Pattern {
    fn validate(&self, value: &Value) -> Result<(), String> {
        let text = value
            .as_str()
            .ok_or_else(|| format!("Expected a string, got {}", value.type_name()))?;

        let regex = self
            .compiled
            .get_or_try_init(|| Regex::new(&self.pattern))
            .map_err(|_| format!("Invalid regex pattern: {}", self.pattern))?;

        if regex.is_match(text) {
            Ok(())
        } else {
            Err(format!("Does not match the pattern: {}", self.pattern))
        }
    }
}

impl std::fmt::Debug for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pattern")
            .field("pattern", &self.pattern)
            .finish()
    }
}

// ============================================================================
// Format
// ============================================================================

/// The string value must match a predefined format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Email address format
    Email,
    /// URL format (http/https)
    Url,
    /// UUID format (v4)
    Uuid,
}

impl Validator for Format {
    fn validate(&self, value: &Value) -> Result<(), String> {
        let text = value
            .as_str()
            .ok_or_else(|| format!("Expected a string, got {}", value.type_name()))?;

        let (ok, name) = match self {
            Self::Email => (formats::is_email(text), "email"),
            Self::Url => (formats::is_url(text), "URL"),
            Self::Uuid => (formats::is_uuid(text), "UUID"),
        };

        if ok {
            Ok(())
        } else {
            Err(format!("Invalid {} format", name))
        }
    }
}

// ============================================================================
// Has Keys
// ============================================================================

/// The object value must contain every listed key
#[derive(Debug, Clone)]
pub struct HasKeys {
    keys: Vec<String>,
}

impl HasKeys {
    /// Create from the required key names
    pub fn new<I, T>(keys: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator for HasKeys {
    fn validate(&self, value: &Value) -> Result<(), String> {
        let pairs = value
            .as_object()
            .ok_or_else(|| format!("Expected an object, got {}", value.type_name()))?;

        for key in &self.keys {
            if !pairs.iter().any(|(k, _)| k == key) {
                return Err(format!("Missing required key: {}", key));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Function Adapter
// ============================================================================

/// Wrap a closure as a validator
pub struct FnValidator<F>
where
    F: Fn(&Value) -> Result<(), String> + Send + Sync,
{
    check: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&Value) -> Result<(), String> + Send + Sync,
{
    /// Create a validator from a check function
    pub fn new(check: F) -> Self {
        Self { check }
    }
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(&Value) -> Result<(), String> + Send + Sync,
{
    fn validate(&self, value: &Value) -> Result<(), String> {
        (self.check)(value)
    }
}

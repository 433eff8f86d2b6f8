//! Field prototypes and the coercion + validation pipeline
//!
//! A [`Field`] is the atomic schema unit: it takes one raw value, coerces it
//! to the target kind, then runs its validator chain in declared order,
//! stopping at the first failure. Field values declared on a schema are
//! prototypes; every validation run works on a fresh clone, so no run state
//! ever leaks between schema instances.
//!
//! The kind-specific half lives behind the [`FieldKind`] trait, which user
//! code can implement to add coercions without touching the engine. A derived
//! kind must invoke its base kind's coercion first and only then apply its
//! own transform:
//!
//! ```
//! use protoform::fields::{Field, FieldKind, StringKind};
//! use protoform::{ErrorNode, Value};
//!
//! struct UppercaseKind {
//!     base: StringKind,
//! }
//!
//! impl FieldKind for UppercaseKind {
//!     fn name(&self) -> &'static str {
//!         "uppercase string"
//!     }
//!
//!     fn coerce(&self, raw: Value, depth: usize) -> Result<Value, ErrorNode> {
//!         // Base coercion first, own transform second.
//!         match self.base.coerce(raw, depth)? {
//!             Value::String(s) => Ok(Value::String(s.to_uppercase())),
//!             other => Ok(other),
//!         }
//!     }
//!
//!     fn clone_kind(&self) -> Box<dyn FieldKind> {
//!         Box::new(UppercaseKind { base: StringKind })
//!     }
//! }
//!
//! let mut field = Field::new(UppercaseKind { base: StringKind });
//! assert!(field.process(Value::from(" veve ")));
//! assert_eq!(field.value(), &Value::from("VEVE"));
//! ```

use crate::errors::ErrorNode;
use crate::schema::{Protocol, Schema, SchemaDescriptor, MAX_NESTING_DEPTH};
use crate::types::Value;
use crate::validators::Validator;
use chrono::NaiveDateTime;
use std::fmt;
use std::sync::Arc;

/// Default datetime format for [`DateTimeKind`]
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// Field Kind Trait - the coercion seam
// ============================================================================

/// Kind-specific coercion from a raw value to the field's target type
///
/// Implementations are immutable descriptors: all state is construction
/// parameters, never per-run data. Composite kinds that delegate to another
/// schema must pass `depth + 1` downward so cyclic declarations hit the
/// nesting guard instead of recursing forever.
pub trait FieldKind: Send + Sync {
    /// Kind name used in diagnostics
    fn name(&self) -> &'static str;

    /// Convert the raw value, or fail with a coercion error
    ///
    /// `depth` is the schema nesting depth of the caller; leaf kinds ignore
    /// it.
    fn coerce(&self, raw: Value, depth: usize) -> Result<Value, ErrorNode>;

    /// Produce an independent copy of this kind descriptor
    fn clone_kind(&self) -> Box<dyn FieldKind>;
}

// ============================================================================
// Field - prototype plus per-run state
// ============================================================================

/// One schema field: coercion kind, validator chain, and null policy
///
/// Built once per schema declaration, cloned per validation run. `Clone`
/// deliberately resets the run state (`value`, `error`), returning a fresh
/// instance of the prototype.
pub struct Field {
    kind: Box<dyn FieldKind>,
    validators: Vec<Arc<dyn Validator>>,
    nullable: bool,
    discard: bool,
    default: Option<Value>,
    value: Value,
    error: Option<ErrorNode>,
    exempt: bool,
}

impl Field {
    /// Create a field over a coercion kind
    pub fn new(kind: impl FieldKind + 'static) -> Self {
        Self {
            kind: Box::new(kind),
            validators: Vec::new(),
            nullable: false,
            discard: false,
            default: None,
            value: Value::Null,
            error: None,
            exempt: false,
        }
    }

    // ------------------------------------------------------------------
    // Convenience constructors, one per built-in kind
    // ------------------------------------------------------------------

    /// Trimmed string field
    pub fn string() -> Self {
        Self::new(StringKind)
    }

    /// Text field: trimmed, CRLF normalized to LF
    pub fn text() -> Self {
        Self::new(TextKind::new())
    }

    /// Integer field
    pub fn integer() -> Self {
        Self::new(IntegerKind)
    }

    /// Float field rounded to two decimal places
    pub fn float() -> Self {
        Self::new(FloatKind::new(2))
    }

    /// Boolean field
    pub fn boolean() -> Self {
        Self::new(BooleanKind)
    }

    /// Datetime field using the default `%Y-%m-%d %H:%M:%S` format
    pub fn datetime() -> Self {
        Self::new(DateTimeKind::new(DEFAULT_DATETIME_FORMAT))
    }

    /// Datetime field with a custom format string
    pub fn datetime_format(format: impl Into<String>) -> Self {
        Self::new(DateTimeKind::new(format))
    }

    /// Homogeneous list field; every element runs through a fresh clone of
    /// the element prototype
    pub fn list(element: Field) -> Self {
        Self::new(ListKind::new(element, false))
    }

    /// List field that drops duplicate converted elements, keeping
    /// first-seen order
    pub fn unique_list(element: Field) -> Self {
        Self::new(ListKind::new(element, true))
    }

    /// Field delegating to a nested schema
    pub fn nested<P: Protocol>() -> Self {
        Self::new(NestedKind::new::<P>())
    }

    /// Field applying a pre-conversion transform before delegating to an
    /// inner field, e.g. parsing an embedded JSON string with [`parse_json`]
    pub fn place<H>(handler: H, inner: Field) -> Self
    where
        H: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self::new(PlaceKind::new(handler, inner))
    }

    // ------------------------------------------------------------------
    // Builder configuration
    // ------------------------------------------------------------------

    /// Append a validator to the chain; chains run in declared order and
    /// stop at the first failure
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Allow an explicit null (or absent key) without failing
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Omit the key from the result when a nullable field is null
    pub fn discard(mut self, discard: bool) -> Self {
        self.discard = discard;
        self
    }

    /// Substitute this value when a non-nullable field receives null; the
    /// default runs through coercion and every validator like ordinary input
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Kind name used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Whether the field accepts null
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether a null value drops the key from the result mapping
    pub fn discards_null(&self) -> bool {
        self.discard
    }

    /// Configured default, if any
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Coerced value of the current run (null before processing)
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consume the field, returning its coerced value
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Error of the current run, if any
    pub fn error(&self) -> Option<&ErrorNode> {
        self.error.as_ref()
    }

    /// Take the error out of the field
    pub fn take_error(&mut self) -> Option<ErrorNode> {
        self.error.take()
    }

    /// Attach an error to the field
    ///
    /// Meant for `post_validate` hooks flagging cross-field violations.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(ErrorNode::leaf(message));
    }

    // ------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------

    /// Apply null policy and coercion to a resolved raw value
    ///
    /// Returns `false` and records the error when coercion fails. An explicit
    /// null on a nullable field short-circuits the whole pipeline: the value
    /// stays null and the validator chain is skipped. A null on a
    /// non-nullable field without a default passes through coercion untouched
    /// so a [`crate::validators::Required`] check can report it.
    pub fn process(&mut self, raw: Value) -> bool {
        self.process_at(raw, 0)
    }

    pub(crate) fn process_at(&mut self, raw: Value, depth: usize) -> bool {
        self.value = Value::Null;
        self.error = None;
        self.exempt = false;

        let raw = if raw.is_null() {
            if self.nullable {
                self.exempt = true;
                return true;
            }
            match &self.default {
                Some(default) => default.clone(),
                None => Value::Null,
            }
        } else {
            raw
        };

        if raw.is_null() {
            // Left for the validator chain to flag.
            return true;
        }

        match self.kind.coerce(raw, depth) {
            Ok(value) => {
                self.value = value;
                true
            }
            Err(node) => {
                self.error = Some(node);
                false
            }
        }
    }

    /// Run the validator chain against the coerced value, fail-fast
    ///
    /// Returns `true` when the field holds no error afterwards. A field
    /// exempted by the nullable-null policy always validates.
    pub fn validate(&mut self) -> bool {
        if self.error.is_some() {
            return false;
        }
        if self.exempt {
            return true;
        }

        for validator in &self.validators {
            if let Err(message) = validator.validate(&self.value) {
                self.error = Some(ErrorNode::Leaf(message));
                return false;
            }
        }
        true
    }

    /// Full pipeline: null policy, coercion, then the validator chain
    pub(crate) fn run_at(&mut self, raw: Value, depth: usize) -> bool {
        self.process_at(raw, depth) && self.validate()
    }
}

impl Clone for Field {
    /// Clone the prototype into a fresh, unbound field instance
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone_kind(),
            validators: self.validators.clone(),
            nullable: self.nullable,
            discard: self.discard,
            default: self.default.clone(),
            value: Value::Null,
            error: None,
            exempt: false,
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("kind", &self.kind.name())
            .field("validators", &self.validators.len())
            .field("nullable", &self.nullable)
            .field("discard", &self.discard)
            .field("value", &self.value)
            .field("error", &self.error)
            .finish()
    }
}

// ============================================================================
// String Kinds
// ============================================================================

/// String coercion: scalars convert, whitespace is trimmed
#[derive(Debug, Clone, Copy, Default)]
pub struct StringKind;

impl FieldKind for StringKind {
    fn name(&self) -> &'static str {
        "string"
    }

    fn coerce(&self, raw: Value, _depth: usize) -> Result<Value, ErrorNode> {
        let text = match raw {
            Value::String(s) => s.trim().to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::DateTime(dt) => dt.to_string(),
            _ => return Err(ErrorNode::leaf("Not a valid string value")),
        };
        Ok(Value::String(text))
    }

    fn clone_kind(&self) -> Box<dyn FieldKind> {
        Box::new(*self)
    }
}

/// Text coercion: string coercion, then `\r\n` replaced with `\n`, then an
/// optional clamp to a maximum character count
#[derive(Debug, Clone, Copy, Default)]
pub struct TextKind {
    limit: Option<usize>,
}

impl TextKind {
    /// Text kind without a length clamp
    pub fn new() -> Self {
        Self { limit: None }
    }

    /// Text kind clamping the result to at most `limit` characters
    pub fn with_limit(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }
}

impl FieldKind for TextKind {
    fn name(&self) -> &'static str {
        "text"
    }

    fn coerce(&self, raw: Value, depth: usize) -> Result<Value, ErrorNode> {
        let coerced = StringKind.coerce(raw, depth)?;
        let Value::String(s) = coerced else {
            return Ok(coerced);
        };

        let mut text = s.replace("\r\n", "\n");
        if let Some(limit) = self.limit {
            if text.chars().count() > limit {
                text = text.chars().take(limit).collect();
            }
        }
        Ok(Value::String(text))
    }

    fn clone_kind(&self) -> Box<dyn FieldKind> {
        Box::new(*self)
    }
}

// ============================================================================
// Numeric Kinds
// ============================================================================

/// Integer coercion: floats truncate, numeric strings parse
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerKind;

impl FieldKind for IntegerKind {
    fn name(&self) -> &'static str {
        "integer"
    }

    fn coerce(&self, raw: Value, _depth: usize) -> Result<Value, ErrorNode> {
        let number = match raw {
            Value::Int(i) => i,
            Value::Float(f) => f.trunc() as i64,
            Value::Bool(b) => i64::from(b),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| ErrorNode::leaf("Not a valid integer value"))?,
            _ => return Err(ErrorNode::leaf("Not a valid integer value")),
        };
        Ok(Value::Int(number))
    }

    fn clone_kind(&self) -> Box<dyn FieldKind> {
        Box::new(*self)
    }
}

/// Float coercion rounding to a configured number of decimal places
#[derive(Debug, Clone, Copy)]
pub struct FloatKind {
    precision: i32,
}

impl FloatKind {
    /// Float kind rounding to `precision` decimal places
    pub fn new(precision: i32) -> Self {
        Self { precision }
    }
}

impl FieldKind for FloatKind {
    fn name(&self) -> &'static str {
        "float"
    }

    fn coerce(&self, raw: Value, _depth: usize) -> Result<Value, ErrorNode> {
        let number = match raw {
            Value::Float(f) => f,
            Value::Int(i) => i as f64,
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ErrorNode::leaf("Not a valid float value"))?,
            _ => return Err(ErrorNode::leaf("Not a valid float value")),
        };

        let factor = 10f64.powi(self.precision);
        Ok(Value::Float((number * factor).round() / factor))
    }

    fn clone_kind(&self) -> Box<dyn FieldKind> {
        Box::new(*self)
    }
}

// ============================================================================
// Boolean Kind
// ============================================================================

/// Boolean coercion: accepts booleans, integers, and the usual string forms
/// (`true`/`false`, `yes`/`no`, `1`/`0`, case-insensitive)
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanKind;

impl FieldKind for BooleanKind {
    fn name(&self) -> &'static str {
        "boolean"
    }

    fn coerce(&self, raw: Value, _depth: usize) -> Result<Value, ErrorNode> {
        let flag = match raw {
            Value::Bool(b) => b,
            Value::Int(i) => i != 0,
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => true,
                "false" | "no" | "0" => false,
                _ => return Err(ErrorNode::leaf("Not a valid boolean value")),
            },
            _ => return Err(ErrorNode::leaf("Not a valid boolean value")),
        };
        Ok(Value::Bool(flag))
    }

    fn clone_kind(&self) -> Box<dyn FieldKind> {
        Box::new(*self)
    }
}

// ============================================================================
// DateTime Kind
// ============================================================================

/// Datetime coercion from a string, using a configurable format
#[derive(Debug, Clone)]
pub struct DateTimeKind {
    format: String,
}

impl DateTimeKind {
    /// Datetime kind parsing with a `chrono` format string
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }
}

impl FieldKind for DateTimeKind {
    fn name(&self) -> &'static str {
        "datetime"
    }

    fn coerce(&self, raw: Value, _depth: usize) -> Result<Value, ErrorNode> {
        match raw {
            Value::DateTime(dt) => Ok(Value::DateTime(dt)),
            Value::String(s) => NaiveDateTime::parse_from_str(s.trim(), &self.format)
                .map(Value::DateTime)
                .map_err(|_| ErrorNode::leaf("Not a valid datetime value")),
            _ => Err(ErrorNode::leaf("Not a valid datetime value")),
        }
    }

    fn clone_kind(&self) -> Box<dyn FieldKind> {
        Box::new(self.clone())
    }
}

// ============================================================================
// List Kind
// ============================================================================

/// Element-wise application of a wrapped field prototype over a sequence
///
/// Each element gets a fresh clone of the element prototype and runs the full
/// pipeline. Element values collect in input order; failing indexes collect
/// into [`ErrorNode::Items`]. The unique variant drops elements whose
/// converted value was already produced, keeping the first occurrence.
#[derive(Debug)]
pub struct ListKind {
    element: Box<Field>,
    unique: bool,
}

impl ListKind {
    /// List kind over an element prototype
    pub fn new(element: Field, unique: bool) -> Self {
        Self {
            element: Box::new(element),
            unique,
        }
    }
}

impl FieldKind for ListKind {
    fn name(&self) -> &'static str {
        if self.unique {
            "unique list"
        } else {
            "list"
        }
    }

    fn coerce(&self, raw: Value, depth: usize) -> Result<Value, ErrorNode> {
        let Value::List(items) = raw else {
            return Err(ErrorNode::leaf("Not a valid list value"));
        };

        let mut values = Vec::with_capacity(items.len());
        let mut failures = Vec::new();

        for (index, item) in items.into_iter().enumerate() {
            let mut element = (*self.element).clone();
            if element.run_at(item, depth) {
                let value = element.into_value();
                // Uniqueness is judged on converted elements, so distinct
                // raws that coerce to the same value count as duplicates.
                if self.unique && values.contains(&value) {
                    continue;
                }
                values.push(value);
            } else {
                let node = element
                    .take_error()
                    .unwrap_or_else(|| ErrorNode::leaf("Invalid value"));
                failures.push((index, node));
            }
        }

        if failures.is_empty() {
            Ok(Value::List(values))
        } else {
            Err(ErrorNode::Items(failures))
        }
    }

    fn clone_kind(&self) -> Box<dyn FieldKind> {
        Box::new(Self {
            element: self.element.clone(),
            unique: self.unique,
        })
    }
}

// ============================================================================
// Nested Schema Kind
// ============================================================================

/// Delegation to a nested schema; the nested error report propagates with
/// its shape intact
pub struct NestedKind {
    descriptor: fn() -> SchemaDescriptor,
}

impl NestedKind {
    /// Nested kind bound to a protocol type
    pub fn new<P: Protocol>() -> Self {
        Self {
            descriptor: P::descriptor,
        }
    }
}

impl FieldKind for NestedKind {
    fn name(&self) -> &'static str {
        "nested schema"
    }

    fn coerce(&self, raw: Value, depth: usize) -> Result<Value, ErrorNode> {
        if depth >= MAX_NESTING_DEPTH {
            return Err(ErrorNode::leaf("Schema nesting exceeds the depth limit"));
        }

        let Value::Object(pairs) = raw else {
            return Err(ErrorNode::leaf("Not a valid object value"));
        };

        let mut schema = Schema::from_parts((self.descriptor)(), pairs);
        if schema.validate_at(depth + 1) {
            Ok(schema.data())
        } else {
            Err(ErrorNode::Nested(schema.take_report()))
        }
    }

    fn clone_kind(&self) -> Box<dyn FieldKind> {
        Box::new(Self {
            descriptor: self.descriptor,
        })
    }
}

impl fmt::Debug for NestedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestedKind").finish()
    }
}

// ============================================================================
// Place Kind - pre-processed delegation
// ============================================================================

/// Pre-conversion transform applied to the raw value before an inner field's
/// pipeline runs; a transform failure reports as this field's coercion error
pub struct PlaceKind {
    handler: Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>,
    inner: Box<Field>,
}

impl PlaceKind {
    /// Place kind over a transform and an inner field prototype
    pub fn new<H>(handler: H, inner: Field) -> Self
    where
        H: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            inner: Box::new(inner),
        }
    }
}

impl FieldKind for PlaceKind {
    fn name(&self) -> &'static str {
        "place"
    }

    fn coerce(&self, raw: Value, depth: usize) -> Result<Value, ErrorNode> {
        let transformed = (self.handler)(raw).map_err(ErrorNode::Leaf)?;

        let mut inner = (*self.inner).clone();
        if inner.run_at(transformed, depth) {
            Ok(inner.into_value())
        } else {
            Err(inner
                .take_error()
                .unwrap_or_else(|| ErrorNode::leaf("Invalid value")))
        }
    }

    fn clone_kind(&self) -> Box<dyn FieldKind> {
        Box::new(Self {
            handler: Arc::clone(&self.handler),
            inner: self.inner.clone(),
        })
    }
}

impl fmt::Debug for PlaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaceKind").field("inner", &self.inner).finish()
    }
}

// ============================================================================
// Pre-processing Handlers
// ============================================================================

/// Parse a string value holding embedded JSON, for use with [`Field::place`]
pub fn parse_json(value: Value) -> Result<Value, String> {
    let Value::String(text) = value else {
        return Err(format!("Expected a JSON string, got {}", value.type_name()));
    };
    serde_json::from_str::<serde_json::Value>(&text)
        .map(Value::from)
        .map_err(|e| format!("Invalid JSON: {}", e))
}

// ============================================================================
// Tests
// ============================================================================

//! Declarative schemas and the two-pass validation engine
//!
//! A schema is an ordered, named collection of field prototypes declared
//! through the [`Protocol`] trait, plus two optional hooks: `post_validate`
//! for cross-field checks and `post_data` for final shape transforms.
//!
//! ```
//! use protoform::validators::{AnyOf, NumberRange, Required};
//! use protoform::{Field, FieldMap, Protocol, Schema, Value};
//!
//! struct SignUp;
//!
//! impl Protocol for SignUp {
//!     fn fields() -> FieldMap {
//!         FieldMap::new()
//!             .field("username", Field::string().validator(Required))
//!             .field(
//!                 "age",
//!                 Field::integer()
//!                     .validator(Required)
//!                     .validator(NumberRange::max(28)),
//!             )
//!             .field("email", Field::string().nullable(true).discard(true))
//!             .field("phone", Field::string().nullable(true))
//!             .field(
//!                 "sex",
//!                 Field::string()
//!                     .default_value("woman")
//!                     .validator(AnyOf::new(["man", "woman"])),
//!             )
//!     }
//! }
//!
//! let raw = Value::Object(vec![
//!     ("username".to_string(), Value::from("VeVe")),
//!     ("age".to_string(), Value::from(28)),
//!     ("email".to_string(), Value::Null),
//!     ("phone".to_string(), Value::Null),
//!     ("sex".to_string(), Value::Null),
//! ]);
//!
//! let mut schema = Schema::new::<SignUp>(raw).unwrap();
//! assert!(schema.validate());
//!
//! let data = schema.data();
//! assert_eq!(data.get("username"), Some(&Value::from("VeVe")));
//! assert_eq!(data.get("email"), None); // nullable + discard
//! assert_eq!(data.get("phone"), Some(&Value::Null)); // nullable, kept
//! assert_eq!(data.get("sex"), Some(&Value::from("woman"))); // default
//! ```

use crate::errors::{ErrorNode, ErrorReport, SchemaError};
use crate::fields::Field;
use crate::types::Value;
use std::fmt;

/// Upper bound on nested schema depth
///
/// Schema declarations are expected to form a tree; the guard turns a cyclic
/// declaration fed with deeply nested data into an ordinary field error
/// instead of unbounded recursion.
pub const MAX_NESTING_DEPTH: usize = 64;

// ============================================================================
// Field Map - insertion-ordered field collection
// ============================================================================

/// Ordered mapping of external key to field
///
/// Used both for declarations (where it is a set of prototypes) and for the
/// live instance mapping handed to `post_validate`. Re-declaring an existing
/// key replaces the field in place, keeping its original position; new keys
/// append. That rule is also how schema inheritance works: a derived protocol
/// starts from its base's map and overrides or extends it.
///
/// Note that cloning a map clones its fields as prototypes: run state does
/// not survive a clone.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    entries: Vec<(String, Field)>,
}

impl FieldMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field, overriding in place when the key already exists
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.insert(name, field);
        self
    }

    /// Insert a field, overriding in place when the key already exists
    pub fn insert(&mut self, name: impl Into<String>, field: Field) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            entry.1 = field;
        } else {
            self.entries.push((name, field));
        }
    }

    /// Get a field by key
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, f)| f)
    }

    /// Get a field by key, mutably
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == name)
            .map(|(_, f)| f)
    }

    /// Whether the key is declared
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.entries.iter().map(|(k, f)| (k, f))
    }

    /// Iterate in declaration order, with mutable fields
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Field)> {
        self.entries.iter_mut().map(|(k, f)| (&*k, f))
    }

    /// Declared keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

// ============================================================================
// Protocol Trait - the declarative contract
// ============================================================================

/// Declarative schema contract
///
/// Implementors declare their field set and may override the two hooks.
/// Everything is an associated function: a protocol type carries no instance
/// state, the runtime state lives in [`Schema`].
///
/// Inheritance composes through [`FieldMap`]: a derived protocol returns
/// `Base::fields()` extended with its own declarations, where re-declared
/// keys override the base field in its original position.
pub trait Protocol: 'static {
    /// The declared field set, in external-key order
    fn fields() -> FieldMap;

    /// Cross-field hook, run only when every field validated cleanly
    ///
    /// Receives the live field instances keyed by external name. Flag
    /// violations by calling [`Field::set_error`] on the offending fields
    /// and return `false`; returning `false` marks the schema invalid even
    /// when no field-level error was recorded.
    fn post_validate(_fields: &mut FieldMap) -> bool {
        true
    }

    /// Result transform hook, run on the assembled data mapping
    ///
    /// Receives the converted object after the discard policy was applied.
    /// Runs only on valid data; it must be pure, since the mapping is
    /// reassembled on every [`Schema::data`] call.
    fn post_data(data: Value) -> Value {
        data
    }

    /// Resolved descriptor: field set plus hook bindings
    fn descriptor() -> SchemaDescriptor
    where
        Self: Sized,
    {
        SchemaDescriptor::new(Self::fields(), Self::post_validate, Self::post_data)
    }
}

// ============================================================================
// Schema Descriptor - resolved declaration
// ============================================================================

/// Resolved schema declaration: field prototypes and hook bindings
///
/// Descriptors are cheap to clone and carry no run state; nested schema
/// fields hold a descriptor factory and instantiate per validation.
#[derive(Clone)]
pub struct SchemaDescriptor {
    fields: FieldMap,
    post_validate: fn(&mut FieldMap) -> bool,
    post_data: fn(Value) -> Value,
}

impl SchemaDescriptor {
    /// Assemble a descriptor from a field set and hooks
    pub fn new(
        fields: FieldMap,
        post_validate: fn(&mut FieldMap) -> bool,
        post_data: fn(Value) -> Value,
    ) -> Self {
        Self {
            fields,
            post_validate,
            post_data,
        }
    }

    /// The declared field prototypes
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }
}

impl fmt::Debug for SchemaDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDescriptor")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// Schema - one validation run over one raw mapping
// ============================================================================

/// A schema bound to one raw input mapping
///
/// Construct with [`Schema::new`] (or [`Schema::from_json`]), then call
/// [`Schema::validate`] and branch on the result: inspect [`Schema::error`]
/// on failure and [`Schema::data`] on success. Reading `data()` without a
/// successful `validate()` yields an empty object and is otherwise
/// unspecified.
#[derive(Debug)]
pub struct Schema {
    descriptor: SchemaDescriptor,
    raw: Vec<(String, Value)>,
    fields: FieldMap,
    errors: ErrorReport,
    validated: bool,
    valid: bool,
}

impl Schema {
    /// Bind a protocol to a raw mapping
    ///
    /// Fails when the input is not an object; that is a caller bug, not a
    /// data error, and so is not recoverable through the error report.
    pub fn new<P: Protocol>(raw: Value) -> Result<Self, SchemaError> {
        match raw {
            Value::Object(pairs) => Ok(Self::from_parts(P::descriptor(), pairs)),
            other => Err(SchemaError::NotAnObject(other.type_name())),
        }
    }

    /// Bind a protocol to a JSON document
    pub fn from_json<P: Protocol>(input: &str) -> Result<Self, SchemaError> {
        let json: serde_json::Value = serde_json::from_str(input)?;
        Self::new::<P>(Value::from(json))
    }

    pub(crate) fn from_parts(descriptor: SchemaDescriptor, raw: Vec<(String, Value)>) -> Self {
        Self {
            descriptor,
            raw,
            fields: FieldMap::new(),
            errors: ErrorReport::new(),
            validated: false,
            valid: false,
        }
    }

    /// Run the full validation pass
    ///
    /// Clones every declared prototype into a fresh instance, resolves each
    /// field's raw sub-value (absent keys resolve to null), runs the per-field
    /// pipeline for all fields (errors aggregate, they never short-circuit
    /// the schema), then runs `post_validate` when every field is clean.
    /// Deterministic and idempotent: repeated calls redo the pass from the
    /// bound raw mapping.
    pub fn validate(&mut self) -> bool {
        self.validate_at(0)
    }

    pub(crate) fn validate_at(&mut self, depth: usize) -> bool {
        let mut fields = self.descriptor.fields.clone();
        let mut errors = ErrorReport::new();

        for (name, field) in fields.iter_mut() {
            let raw = self
                .raw
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Null);

            if !field.run_at(raw, depth) {
                let node = field
                    .error()
                    .cloned()
                    .unwrap_or_else(|| ErrorNode::leaf("Invalid value"));
                tracing::trace!(field = %name, error = %node, "field failed");
                errors.insert(name.clone(), node);
            }
        }

        let mut valid = errors.is_empty();
        if valid && !(self.descriptor.post_validate)(&mut fields) {
            for (name, field) in fields.iter() {
                if let Some(node) = field.error() {
                    errors.insert(name.clone(), node.clone());
                }
            }
            valid = false;
        }

        tracing::debug!(
            fields = fields.len(),
            errors = errors.len(),
            valid,
            "schema validation finished"
        );

        self.fields = fields;
        self.errors = errors;
        self.validated = true;
        self.valid = valid;
        valid
    }

    /// Whether the last `validate()` call succeeded
    pub fn is_valid(&self) -> bool {
        self.validated && self.valid
    }

    /// Aggregated errors of the last run; empty when valid
    pub fn error(&self) -> &ErrorReport {
        &self.errors
    }

    pub(crate) fn take_report(&mut self) -> ErrorReport {
        std::mem::take(&mut self.errors)
    }

    /// Live field instances of the last run
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// The converted data mapping
    ///
    /// For each field the discard rule applies: a nullable field that
    /// resolved to null is omitted when it discards, kept with a null value
    /// otherwise. The assembled object then passes through `post_data`.
    /// Returns an empty object unless the last `validate()` succeeded.
    pub fn data(&self) -> Value {
        if !self.is_valid() {
            return Value::Object(Vec::new());
        }

        let mut pairs = Vec::with_capacity(self.fields.len());
        for (name, field) in self.fields.iter() {
            if field.value().is_null() && field.is_nullable() && field.discards_null() {
                continue;
            }
            pairs.push((name.clone(), field.value().clone()));
        }

        (self.descriptor.post_data)(Value::Object(pairs))
    }
}

// ============================================================================
// Tests
// ============================================================================

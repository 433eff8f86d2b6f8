//! Protoform
//!
//! Declarative validation and conversion for loosely-typed data.
//!
//! Protoform turns external mappings (e.g. parsed JSON) into strongly-typed
//! values. A schema is declared as a set of named fields, each with a
//! coercion kind and a validator chain; validating an input yields either a
//! clean converted mapping or a structured, path-keyed error report.
//!
//! The engine is synchronous and pure: no I/O, no shared state between runs.
//! Field declarations are immutable prototypes; every validation run clones
//! them into fresh instances, so concurrent validations of the same protocol
//! type never share field state.
//!
//! # Example
//!
//! ```rust
//! use protoform::validators::{NumberRange, Required};
//! use protoform::{Field, FieldMap, Protocol, Schema, Value};
//!
//! struct SignUp;
//!
//! impl Protocol for SignUp {
//!     fn fields() -> FieldMap {
//!         FieldMap::new()
//!             .field("username", Field::string().validator(Required))
//!             .field("age", Field::integer().validator(NumberRange::max(28)))
//!             .field("email", Field::string().nullable(true).discard(true))
//!     }
//! }
//!
//! let mut schema = Schema::from_json::<SignUp>(
//!     r#"{"username": "VeVe", "age": 28, "email": null}"#,
//! ).unwrap();
//!
//! assert!(schema.validate());
//! assert_eq!(schema.data().get("username"), Some(&Value::from("VeVe")));
//! assert_eq!(schema.data().get("email"), None);
//! ```
//!
//! # Components
//!
//! - [`Value`]: the runtime value model, convertible from/to `serde_json`
//! - [`Field`] and [`fields::FieldKind`]: coercion plus a fail-fast
//!   validator chain; list, nested-schema, and pre-processed specializations
//! - [`validators::Validator`]: the pluggable check contract with built-ins
//! - [`Protocol`] and [`Schema`]: the declarative contract and the engine
//! - [`ErrorReport`] / [`ErrorNode`]: structured, never-flattened errors

// Public modules
pub mod errors;
pub mod fields;
pub mod formats;
pub mod schema;
pub mod types;
pub mod validators;

// Re-export commonly used types
pub use errors::{ErrorNode, ErrorReport, SchemaError};
pub use fields::{Field, FieldKind};
pub use schema::{FieldMap, Protocol, Schema, SchemaDescriptor, MAX_NESTING_DEPTH};
pub use types::Value;
pub use validators::Validator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

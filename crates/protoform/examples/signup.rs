//! Sign-up Form Example
//!
//! This example demonstrates declaring a protocol, validating raw input
//! against it, and reading the converted data or the error report.
//!
//! Run with:
//! ```bash
//! cargo run -p protoform --example signup
//! ```

use protoform::validators::{AnyOf, Format, NumberRange, Required};
use protoform::{Field, FieldMap, Protocol, Schema};

// ============================================================================
// Protocol Declaration
// ============================================================================

struct SignUp;

impl Protocol for SignUp {
    fn fields() -> FieldMap {
        FieldMap::new()
            .field("username", Field::string().validator(Required))
            .field(
                "age",
                Field::integer()
                    .validator(Required)
                    .validator(NumberRange::max(28)),
            )
            .field(
                "email",
                Field::string()
                    .nullable(true)
                    .discard(true)
                    .validator(Format::Email),
            )
            .field("phone", Field::string().nullable(true))
            .field(
                "sex",
                Field::string()
                    .default_value("woman")
                    .validator(AnyOf::new(["man", "woman"])),
            )
    }
}

// ============================================================================
// Valid Input
// ============================================================================

fn validate_clean_input() {
    println!("1. Valid Input");
    println!("--------------");

    let input = r#"{"username": "VeVe", "age": 28, "email": null, "phone": null, "sex": null}"#;
    println!("  Input:  {}", input);

    let mut schema = Schema::from_json::<SignUp>(input).expect("well-formed JSON");
    if schema.validate() {
        let data: serde_json::Value = schema.data().into();
        println!("  Output: {}", data);
        println!("  (email discarded, phone kept as null, sex defaulted)");
    }
    println!();
}

// ============================================================================
// Invalid Input
// ============================================================================

fn validate_failing_input() {
    println!("2. Invalid Input");
    println!("----------------");

    let input = r#"{"username": null, "age": 30, "email": "not-an-address", "sex": "woman"}"#;
    println!("  Input:  {}", input);

    let mut schema = Schema::from_json::<SignUp>(input).expect("well-formed JSON");
    if !schema.validate() {
        println!("  Errors: {}", schema.error().to_json());
        for (path, message) in schema.error().paths() {
            println!("    {}: {}", path, message);
        }
    }
    println!();
}

fn main() {
    println!("=== Protoform Sign-up Example ===\n");
    validate_clean_input();
    validate_failing_input();
    println!("=== Example Complete ===");
}

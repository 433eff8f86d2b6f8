//! End-to-end protocol validation tests

use protoform::validators::{AnyOf, Length, NumberRange, Required};
use protoform::{
    fields::parse_json, ErrorNode, Field, FieldMap, Protocol, Schema, Value, MAX_NESTING_DEPTH,
};

fn object(pairs: Vec<(&str, Value)>) -> Value {
    Value::Object(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

// ============================================================================
// Reference Protocol
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
            .field("email", Field::string().nullable(true).discard(true))
            .field("phone", Field::string().nullable(true))
            .field(
                "sex",
                Field::string()
                    .default_value("woman")
                    .validator(AnyOf::new(["man", "woman"])),
            )
    }
}

fn signup_input(age: i64) -> Value {
    object(vec![
        ("username", Value::from("VeVe")),
        ("age", Value::from(age)),
        ("email", Value::Null),
        ("phone", Value::Null),
        ("sex", Value::Null),
    ])
}

#[test]
fn test_round_trip() {
    let mut schema = Schema::new::<SignUp>(signup_input(28)).unwrap();
    assert!(schema.validate());
    assert!(schema.error().is_empty());

    // email discarded, phone kept as null, sex defaulted.
    let expected = object(vec![
        ("username", Value::from("VeVe")),
        ("age", Value::from(28)),
        ("phone", Value::Null),
        ("sex", Value::from("woman")),
    ]);
    assert_eq!(schema.data(), expected);
}

#[test]
fn test_boundary_violation() {
    let mut schema = Schema::new::<SignUp>(signup_input(30)).unwrap();
    assert!(!schema.validate());

    assert_eq!(schema.error().len(), 1);
    assert_eq!(
        schema.error().get("age").and_then(ErrorNode::message),
        Some("Can not be greater than 28")
    );
    // Data is unspecified after a failed run; it must at least be empty.
    assert_eq!(schema.data(), Value::Object(Vec::new()));
}

#[test]
fn test_validate_is_idempotent() {
    let mut schema = Schema::new::<SignUp>(signup_input(28)).unwrap();
    assert!(schema.validate());
    let first = schema.data();
    assert!(schema.validate());
    assert_eq!(schema.data(), first);

    let mut failing = Schema::new::<SignUp>(signup_input(30)).unwrap();
    assert!(!failing.validate());
    let report = failing.error().clone();
    assert!(!failing.validate());
    assert_eq!(failing.error(), &report);
}

#[test]
fn test_errors_aggregate_across_fields() {
    let raw = object(vec![
        ("username", Value::Null),
        ("age", Value::from(99)),
        ("sex", Value::from("unknown")),
    ]);
    let mut schema = Schema::new::<SignUp>(raw).unwrap();
    assert!(!schema.validate());

    // No short-circuit across fields: all three failures report.
    assert_eq!(schema.error().len(), 3);
    assert!(schema.error().get("username").is_some());
    assert!(schema.error().get("age").is_some());
    assert!(schema.error().get("sex").is_some());
}

#[test]
fn test_default_must_satisfy_validators() {
    struct BadDefault;

    impl Protocol for BadDefault {
        fn fields() -> FieldMap {
            FieldMap::new().field(
                "sex",
                Field::string()
                    .default_value("robot")
                    .validator(AnyOf::new(["man", "woman"])),
            )
        }
    }

    let mut schema = Schema::new::<BadDefault>(object(vec![("sex", Value::Null)])).unwrap();
    assert!(!schema.validate());
    assert!(schema.error().get("sex").is_some());
}

#[test]
fn test_absent_key_resolves_to_null() {
    // Same as explicit null: nullable fields pass, required ones fail.
    let raw = object(vec![("username", Value::from("VeVe")), ("sex", Value::from("man"))]);
    let mut schema = Schema::new::<SignUp>(raw).unwrap();
    assert!(!schema.validate());
    assert_eq!(
        schema.error().get("age").and_then(ErrorNode::message),
        Some("The value is required")
    );
}

// ============================================================================
// Nested Schemas
// ============================================================================

struct Address;

impl Protocol for Address {
    fn fields() -> FieldMap {
        FieldMap::new()
            .field("city", Field::string().validator(Required))
            .field("zip", Field::string().validator(Length::between(5, 5)))
    }
}

struct Customer;

impl Protocol for Customer {
    fn fields() -> FieldMap {
        FieldMap::new()
            .field("name", Field::string().validator(Required))
            .field(
                "addresses",
                Field::list(Field::nested::<Address>()).validator(Length::min(1)),
            )
    }
}

fn address(city: &str, zip: &str) -> Value {
    object(vec![("city", Value::from(city)), ("zip", Value::from(zip))])
}

#[test]
fn test_nested_list_preserves_order() {
    let raw = object(vec![
        ("name", Value::from("kong")),
        (
            "addresses",
            Value::List(vec![address("Paris", "75001"), address("Lyon", "69001")]),
        ),
    ]);
    let mut schema = Schema::new::<Customer>(raw).unwrap();
    assert!(schema.validate());

    let data = schema.data();
    let Some(Value::List(items)) = data.get("addresses").cloned() else {
        panic!("expected a list of converted addresses");
    };
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].get("city"), Some(&Value::from("Paris")));
    assert_eq!(items[1].get("city"), Some(&Value::from("Lyon")));
}

#[test]
fn test_nested_error_shape_is_preserved() {
    let raw = object(vec![
        ("name", Value::from("kong")),
        (
            "addresses",
            Value::List(vec![address("Paris", "75001"), address("Lyon", "bad")]),
        ),
    ]);
    let mut schema = Schema::new::<Customer>(raw).unwrap();
    assert!(!schema.validate());

    // addresses[1].zip is the exact failing path.
    let paths = schema.error().paths();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].0, "addresses[1].zip");
    assert_eq!(paths[0].1, "Must be between 5 and 5 in length");

    let json = schema.error().to_json();
    assert_eq!(
        json["addresses"]["1"]["zip"],
        serde_json::Value::String("Must be between 5 and 5 in length".to_string())
    );
}

#[test]
fn test_nested_schema_rejects_non_object() {
    let raw = object(vec![
        ("name", Value::from("kong")),
        ("addresses", Value::List(vec![Value::from("not an object")])),
    ]);
    let mut schema = Schema::new::<Customer>(raw).unwrap();
    assert!(!schema.validate());
    assert_eq!(
        schema.error().paths()[0].1,
        "Not a valid object value".to_string()
    );
}

#[test]
fn test_cyclic_nesting_hits_depth_guard() {
    struct Recur;

    impl Protocol for Recur {
        fn fields() -> FieldMap {
            FieldMap::new().field("child", Field::nested::<Recur>().nullable(true))
        }
    }

    // Shallow recursive data is fine.
    let shallow = object(vec![("child", object(vec![("child", Value::Null)]))]);
    let mut schema = Schema::new::<Recur>(shallow).unwrap();
    assert!(schema.validate());

    // Data deeper than the guard fails instead of recursing forever.
    let mut deep = object(vec![]);
    for _ in 0..(MAX_NESTING_DEPTH + 2) {
        deep = object(vec![("child", deep)]);
    }
    let mut schema = Schema::new::<Recur>(deep).unwrap();
    assert!(!schema.validate());
    let paths = schema.error().paths();
    assert_eq!(paths[0].1, "Schema nesting exceeds the depth limit");
}

// ============================================================================
// Unique Lists
// ============================================================================

#[test]
fn test_unique_list_first_seen_order() {
    struct Tags;

    impl Protocol for Tags {
        fn fields() -> FieldMap {
            FieldMap::new().field("tags", Field::unique_list(Field::string()))
        }
    }

    let raw = object(vec![("tags", Value::from(vec!["A", "B", "B", "C"]))]);
    let mut schema = Schema::new::<Tags>(raw).unwrap();
    assert!(schema.validate());
    assert_eq!(
        schema.data().get("tags"),
        Some(&Value::List(vec![
            Value::from("A"),
            Value::from("B"),
            Value::from("C")
        ]))
    );
}

#[test]
fn test_unique_list_dedups_after_coercion() {
    struct Codes;

    impl Protocol for Codes {
        fn fields() -> FieldMap {
            FieldMap::new().field("codes", Field::unique_list(Field::integer()))
        }
    }

    // "1" and 1 coerce to the same integer and must collapse to one entry.
    let raw = object(vec![(
        "codes",
        Value::List(vec![Value::from("1"), Value::Int(1), Value::Int(2)]),
    )]);
    let mut schema = Schema::new::<Codes>(raw).unwrap();
    assert!(schema.validate());
    assert_eq!(
        schema.data().get("codes"),
        Some(&Value::List(vec![Value::Int(1), Value::Int(2)]))
    );
}

// ============================================================================
// Hooks
// ============================================================================

struct ChangePassword;

impl Protocol for ChangePassword {
    fn fields() -> FieldMap {
        FieldMap::new()
            .field(
                "password",
                Field::string().validator(Required).validator(Length::min(8)),
            )
            .field("confirm", Field::string().validator(Required))
    }

    fn post_validate(fields: &mut FieldMap) -> bool {
        let matches =
            fields.get("password").map(Field::value) == fields.get("confirm").map(Field::value);
        if !matches {
            if let Some(confirm) = fields.get_mut("confirm") {
                confirm.set_error("Passwords do not match");
            }
        }
        matches
    }
}

#[test]
fn test_post_validate_cross_field_check() {
    let raw = object(vec![
        ("password", Value::from("hunter2hunter2")),
        ("confirm", Value::from("hunter2hunter2")),
    ]);
    let mut schema = Schema::new::<ChangePassword>(raw).unwrap();
    assert!(schema.validate());

    let raw = object(vec![
        ("password", Value::from("hunter2hunter2")),
        ("confirm", Value::from("different")),
    ]);
    let mut schema = Schema::new::<ChangePassword>(raw).unwrap();
    assert!(!schema.validate());
    assert_eq!(
        schema.error().get("confirm").and_then(ErrorNode::message),
        Some("Passwords do not match")
    );
}

#[test]
fn test_post_validate_runs_only_when_fields_are_clean() {
    // The hook would flag the mismatch, but the field error wins first.
    let raw = object(vec![
        ("password", Value::from("short")),
        ("confirm", Value::from("different")),
    ]);
    let mut schema = Schema::new::<ChangePassword>(raw).unwrap();
    assert!(!schema.validate());
    assert_eq!(
        schema.error().get("password").and_then(ErrorNode::message),
        Some("Can not be shorter than 8")
    );
    assert!(schema.error().get("confirm").is_none());
}

#[test]
fn test_post_data_transform() {
    struct Parcel;

    impl Protocol for Parcel {
        fn fields() -> FieldMap {
            FieldMap::new().field("weight", Field::integer().validator(Required))
        }

        fn post_data(data: Value) -> Value {
            // Annotate the unit on the way out.
            match data {
                Value::Object(mut pairs) => {
                    for (key, value) in pairs.iter_mut() {
                        if key == "weight" {
                            if let Value::Int(grams) = value {
                                *value = Value::String(format!("{}g", grams));
                            }
                        }
                    }
                    Value::Object(pairs)
                }
                other => other,
            }
        }
    }

    let mut schema = Schema::new::<Parcel>(object(vec![("weight", Value::from(1200))])).unwrap();
    assert!(schema.validate());
    assert_eq!(schema.data().get("weight"), Some(&Value::from("1200g")));
}

// ============================================================================
// Pre-processed Fields
// ============================================================================

#[test]
fn test_place_field_with_embedded_json_object() {
    struct Envelope;

    impl Protocol for Envelope {
        fn fields() -> FieldMap {
            FieldMap::new().field(
                "payload",
                Field::place(parse_json, Field::nested::<Address>()),
            )
        }
    }

    let raw = object(vec![(
        "payload",
        Value::from(r#"{"city": "Paris", "zip": "75001"}"#),
    )]);
    let mut schema = Schema::new::<Envelope>(raw).unwrap();
    assert!(schema.validate());
    assert_eq!(
        schema.data().get("payload").and_then(|v| v.get("city")),
        Some(&Value::from("Paris"))
    );

    let raw = object(vec![("payload", Value::from("{broken"))]);
    let mut schema = Schema::new::<Envelope>(raw).unwrap();
    assert!(!schema.validate());
}

// ============================================================================
// JSON Entry Point
// ============================================================================

#[test]
fn test_from_json_round_trip() {
    let mut schema = Schema::from_json::<SignUp>(
        r#"{"username": "VeVe", "age": 28, "email": null, "phone": null, "sex": null}"#,
    )
    .unwrap();
    assert!(schema.validate());

    let json: serde_json::Value = schema.data().into();
    assert_eq!(json["username"], "VeVe");
    assert_eq!(json["age"], 28);
    assert_eq!(json["phone"], serde_json::Value::Null);
    assert_eq!(json["sex"], "woman");
    assert!(json.get("email").is_none());
}

//! Validation error structures
//!
//! Invalid input is never a panic or an early return for the engine: every
//! failure is recovered locally into an error structure keyed by the path of
//! the failing field. Only programmer errors (non-object input at a schema
//! root, malformed JSON handed to [`crate::Schema::from_json`]) surface as
//! [`SchemaError`].

use std::fmt;
use thiserror::Error;

// ============================================================================
// Error Node - one field's failure, possibly nested
// ============================================================================

/// Error attached to a single field
///
/// Composite fields keep their inner shape: a nested schema reports a whole
/// [`ErrorReport`], a list reports per-index failures. Errors are never
/// flattened to a single string, so callers can locate the exact failing path.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorNode {
    /// A plain message (coercion or validator failure)
    Leaf(String),
    /// A nested schema's aggregated errors
    Nested(ErrorReport),
    /// Per-index failures of a list field, in input order
    Items(Vec<(usize, ErrorNode)>),
}

impl ErrorNode {
    /// Create a leaf error from a message
    pub fn leaf(message: impl Into<String>) -> Self {
        Self::Leaf(message.into())
    }

    /// Get the message if this is a leaf error
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Leaf(msg) => Some(msg),
            _ => None,
        }
    }

    /// Convert to a JSON value mirroring the error shape
    ///
    /// Leaves become strings, nested reports become objects, and indexed
    /// failures become objects keyed by the element index.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Leaf(msg) => serde_json::Value::String(msg.clone()),
            Self::Nested(report) => report.to_json(),
            Self::Items(items) => serde_json::Value::Object(
                items
                    .iter()
                    .map(|(index, node)| (index.to_string(), node.to_json()))
                    .collect(),
            ),
        }
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<(String, String)>) {
        match self {
            Self::Leaf(msg) => out.push((prefix.to_string(), msg.clone())),
            Self::Nested(report) => {
                for (key, node) in report.iter() {
                    node.flatten_into(&format!("{}.{}", prefix, key), out);
                }
            }
            Self::Items(items) => {
                for (index, node) in items {
                    node.flatten_into(&format!("{}[{}]", prefix, index), out);
                }
            }
        }
    }
}

impl fmt::Display for ErrorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(msg) => write!(f, "{}", msg),
            Self::Nested(report) => write!(f, "{}", report),
            Self::Items(items) => {
                let rendered: Vec<String> = items
                    .iter()
                    .map(|(index, node)| format!("[{}]: {}", index, node))
                    .collect();
                write!(f, "{}", rendered.join("; "))
            }
        }
    }
}

// ============================================================================
// Error Report - aggregated schema errors
// ============================================================================

/// Ordered mapping of external key to the field's error
///
/// Keys appear in declaration order. Empty when validation succeeded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorReport {
    entries: Vec<(String, ErrorNode)>,
}

impl ErrorReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if there are any errors
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the number of failing fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Record an error for a field, replacing any previous entry for the key
    pub fn insert(&mut self, key: impl Into<String>, node: ErrorNode) {
        let key = key.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = node;
        } else {
            self.entries.push((key, node));
        }
    }

    /// Get the error for a field, if any
    pub fn get(&self, key: &str) -> Option<&ErrorNode> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, node)| node)
    }

    /// Iterate over (key, error) entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ErrorNode)> {
        self.entries.iter().map(|(k, node)| (k, node))
    }

    /// Flatten the report into (dotted path, message) pairs
    ///
    /// Nested keys join with `.`, list indexes render as `[i]`, e.g.
    /// `profile.tags[2]`.
    pub fn paths(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (key, node) in &self.entries {
            node.flatten_into(key, &mut out);
        }
        out
    }

    /// Convert to a JSON object mirroring the error shape
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(key, node)| (key.clone(), node.to_json()))
                .collect(),
        )
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .paths()
            .into_iter()
            .map(|(path, msg)| format!("{}: {}", path, msg))
            .collect();
        write!(f, "{}", rendered.join("; "))
    }
}

impl std::error::Error for ErrorReport {}

// ============================================================================
// Schema Error - programmer errors, not data errors
// ============================================================================

/// Fatal errors raised while binding a schema, as opposed to data errors
/// which are always collected into an [`ErrorReport`]
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The root input handed to a schema was not an object
    #[error("schema input must be an object, got {0}")]
    NotAnObject(&'static str),

    /// The JSON input could not be parsed at all
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_empty() {
        let report = ErrorReport::new();
        assert!(report.is_empty());
        assert_eq!(report.len(), 0);
        assert_eq!(report.paths(), Vec::<(String, String)>::new());
    }

    #[test]
    fn test_report_insert_and_get() {
        let mut report = ErrorReport::new();
        report.insert("age", ErrorNode::leaf("Can not be greater than 28"));
        assert_eq!(report.len(), 1);
        assert_eq!(
            report.get("age").and_then(ErrorNode::message),
            Some("Can not be greater than 28")
        );
        assert_eq!(report.get("missing"), None);

        // Same key replaces in place
        report.insert("age", ErrorNode::leaf("other"));
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_nested_paths() {
        let mut inner = ErrorReport::new();
        inner.insert("name", ErrorNode::leaf("The value is required"));

        let mut report = ErrorReport::new();
        report.insert("profile", ErrorNode::Nested(inner));
        report.insert(
            "tags",
            ErrorNode::Items(vec![(1, ErrorNode::leaf("Not a valid integer value"))]),
        );

        assert_eq!(
            report.paths(),
            vec![
                ("profile.name".to_string(), "The value is required".to_string()),
                ("tags[1]".to_string(), "Not a valid integer value".to_string()),
            ]
        );
    }

    #[test]
    fn test_to_json_keeps_declaration_order() {
        let mut report = ErrorReport::new();
        report.insert("username", ErrorNode::leaf("The value is required"));
        report.insert("age", ErrorNode::leaf("Can not be greater than 28"));
        report.insert(
            "tags",
            ErrorNode::Items(vec![
                (2, ErrorNode::leaf("Not a valid integer value")),
                (10, ErrorNode::leaf("Not a valid integer value")),
            ]),
        );

        // Relies on serde_json's preserve_order feature: keys stay in
        // insertion order, indexes stay numeric, not lexicographic.
        let rendered = report.to_json().to_string();
        let username = rendered.find("username").unwrap();
        let age = rendered.find("age").unwrap();
        let tags = rendered.find("tags").unwrap();
        assert!(username < age && age < tags);
        assert!(rendered.find("\"2\"").unwrap() < rendered.find("\"10\"").unwrap());
    }

    #[test]
    fn test_to_json_shape() {
        let mut inner = ErrorReport::new();
        inner.insert("name", ErrorNode::leaf("The value is required"));

        let mut report = ErrorReport::new();
        report.insert("profile", ErrorNode::Nested(inner));

        let json = report.to_json();
        assert_eq!(
            json["profile"]["name"],
            serde_json::Value::String("The value is required".to_string())
        );
    }

    #[test]
    fn test_display() {
        let mut report = ErrorReport::new();
        report.insert("age", ErrorNode::leaf("Can not be greater than 28"));
        assert_eq!(report.to_string(), "age: Can not be greater than 28");
    }
}

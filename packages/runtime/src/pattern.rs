//! Payload patterns for dispatch.

use serde_json::Value;

/// A payload-matching capability.
///
/// The dispatch table evaluates patterns in registration order and
/// selects the first whose `accepts` returns true.
pub trait Pattern: Send + Sync {
    fn accepts(&self, payload: &Value) -> bool;
}

/// Matches payloads equal to a literal JSON value.
pub struct Literal(pub Value);

impl Pattern for Literal {
    fn accepts(&self, payload: &Value) -> bool {
        *payload == self.0
    }
}

/// JSON type shapes for [`Shape`] patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

/// Matches payloads of one JSON type.
pub struct Shape(pub ValueShape);

impl Pattern for Shape {
    fn accepts(&self, payload: &Value) -> bool {
        match self.0 {
            ValueShape::Null => payload.is_null(),
            ValueShape::Bool => payload.is_boolean(),
            ValueShape::Number => payload.is_number(),
            ValueShape::String => payload.is_string(),
            ValueShape::Array => payload.is_array(),
            ValueShape::Object => payload.is_object(),
        }
    }
}

/// Matches payloads accepted by an arbitrary predicate.
pub struct Guard<F>(pub F);

impl<F> Pattern for Guard<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn accepts(&self, payload: &Value) -> bool {
        (self.0)(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn literal_matches_exact_values() {
        let pattern = Literal(json!("get"));
        assert!(pattern.accepts(&json!("get")));
        assert!(!pattern.accepts(&json!("set")));
        assert!(!pattern.accepts(&json!({"get": true})));
    }

    #[test]
    fn shape_matches_json_types() {
        assert!(Shape(ValueShape::Number).accepts(&json!(5)));
        assert!(Shape(ValueShape::Number).accepts(&json!(5.5)));
        assert!(!Shape(ValueShape::Number).accepts(&json!("5")));
        assert!(Shape(ValueShape::Object).accepts(&json!({"a": 1})));
        assert!(Shape(ValueShape::Null).accepts(&json!(null)));
    }

    #[test]
    fn guard_matches_by_predicate() {
        let pattern = Guard(|payload: &Value| {
            payload.get("op").and_then(Value::as_str) == Some("add")
        });
        assert!(pattern.accepts(&json!({"op": "add", "n": 2})));
        assert!(!pattern.accepts(&json!({"op": "sub", "n": 2})));
    }
}

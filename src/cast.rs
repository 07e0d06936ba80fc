//! Leaf type inference and coercion.
//!
//! Every leaf in a default payload fixes a [`CastKind`] for its path; values
//! written through an accessor are coerced to that kind. Coercion is
//! best-effort by design: malformed input degrades to the kind's documented
//! fallback instead of raising, and `null` always passes through untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The semantic kind of a leaf, inferred from its default value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastKind {
    /// Boolean with loose truthy/falsy coercion.
    Boolean,
    /// Integer; numeric strings parse, garbage falls back to `0`.
    Integer,
    /// Float; numeric strings parse, garbage falls back to `0.0`.
    Float,
    /// Identity cast; also the kind inferred for a `null` default.
    String,
    /// Opaque blob: sub-mappings and arrays pass through unchanged.
    Text,
}

impl CastKind {
    /// Infer the kind of a default leaf value.
    ///
    /// First match wins: booleans are `Boolean`, `null` is `String`,
    /// mappings (and arrays) are opaque `Text`, numbers split into
    /// `Integer`/`Float`, everything else keys off its own runtime type.
    pub fn infer(value: &Value) -> CastKind {
        match value {
            Value::Bool(_) => CastKind::Boolean,
            Value::Null => CastKind::String,
            Value::Object(_) | Value::Array(_) => CastKind::Text,
            Value::Number(n) if n.is_f64() => CastKind::Float,
            Value::Number(_) => CastKind::Integer,
            Value::String(_) => CastKind::String,
        }
    }

    /// Coerce a raw value to this kind.
    ///
    /// `null` is preserved for every kind. Failures never propagate: an
    /// unparsable integer becomes `0`, an unparsable float `0.0`.
    pub fn cast(&self, raw: Value) -> Value {
        if raw.is_null() {
            return Value::Null;
        }
        match self {
            CastKind::Boolean => Value::Bool(truthy(&raw)),
            CastKind::Integer => Value::from(to_i64(&raw)),
            CastKind::Float => {
                serde_json::Number::from_f64(to_f64(&raw)).map_or(Value::from(0.0), Value::Number)
            }
            CastKind::String | CastKind::Text => raw,
        }
    }

    /// Stable lower-case name, matching the serialized form.
    pub fn name(&self) -> &'static str {
        match self {
            CastKind::Boolean => "boolean",
            CastKind::Integer => "integer",
            CastKind::Float => "float",
            CastKind::String => "string",
            CastKind::Text => "text",
        }
    }
}

impl fmt::Display for CastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Loose truthiness: `false`, `0`, `"false"`, `"0"` and the empty string are
/// false; every other non-null value is true.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !matches!(s.as_str(), "" | "0" | "false"),
        _ => true,
    }
}

fn to_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        Value::Bool(true) => 1,
        _ => 0,
    }
}

fn to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_infer() {
        assert_eq!(CastKind::infer(&json!(true)), CastKind::Boolean);
        assert_eq!(CastKind::infer(&json!(false)), CastKind::Boolean);
        assert_eq!(CastKind::infer(&Value::Null), CastKind::String);
        assert_eq!(CastKind::infer(&json!({"a": 1})), CastKind::Text);
        assert_eq!(CastKind::infer(&json!([1, 2])), CastKind::Text);
        assert_eq!(CastKind::infer(&json!(42)), CastKind::Integer);
        assert_eq!(CastKind::infer(&json!(1.5)), CastKind::Float);
        assert_eq!(CastKind::infer(&json!("s")), CastKind::String);
    }

    #[test]
    fn test_boolean_cast_falsy() {
        for raw in [json!(false), json!(0), json!("false"), json!("0"), json!("")] {
            assert_eq!(CastKind::Boolean.cast(raw.clone()), json!(false), "raw: {raw}");
        }
    }

    #[test]
    fn test_boolean_cast_truthy() {
        for raw in [json!(true), json!(1), json!("1"), json!("anything"), json!("t")] {
            assert_eq!(CastKind::Boolean.cast(raw.clone()), json!(true), "raw: {raw}");
        }
    }

    #[test]
    fn test_boolean_cast_null() {
        assert_eq!(CastKind::Boolean.cast(Value::Null), Value::Null);
    }

    #[test]
    fn test_integer_cast() {
        assert_eq!(CastKind::Integer.cast(json!("10")), json!(10));
        assert_eq!(CastKind::Integer.cast(json!("not a number")), json!(0));
        assert_eq!(CastKind::Integer.cast(Value::Null), Value::Null);
        assert_eq!(CastKind::Integer.cast(json!(7)), json!(7));
        assert_eq!(CastKind::Integer.cast(json!(3.9)), json!(3));
        assert_eq!(CastKind::Integer.cast(json!(" 42 ")), json!(42));
    }

    #[test]
    fn test_float_cast() {
        assert_eq!(CastKind::Float.cast(json!("1.5")), json!(1.5));
        assert_eq!(CastKind::Float.cast(json!("junk")), json!(0.0));
        assert_eq!(CastKind::Float.cast(Value::Null), Value::Null);
    }

    #[test]
    fn test_string_cast_identity() {
        assert_eq!(CastKind::String.cast(json!("keep")), json!("keep"));
        assert_eq!(CastKind::String.cast(json!(5)), json!(5));
        assert_eq!(CastKind::String.cast(Value::Null), Value::Null);
    }

    #[test]
    fn test_text_cast_identity() {
        let blob = json!({"nested": {"deep": true}});
        assert_eq!(CastKind::Text.cast(blob.clone()), blob);
    }

    #[test]
    fn test_kind_name() {
        assert_eq!(CastKind::Boolean.name(), "boolean");
        assert_eq!(CastKind::Text.to_string(), "text");
    }
}

//! Convert serde_json::Value to text parameters that PostgreSQL casts to the column type.

use serde_json::Value;

/// Text form of a JSON value for a `$n::<type>` placeholder. `None` binds SQL NULL.
///
/// Every parameter is sent as text and cast server-side, so one bind type covers
/// all column types and malformed values surface as database errors.
pub fn text_param(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => Some(v.to_string()),
    }
}

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

pub(crate) fn now_iso8601() -> String {
  Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Loose scalar-to-text coercion for hand-edited state files.
/// Strings pass through, numbers and booleans are stringified, anything else is absent.
pub(crate) fn value_to_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    Value::Null | Value::Array(_) | Value::Object(_) => None,
  }
}

pub(crate) fn is_truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
    Value::String(s) => !s.is_empty(),
    Value::Array(items) => !items.is_empty(),
    Value::Object(map) => !map.is_empty(),
  }
}

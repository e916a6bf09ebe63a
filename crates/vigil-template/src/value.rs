//! Rendering resolved values back into template text

use serde_json::Value;

/// Render a resolved value as substitution text.
///
/// Strings substitute as-is, `null` substitutes as the literal `null`,
/// numbers and booleans use their plain form, and arrays join their rendered
/// elements with commas (null elements render empty inside an array).
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => render_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Quote string values for embedding into a boolean condition; everything
/// else passes through so numbers stay numeric operands. Single quotes
/// inside the string are backslash-escaped.
pub fn quote_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(format!("'{}'", s.replace('\'', "\\'"))),
        other => other,
    }
}

//! Raw cell → typed value coercion
//!
//! Rules are applied in order and the first match wins:
//!
//! 1. `""` → [`CellValue::Null`]
//! 2. `"true"` / `"false"` → [`CellValue::Bool`]
//! 3. a finite decimal number (surrounding whitespace allowed) → [`CellValue::Number`]
//! 4. `[...]` holding a JSON list of scalars → [`CellValue::List`]
//! 5. anything else → [`CellValue::Text`], unchanged
//!
//! Coercion is total. A malformed list falls through to rule 5.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    List(Vec<String>),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

pub fn coerce(raw: &str) -> CellValue {
    if raw.is_empty() {
        return CellValue::Null;
    }

    match raw {
        "true" => return CellValue::Bool(true),
        "false" => return CellValue::Bool(false),
        _ => {},
    }

    if let Some(number) = parse_number(raw) {
        return CellValue::Number(number);
    }

    if raw.starts_with('[') && raw.ends_with(']') {
        if let Some(list) = parse_list(raw) {
            return CellValue::List(list);
        }
    }

    CellValue::Text(raw.to_string())
}

/// Finite decimal numbers only; `inf`/`nan` spellings stay text.
fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    // f64::from_str accepts "inf", "infinity" and "nan"; require a digit.
    if !trimmed.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// JSON list whose elements are strings, numbers or booleans.
fn parse_list(raw: &str) -> Option<Vec<String>> {
    let values: Vec<Value> = serde_json::from_str(raw).ok()?;
    values
        .into_iter()
        .map(|value| match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        })
        .collect()
}

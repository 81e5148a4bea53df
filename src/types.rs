//! Core types - model values and the helpers every layer shares.
//!
//! Models hold a [`Value`] of arbitrary shape (object, array or primitive).
//! These helpers give the rest of the crate one definition of:
//! - truthiness (what the default update dispatch treats as "empty")
//! - the string form written into node content
//! - shape-preserving iteration over arrays and dictionaries

pub use serde_json::Value;

// =============================================================================
// Truthiness
// =============================================================================

/// Whether a value counts as falsy: `null`, `false`, zero, or the empty string.
///
/// Arrays and objects are always truthy, even when empty.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

// =============================================================================
// String Form
// =============================================================================

/// The string form of a value as it is written into node content.
///
/// - strings are written as-is (no quotes)
/// - whole numbers print without a decimal point (`3.0` becomes `"3"`)
/// - arrays join the string forms of their items with `,`
/// - objects print as compact JSON
/// - `null` prints as the empty string
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if n.is_f64() {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
                    _ => n.to_string(),
                }
            } else {
                n.to_string()
            }
        }
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Content written by the default update dispatch: empty for falsy values,
/// the string form otherwise.
pub fn content_for(value: &Value) -> String {
    if is_falsy(value) {
        String::new()
    } else {
        display_value(value)
    }
}

// =============================================================================
// Entry Iteration
// =============================================================================

/// Key of one entry in a collection value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryKey<'a> {
    /// Position in an array.
    Index(usize),
    /// Key in a dictionary.
    Key(&'a str),
}

/// Entries of a collection value, or `None` for scalars.
///
/// Arrays yield index order; dictionaries yield insertion order.
pub fn entries(value: &Value) -> Option<Vec<(EntryKey<'_>, &Value)>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| (EntryKey::Index(i), v))
                .collect(),
        ),
        Value::Object(map) => Some(
            map.iter()
                .map(|(k, v)| (EntryKey::Key(k.as_str()), v))
                .collect(),
        ),
        _ => None,
    }
}

/// Read one member of a value by key.
///
/// Objects are indexed by name, arrays by a numeric key. Anything missing
/// reads as `null`.
pub fn member(value: &Value, key: &str) -> Value {
    match value {
        Value::Object(map) => map.get(key).cloned().unwrap_or(Value::Null),
        Value::Array(items) => key
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i).cloned())
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

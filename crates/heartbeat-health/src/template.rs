//! `$key` substitution for alert messages.

use serde_json::{Map, Value};

/// Text a field contributes to a message.
///
/// Strings are inserted raw, `null` as nothing, everything else as compact
/// JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Replace every `$key` in `template` with the matching entry of `table`.
///
/// The template is scanned once, left to right; at each `$` the longest key
/// that follows it wins, so `$name_suffix` is not split by `$name`.
/// Substituted text is never rescanned. A `$` that starts no known key is
/// kept as written.
pub fn expand_message(template: &str, table: &Map<String, Value>) -> String {
    let mut keys: Vec<&str> = table
        .keys()
        .map(String::as_str)
        .filter(|key| !key.is_empty())
        .collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        match keys.iter().find(|key| after.starts_with(**key)) {
            Some(key) => {
                out.push_str(&render_value(&table[*key]));
                rest = &after[key.len()..];
            }
            None => {
                out.push('$');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

//! Quoting grammar for values on the wire.
//!
//! A quoted value is delimited by `"`. Inside it `\"` stands for a literal
//! double quote and `\\` for a literal backslash; there are no other escape
//! sequences.

/// Escape a value for use inside a quoted string.
///
/// Backslashes are doubled first, then double quotes are prefixed with a
/// backslash. The other order would double-escape the backslashes added for
/// the quotes.
pub fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Reverse [`escape`].
pub fn unescape(value: &str) -> String {
    value.replace("\\\"", "\"").replace("\\\\", "\\")
}

/// Extract the unescaped content of a quoted value.
///
/// Returns `None` unless `source` both starts and ends with a double quote
/// (a lone `"` is not a quoted value).
pub fn extract_quoted(source: &str) -> Option<String> {
    if source.len() < 2 || !source.starts_with('"') || !source.ends_with('"') {
        return None;
    }
    Some(unescape(&source[1..source.len() - 1]))
}

/// Split a `NAME "VALUE"` pair as found in `LIST` entries.
///
/// The name ends at the first space and must not be empty; the rest must be a
/// valid quoted value.
pub fn split_name_value(source: &str) -> Option<(String, String)> {
    let (name, rest) = source.split_once(' ')?;
    if name.is_empty() {
        return None;
    }
    let value = extract_quoted(rest)?;
    Some((name.to_string(), value))
}

/// Wrap a value in double quotes, escaping it.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", escape(value))
}

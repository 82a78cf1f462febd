//! Device variables.

use crate::client::SessionHandle;
use crate::error::ClientResult;
use nut_protocol::{expect_exact_ok, extract_quoted, Query, Request, Subcommand};

/// A variable of a device, e.g. `battery.charge`.
#[derive(Debug, Clone)]
pub struct Variable {
    device: String,
    name: String,
    handle: SessionHandle,
}

impl Variable {
    pub(crate) fn new(device: String, name: String, handle: SessionHandle) -> Self {
        Variable {
            device,
            name,
            handle,
        }
    }

    /// Variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the device the variable belongs to.
    pub fn device_name(&self) -> &str {
        &self.device
    }

    /// Whether the session this variable came from is still connected.
    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    fn get(&self, subcommand: Subcommand) -> ClientResult<Option<String>> {
        self.handle
            .with(|s| s.get(Query::new(subcommand, [&self.device, &self.name])))
    }

    fn list(&self, subcommand: Subcommand) -> ClientResult<Option<Vec<String>>> {
        self.handle
            .with(|s| s.list(Query::new(subcommand, [&self.device, &self.name])))
    }

    /// Current value (`GET VAR`).
    pub fn value(&self) -> ClientResult<Option<String>> {
        Ok(self.get(Subcommand::Var)?.and_then(|r| extract_quoted(&r)))
    }

    /// Description (`GET DESC`).
    pub fn description(&self) -> ClientResult<Option<String>> {
        Ok(self.get(Subcommand::Desc)?.and_then(|r| extract_quoted(&r)))
    }

    /// Change the value (`SET VAR`). The server must answer exactly `OK`.
    pub fn set_value(&self, value: &str) -> ClientResult<()> {
        let request = Request::SetVar {
            device: self.device.clone(),
            name: self.name.clone(),
            value: value.to_string(),
        };
        self.handle.with(|s| {
            let reply = s.exchange(&request)?;
            expect_exact_ok(&reply, "SET VAR")?;
            Ok(())
        })
    }

    /// Type flags (`GET TYPE`), e.g. `["RW", "STRING:15"]`.
    pub fn type_flags(&self) -> ClientResult<Option<Vec<String>>> {
        Ok(self
            .get(Subcommand::Type)?
            .map(|r| r.split_whitespace().map(str::to_string).collect()))
    }

    /// Allowed values of an enumerated variable (`LIST ENUM`).
    pub fn enum_values(&self) -> ClientResult<Option<Vec<String>>> {
        Ok(self
            .list(Subcommand::Enum)?
            .map(|entries| entries.iter().filter_map(|e| extract_quoted(e)).collect()))
    }

    /// Allowed `(min, max)` ranges of the variable (`LIST RANGE`).
    pub fn ranges(&self) -> ClientResult<Option<Vec<(String, String)>>> {
        Ok(self
            .list(Subcommand::Range)?
            .map(|entries| entries.iter().filter_map(|e| parse_range(e)).collect()))
    }
}

/// Parse a `"min" "max"` range entry.
///
/// The minimum ends at its first unescaped closing quote, so escaped quotes
/// and spaces inside it do not split the entry.
fn parse_range(entry: &str) -> Option<(String, String)> {
    let body = entry.strip_prefix('"')?;
    let mut escaped = false;
    let mut close = None;
    for (i, c) in body.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => {
                close = Some(i);
                break;
            }
            _ => {}
        }
    }
    // Offset of the closing quote within `entry`.
    let close = close? + 1;
    let max = entry[close + 1..].strip_prefix(' ')?;
    let min = extract_quoted(&entry[..=close])?;
    let max = extract_quoted(max)?;
    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(
            parse_range("\"90\" \"100\""),
            Some(("90".to_string(), "100".to_string()))
        );
        assert_eq!(parse_range("\"90\""), None);
        assert_eq!(parse_range("90 100"), None);
    }

    #[test]
    fn test_parse_range_escaped_quote_in_min() {
        assert_eq!(
            parse_range(r#""a\" b" "c""#),
            Some(("a\" b".to_string(), "c".to_string()))
        );
        assert_eq!(
            parse_range(r#""x\\" "y\"z""#),
            Some(("x\\".to_string(), "y\"z".to_string()))
        );
        assert_eq!(parse_range(r#""open"#), None);
    }
}

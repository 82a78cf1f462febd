//! Parser for the discovery tool's parsable output.
//!
//! Every line describes one device:
//!
//! ```text
//! SNMP:driver="snmp-ups",port="192.168.1.1",desc="Evolution",mibs="mge",community="public"
//! ```
//!
//! The part before the first `:` names the bus/driver family. The rest is a
//! comma separated list of `key=value`, `key="quoted value"` or bare `key`
//! members.

use indexmap::IndexMap;
use nut_protocol::unescape;
use serde::Serialize;
use std::mem;

/// A device reported by the discovery tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredDevice {
    driver: String,
    /// Properties in source order. `None` means the key was given without a
    /// value, which is different from an empty value.
    properties: IndexMap<String, Option<String>>,
}

impl DiscoveredDevice {
    /// Driver (bus) name, the text before the first `:`.
    pub fn driver(&self) -> &str {
        &self.driver
    }

    /// All properties in source order.
    pub fn properties(&self) -> &IndexMap<String, Option<String>> {
        &self.properties
    }

    /// Value of a property. `None` both when the property is missing and when
    /// it was given without a value; use [`has_property`](Self::has_property)
    /// to tell them apart.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(|v| v.as_deref())
    }

    /// Whether the property is present, with or without a value.
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Accumulating a bare key.
    Key,
    /// Just after `=`.
    ValueStart,
    /// Inside `"..."`; `escaped` is set right after a backslash.
    QuotedValue { escaped: bool },
    UnquotedValue,
    /// After the closing quote; only `,` may follow.
    AfterQuoted,
}

/// Parse one line of parsable discovery output.
///
/// Returns `None` if the line has no driver prefix or is structurally
/// malformed; a malformed line never yields a partial record.
pub fn parse_line(line: &str) -> Option<DiscoveredDevice> {
    let (driver, rest) = line.split_once(':')?;
    if driver.is_empty() {
        return None;
    }

    let mut properties = IndexMap::new();
    let mut state = State::Key;
    let mut key = String::new();
    let mut text = String::new();

    for c in rest.chars() {
        state = match state {
            State::Key => match c {
                'a'..='z' | 'A'..='Z' | '_' => {
                    text.push(c);
                    State::Key
                }
                '=' if !text.is_empty() => {
                    key = mem::take(&mut text);
                    State::ValueStart
                }
                ',' => {
                    properties.insert(mem::take(&mut text), None);
                    State::Key
                }
                _ => return None,
            },
            State::ValueStart => {
                if c == '"' {
                    State::QuotedValue { escaped: false }
                } else {
                    text.push(c);
                    State::UnquotedValue
                }
            }
            State::QuotedValue { escaped: true } => {
                // Keep the pair; unescape() resolves it on commit.
                text.push('\\');
                text.push(c);
                State::QuotedValue { escaped: false }
            }
            State::QuotedValue { escaped: false } => match c {
                '\\' => State::QuotedValue { escaped: true },
                '"' => {
                    let value = unescape(&mem::take(&mut text));
                    properties.insert(mem::take(&mut key), Some(value));
                    State::AfterQuoted
                }
                _ => {
                    text.push(c);
                    State::QuotedValue { escaped: false }
                }
            },
            State::UnquotedValue => {
                if c == ',' {
                    properties.insert(mem::take(&mut key), Some(mem::take(&mut text)));
                    State::Key
                } else {
                    text.push(c);
                    State::UnquotedValue
                }
            }
            State::AfterQuoted => match c {
                ',' => State::Key,
                _ => return None,
            },
        };
    }

    match state {
        State::Key => {
            if !text.is_empty() {
                properties.insert(text, None);
            }
        }
        State::ValueStart => {
            properties.insert(key, Some(String::new()));
        }
        // Unterminated quote: tolerated, the value runs to the end of line.
        State::QuotedValue { .. } => {
            properties.insert(key, Some(unescape(&text)));
        }
        State::UnquotedValue => {
            properties.insert(key, Some(text));
        }
        State::AfterQuoted => {}
    }

    Some(DiscoveredDevice {
        driver: driver.to_string(),
        properties,
    })
}

//! Reply parsing for the NUT protocol.
//!
//! Replies from the server can be:
//! - Success: `OK`, possibly followed by more text (`OK Goodbye`)
//! - Errors: `ERR <code> [<detail>]`
//! - Values: the query echoed back followed by the value (`GET` replies)
//! - Lists: a block framed by `BEGIN LIST <query>` / `END LIST <query>`

use crate::commands::Query;
use crate::error::{ErrorCode, ProtocolError, ProtocolResult};

/// Prefix of every error line.
pub const ERROR_PREFIX: &str = "ERR ";

/// Parsed reply line.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Plain `OK`.
    Ok,

    /// A line starting with `OK` and carrying more text. The full line is kept.
    OkMessage(String),

    /// An `ERR` line.
    Error(ProtocolError),

    /// Anything else: values, list lines, version strings.
    Line(String),
}

impl Response {
    /// Classify a reply line.
    pub fn parse(line: &str) -> Response {
        if let Some(err) = parse_error(line) {
            return Response::Error(err);
        }
        if line == "OK" {
            return Response::Ok;
        }
        if line.starts_with("OK") {
            return Response::OkMessage(line.to_string());
        }
        Response::Line(line.to_string())
    }

    /// Check if this is an OK response (plain `OK` or any line starting with `OK`).
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok | Response::OkMessage(_))
    }

    /// Check if this is exactly `OK`.
    pub fn is_exact_ok(&self) -> bool {
        matches!(self, Response::Ok)
    }

    /// Check if this is an error response.
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }

    /// Get the error if this is an Error response.
    pub fn as_error(&self) -> Option<&ProtocolError> {
        match self {
            Response::Error(e) => Some(e),
            _ => None,
        }
    }
}

/// Parse an `ERR` line.
///
/// Returns `None` if the line is not an error line. `ERR <code>` yields an
/// empty detail and `ERR <code> <detail>` keeps the whole remainder as the
/// detail. An `ERR ` line without a code cannot be attributed and becomes an
/// `UNKNOWN-RESPONSE` error carrying the raw line.
pub fn parse_error(line: &str) -> Option<ProtocolError> {
    let rest = line.strip_prefix(ERROR_PREFIX)?;
    let (code, detail) = match rest.split_once(' ') {
        Some((code, detail)) => (code, detail),
        None => (rest, ""),
    };
    if code.is_empty() {
        return Some(ProtocolError::unknown_response(line));
    }
    Some(ProtocolError::new(ErrorCode::from(code), detail))
}

/// Fail with the server error if `line` is an `ERR` line.
pub fn check_error(line: &str) -> ProtocolResult<()> {
    match parse_error(line) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Strip the echoed query from a `GET` reply.
///
/// Returns `None` when the reply does not start with `"<query> "`.
pub fn strip_echo<'a>(query: &Query, line: &'a str) -> Option<&'a str> {
    line.strip_prefix(query.as_str())?.strip_prefix(' ')
}

/// Require a reply starting with `OK`.
///
/// `context` names the operation for the `UNKNOWN-RESPONSE` detail.
pub fn expect_ok(line: &str, context: &str) -> ProtocolResult<()> {
    match Response::parse(line) {
        Response::Error(err) => Err(err),
        response if response.is_ok() => Ok(()),
        _ => Err(unexpected(line, context)),
    }
}

/// Require a reply equal to `OK`.
pub fn expect_exact_ok(line: &str, context: &str) -> ProtocolResult<()> {
    match Response::parse(line) {
        Response::Error(err) => Err(err),
        Response::Ok => Ok(()),
        _ => Err(unexpected(line, context)),
    }
}

fn unexpected(line: &str, context: &str) -> ProtocolError {
    ProtocolError::unknown_response(format!("unknown response in {}: {}", context, line))
}

/// Outcome of feeding one line into a [`ListDecoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStep {
    /// An entry was collected; keep reading.
    Continue,
    /// The matching `END LIST` line arrived. Holds every entry in order.
    Done(Vec<String>),
    /// A line that is neither an entry nor the matching terminator. The
    /// collected entries are discarded.
    Mismatch,
}

/// Incremental decoder for `LIST` replies.
///
/// Each entry line starts with `"<query> "`; what follows is collected. The
/// first line that is not an entry ends the list and must be exactly
/// `END LIST <query>`. Error detection on each line is the caller's job.
#[derive(Debug, Clone)]
pub struct ListDecoder {
    prefix: String,
    end: String,
    items: Vec<String>,
}

impl ListDecoder {
    /// Start decoding from the first reply line.
    ///
    /// Returns `None` unless `first` is exactly `BEGIN LIST <query>`.
    pub fn begin(query: &Query, first: &str) -> Option<ListDecoder> {
        if first != format!("BEGIN LIST {}", query) {
            return None;
        }
        Some(ListDecoder {
            prefix: query.reply_prefix(),
            end: format!("END LIST {}", query),
            items: Vec::new(),
        })
    }

    /// Feed the next reply line.
    pub fn feed(&mut self, line: &str) -> ListStep {
        if let Some(entry) = line.strip_prefix(self.prefix.as_str()) {
            self.items.push(entry.to_string());
            return ListStep::Continue;
        }
        if line == self.end {
            return ListStep::Done(std::mem::take(&mut self.items));
        }
        ListStep::Mismatch
    }

    /// Number of entries collected so far.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no entry has been collected yet.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Subcommand;

    #[test]
    fn test_parse_ok() {
        let response = Response::parse("OK");
        assert_eq!(response, Response::Ok);
        assert!(response.is_ok());
        assert!(response.is_exact_ok());
    }

    #[test]
    fn test_parse_ok_message() {
        let response = Response::parse("OK Goodbye");
        assert_eq!(response, Response::OkMessage("OK Goodbye".to_string()));
        assert!(response.is_ok());
        assert!(!response.is_exact_ok());
    }

    #[test]
    fn test_parse_line() {
        let response = Response::parse("VAR ups1 ups.status \"OL\"");
        assert_eq!(response, Response::Line("VAR ups1 ups.status \"OL\"".to_string()));
        assert!(!response.is_ok());
    }

    #[test]
    fn test_parse_error_code_only() {
        let err = parse_error("ERR ACCESS-DENIED").unwrap();
        assert_eq!(err.code, ErrorCode::AccessDenied);
        assert_eq!(err.detail, "");
        assert!(Response::parse("ERR ACCESS-DENIED").is_error());
    }

    #[test]
    fn test_parse_error_with_detail() {
        let err = parse_error("ERR UNKNOWN-UPS bad-device-name").unwrap();
        assert_eq!(err.code, ErrorCode::UnknownUps);
        assert_eq!(err.detail, "bad-device-name");

        let err = parse_error("ERR SET-FAILED value out of range").unwrap();
        assert_eq!(err.detail, "value out of range");
    }

    #[test]
    fn test_parse_error_malformed() {
        let err = parse_error("ERR ").unwrap();
        assert_eq!(err.code, ErrorCode::UnknownResponse);
        assert_eq!(err.detail, "ERR ");
    }

    #[test]
    fn test_not_an_error() {
        assert!(parse_error("ERRATIC").is_none());
        assert!(parse_error("ERR").is_none());
        assert!(check_error("OK").is_ok());
    }

    #[test]
    fn test_strip_echo() {
        let query = Query::new(Subcommand::Var, ["ups1", "ups.status"]);
        assert_eq!(strip_echo(&query, "VAR ups1 ups.status \"OL\""), Some("\"OL\""));
        assert_eq!(strip_echo(&query, "VAR ups1 ups.statusx \"OL\""), None);
        assert_eq!(strip_echo(&query, "VAR ups2 ups.status \"OL\""), None);
        assert_eq!(strip_echo(&query, "VAR ups1 ups.status"), None);
    }

    #[test]
    fn test_expect_ok() {
        assert!(expect_ok("OK", "LOGIN").is_ok());
        assert!(expect_ok("OK Goodbye", "LOGIN").is_ok());

        let err = expect_ok("HUH", "LOGIN").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownResponse);
        assert!(err.detail.contains("HUH"));

        let err = expect_ok("ERR ACCESS-DENIED", "LOGIN").unwrap_err();
        assert_eq!(err.code, ErrorCode::AccessDenied);
    }

    #[test]
    fn test_expect_exact_ok() {
        assert!(expect_exact_ok("OK", "INSTCMD").is_ok());
        let err = expect_exact_ok("OK TRACKING 1234", "INSTCMD").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownResponse);
    }

    #[test]
    fn test_list_decoder() {
        let query = Query::new(Subcommand::Ups, Vec::<String>::new());
        let mut list = ListDecoder::begin(&query, "BEGIN LIST UPS").unwrap();

        assert_eq!(list.feed("UPS ups1 \"desc1\""), ListStep::Continue);
        assert_eq!(list.feed("UPS ups2 \"desc2\""), ListStep::Continue);
        assert_eq!(list.len(), 2);
        assert_eq!(
            list.feed("END LIST UPS"),
            ListStep::Done(vec![
                "ups1 \"desc1\"".to_string(),
                "ups2 \"desc2\"".to_string()
            ])
        );
    }

    #[test]
    fn test_list_decoder_empty() {
        let query = Query::new(Subcommand::Cmd, ["ups1"]);
        let mut list = ListDecoder::begin(&query, "BEGIN LIST CMD ups1").unwrap();
        assert!(list.is_empty());
        assert_eq!(list.feed("END LIST CMD ups1"), ListStep::Done(Vec::new()));
    }

    #[test]
    fn test_list_decoder_bad_begin() {
        let query = Query::new(Subcommand::Var, ["ups1"]);
        assert!(ListDecoder::begin(&query, "BEGIN LIST VAR ups2").is_none());
        assert!(ListDecoder::begin(&query, "BEGIN LIST VAR ups1 extra").is_none());
        assert!(ListDecoder::begin(&query, "OK").is_none());
    }

    #[test]
    fn test_list_decoder_bad_terminator() {
        let query = Query::new(Subcommand::Ups, Vec::<String>::new());
        let mut list = ListDecoder::begin(&query, "BEGIN LIST UPS").unwrap();
        assert_eq!(list.feed("UPS ups1 \"desc1\""), ListStep::Continue);
        assert_eq!(list.feed("END LIST VAR"), ListStep::Mismatch);
    }
}

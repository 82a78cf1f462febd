//! Error types for the NUT protocol.

use thiserror::Error;

/// An error reported by the server in an `ERR <code> [<detail>]` line, or
/// detected by the client when a reply does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}{}", detail_suffix(.detail))]
pub struct ProtocolError {
    /// Error code, e.g. `ACCESS-DENIED`.
    pub code: ErrorCode,
    /// Optional human readable detail (empty when absent).
    pub detail: String,
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(": {}", detail)
    }
}

impl ProtocolError {
    /// Create an error with the given code and detail.
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        ProtocolError {
            code,
            detail: detail.into(),
        }
    }

    /// Create an `UNKNOWN-RESPONSE` error carrying the offending line.
    pub fn unknown_response(line: impl Into<String>) -> Self {
        ProtocolError::new(ErrorCode::UnknownResponse, line)
    }

    /// Check whether this error carries the given code.
    pub fn is(&self, code: &ErrorCode) -> bool {
        &self.code == code
    }
}

/// Error codes of the server vocabulary plus the client-detected ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// `VAR-NOT-SUPPORTED`
    VarNotSupported,
    /// `UNKNOWN-UPS`
    UnknownUps,
    /// `ACCESS-DENIED`
    AccessDenied,
    /// `PASSWORD-REQUIRED`
    PasswordRequired,
    /// `PASSWORD-INCORRECT`
    PasswordIncorrect,
    /// `MISSING-ARGUMENT`
    MissingArgument,
    /// `DATA-STALE`
    DataStale,
    /// `VAR-UNKNOWN`
    VarUnknown,
    /// `ALREADY-LOGGED-IN`
    AlreadyLoggedIn,
    /// `ALREADY-SET-PASSWORD`
    AlreadySetPassword,
    /// `UNKNOWN-TYPE`
    UnknownType,
    /// `UNKNOWN-VAR`
    UnknownVar,
    /// `READONLY`
    ReadOnly,
    /// `TOO-LONG`
    TooLong,
    /// `INVALID-VALUE`
    InvalidValue,
    /// `SET-FAILED`
    SetFailed,
    /// `UNKNOWN-INSTCMD`
    UnknownInstCmd,
    /// `INSTCMD-FAILED`
    InstCmdFailed,
    /// `CMD-NOT-SUPPORTED`
    CmdNotSupported,
    /// `INVALID-USERNAME`
    InvalidUsername,
    /// `ALREADY-SET-USERNAME`
    AlreadySetUsername,
    /// `UNKNOWN-COMMAND`
    UnknownCommand,
    /// `INVALID-PASSWORD`
    InvalidPassword,
    /// `USERNAME-REQUIRED`
    UsernameRequired,
    /// `DRIVER-NOT-CONNECTED`
    DriverNotConnected,
    /// `UNKNOWN-RESPONSE`: the reply did not match the expected shape.
    UnknownResponse,
    /// Any code not known to this client, kept verbatim.
    Other(String),
}

impl ErrorCode {
    /// Get the code string as it appears on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::VarNotSupported => "VAR-NOT-SUPPORTED",
            ErrorCode::UnknownUps => "UNKNOWN-UPS",
            ErrorCode::AccessDenied => "ACCESS-DENIED",
            ErrorCode::PasswordRequired => "PASSWORD-REQUIRED",
            ErrorCode::PasswordIncorrect => "PASSWORD-INCORRECT",
            ErrorCode::MissingArgument => "MISSING-ARGUMENT",
            ErrorCode::DataStale => "DATA-STALE",
            ErrorCode::VarUnknown => "VAR-UNKNOWN",
            ErrorCode::AlreadyLoggedIn => "ALREADY-LOGGED-IN",
            ErrorCode::AlreadySetPassword => "ALREADY-SET-PASSWORD",
            ErrorCode::UnknownType => "UNKNOWN-TYPE",
            ErrorCode::UnknownVar => "UNKNOWN-VAR",
            ErrorCode::ReadOnly => "READONLY",
            ErrorCode::TooLong => "TOO-LONG",
            ErrorCode::InvalidValue => "INVALID-VALUE",
            ErrorCode::SetFailed => "SET-FAILED",
            ErrorCode::UnknownInstCmd => "UNKNOWN-INSTCMD",
            ErrorCode::InstCmdFailed => "INSTCMD-FAILED",
            ErrorCode::CmdNotSupported => "CMD-NOT-SUPPORTED",
            ErrorCode::InvalidUsername => "INVALID-USERNAME",
            ErrorCode::AlreadySetUsername => "ALREADY-SET-USERNAME",
            ErrorCode::UnknownCommand => "UNKNOWN-COMMAND",
            ErrorCode::InvalidPassword => "INVALID-PASSWORD",
            ErrorCode::UsernameRequired => "USERNAME-REQUIRED",
            ErrorCode::DriverNotConnected => "DRIVER-NOT-CONNECTED",
            ErrorCode::UnknownResponse => "UNKNOWN-RESPONSE",
            ErrorCode::Other(code) => code,
        }
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "VAR-NOT-SUPPORTED" => ErrorCode::VarNotSupported,
            "UNKNOWN-UPS" => ErrorCode::UnknownUps,
            "ACCESS-DENIED" => ErrorCode::AccessDenied,
            "PASSWORD-REQUIRED" => ErrorCode::PasswordRequired,
            "PASSWORD-INCORRECT" => ErrorCode::PasswordIncorrect,
            "MISSING-ARGUMENT" => ErrorCode::MissingArgument,
            "DATA-STALE" => ErrorCode::DataStale,
            "VAR-UNKNOWN" => ErrorCode::VarUnknown,
            "ALREADY-LOGGED-IN" => ErrorCode::AlreadyLoggedIn,
            "ALREADY-SET-PASSWORD" => ErrorCode::AlreadySetPassword,
            "UNKNOWN-TYPE" => ErrorCode::UnknownType,
            "UNKNOWN-VAR" => ErrorCode::UnknownVar,
            "READONLY" => ErrorCode::ReadOnly,
            "TOO-LONG" => ErrorCode::TooLong,
            "INVALID-VALUE" => ErrorCode::InvalidValue,
            "SET-FAILED" => ErrorCode::SetFailed,
            "UNKNOWN-INSTCMD" => ErrorCode::UnknownInstCmd,
            "INSTCMD-FAILED" => ErrorCode::InstCmdFailed,
            "CMD-NOT-SUPPORTED" => ErrorCode::CmdNotSupported,
            "INVALID-USERNAME" => ErrorCode::InvalidUsername,
            "ALREADY-SET-USERNAME" => ErrorCode::AlreadySetUsername,
            "UNKNOWN-COMMAND" => ErrorCode::UnknownCommand,
            "INVALID-PASSWORD" => ErrorCode::InvalidPassword,
            "USERNAME-REQUIRED" => ErrorCode::UsernameRequired,
            "DRIVER-NOT-CONNECTED" => ErrorCode::DriverNotConnected,
            "UNKNOWN-RESPONSE" => ErrorCode::UnknownResponse,
            other => ErrorCode::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

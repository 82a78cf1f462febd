//! Error types for the client.

use nut_protocol::{ErrorCode, ProtocolError};
use thiserror::Error;

/// Authentication step that failed during [`Client::connect`](crate::Client::connect).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// The `USERNAME` request.
    Username,
    /// The `PASSWORD` request.
    Password,
}

impl AuthPhase {
    /// Request word of this phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthPhase::Username => "USERNAME",
            AuthPhase::Password => "PASSWORD",
        }
    }
}

impl std::fmt::Display for AuthPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur when talking to a NUT server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure: refused connection, unknown host, read/write error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered with `ERR`, or the reply had an unexpected shape.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The operation needs a connected session.
    #[error("not connected")]
    NotConnected,

    /// The server closed the stream while a reply was expected.
    #[error("connection closed by server")]
    ConnectionClosed,

    /// A device, variable or command outlived the connection it came from.
    #[error("session is no longer valid")]
    SessionExpired,

    /// Authentication was refused.
    #[error("authentication failed ({phase}): {source}")]
    Authentication {
        /// Which request was refused.
        phase: AuthPhase,
        /// What the server said.
        source: ProtocolError,
    },
}

impl ClientError {
    /// Protocol error code carried by this error, if any.
    pub fn code(&self) -> Option<&ErrorCode> {
        match self {
            ClientError::Protocol(err) => Some(&err.code),
            ClientError::Authentication { source, .. } => Some(&source.code),
            _ => None,
        }
    }

    /// Check whether this error carries the given protocol error code.
    pub fn is_code(&self, code: &ErrorCode) -> bool {
        self.code() == Some(code)
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code() {
        let err = ClientError::from(ProtocolError::new(ErrorCode::AccessDenied, ""));
        assert!(err.is_code(&ErrorCode::AccessDenied));
        assert!(!ClientError::NotConnected.is_code(&ErrorCode::AccessDenied));

        let err = ClientError::Authentication {
            phase: AuthPhase::Password,
            source: ProtocolError::new(ErrorCode::PasswordIncorrect, ""),
        };
        assert_eq!(err.code(), Some(&ErrorCode::PasswordIncorrect));
        assert_eq!(
            err.to_string(),
            "authentication failed (PASSWORD): PASSWORD-INCORRECT"
        );
    }
}

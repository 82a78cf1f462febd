//! Blocking client for NUT (Network UPS Tools) servers.
//!
//! [`Client`] owns one connection and speaks the line protocol defined in
//! [`nut_protocol`]. Devices, variables and instant commands are thin
//! handles: they hold names only and query the server on every call. They
//! refuse to work once the client that created them has disconnected.
//!
//! Transports are pluggable through [`LineTransport`]; [`TcpLineTransport`] is
//! the default.

mod client;
mod command;
mod device;
mod error;
mod transport;
mod variable;

pub use client::{Client, ClientConfig};
pub use command::Command;
pub use device::Device;
pub use error::{AuthPhase, ClientError, ClientResult};
pub use transport::{LineTransport, TcpLineTransport};
pub use variable::Variable;

pub use nut_protocol::{ErrorCode, ProtocolError, DEFAULT_PORT};

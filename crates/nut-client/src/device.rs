//! Devices served by a NUT server.

use crate::client::{parse_count, SessionHandle};
use crate::command::Command;
use crate::error::ClientResult;
use crate::variable::Variable;
use nut_protocol::{extract_quoted, split_name_value, Query, Request, Subcommand};

/// A device (UPS, PDU, ...) known to the server.
///
/// Holds only its name. Every accessor queries the server again.
#[derive(Debug, Clone)]
pub struct Device {
    name: String,
    handle: SessionHandle,
}

impl Device {
    pub(crate) fn new(name: String, handle: SessionHandle) -> Self {
        Device { name, handle }
    }

    /// Device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the session this device came from is still connected.
    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    /// Description from `GET UPSDESC`.
    pub fn description(&self) -> ClientResult<Option<String>> {
        let reply = self
            .handle
            .with(|s| s.get(Query::new(Subcommand::UpsDesc, [&self.name])))?;
        Ok(reply.and_then(|r| extract_quoted(&r)))
    }

    /// Log into the device (`LOGIN`).
    pub fn login(&self) -> ClientResult<()> {
        let request = Request::Login {
            device: self.name.clone(),
        };
        self.handle.with(|s| s.command(&request, "LOGIN"))
    }

    /// Take primary control of the device (`MASTER`).
    pub fn master(&self) -> ClientResult<()> {
        let request = Request::Master {
            device: self.name.clone(),
        };
        self.handle.with(|s| s.command(&request, "MASTER"))
    }

    /// Set the forced shutdown flag (`FSD`).
    pub fn forced_shutdown(&self) -> ClientResult<()> {
        let request = Request::Fsd {
            device: self.name.clone(),
        };
        self.handle.with(|s| s.command(&request, "FSD"))
    }

    /// Number of clients logged into the device.
    pub fn num_logins(&self) -> ClientResult<Option<u32>> {
        let reply = self
            .handle
            .with(|s| s.get(Query::new(Subcommand::NumLogins, [&self.name])))?;
        reply.map(|r| parse_count(&r)).transpose()
    }

    /// All variables of the device (`LIST VAR`).
    pub fn variable_list(&self) -> ClientResult<Option<Vec<Variable>>> {
        self.variables(Subcommand::Var)
    }

    /// Writable variables of the device (`LIST RW`).
    pub fn rw_variable_list(&self) -> ClientResult<Option<Vec<Variable>>> {
        self.variables(Subcommand::Rw)
    }

    fn variables(&self, subcommand: Subcommand) -> ClientResult<Option<Vec<Variable>>> {
        let entries = self
            .handle
            .with(|s| s.list(Query::new(subcommand, [&self.name])))?;
        Ok(entries.map(|entries| {
            entries
                .iter()
                .filter_map(|entry| split_name_value(entry))
                .map(|(name, _)| self.variable_handle(name))
                .collect()
        }))
    }

    /// Look a variable up by name.
    ///
    /// `Ok(None)` when the server reply does not echo the query.
    pub fn variable(&self, name: &str) -> ClientResult<Option<Variable>> {
        let reply = self
            .handle
            .with(|s| s.get(Query::new(Subcommand::Var, [self.name.as_str(), name])))?;
        Ok(reply.map(|_| self.variable_handle(name.to_string())))
    }

    /// Instant commands supported by the device (`LIST CMD`).
    pub fn command_list(&self) -> ClientResult<Option<Vec<Command>>> {
        let entries = self
            .handle
            .with(|s| s.list(Query::new(Subcommand::Cmd, [&self.name])))?;
        Ok(entries.map(|entries| {
            entries
                .into_iter()
                .map(|name| self.command_handle(name.trim().to_string()))
                .collect()
        }))
    }

    /// Look an instant command up by name, probing `GET CMDDESC`.
    ///
    /// Only an `ERR` reply is reported. A reply that does not echo the query
    /// cannot tell a missing command apart, so the handle is returned anyway.
    pub fn command(&self, name: &str) -> ClientResult<Command> {
        self.handle
            .with(|s| s.get(Query::new(Subcommand::CmdDesc, [self.name.as_str(), name])))?;
        Ok(self.command_handle(name.to_string()))
    }

    /// Addresses of the clients logged into the device (`LIST CLIENT`).
    pub fn client_list(&self) -> ClientResult<Option<Vec<String>>> {
        self.handle
            .with(|s| s.list(Query::new(Subcommand::Client, [&self.name])))
    }

    fn variable_handle(&self, name: String) -> Variable {
        Variable::new(self.name.clone(), name, self.handle.clone())
    }

    fn command_handle(&self, name: String) -> Command {
        Command::new(self.name.clone(), name, self.handle.clone())
    }
}

//! Instant commands.

use crate::client::SessionHandle;
use crate::error::ClientResult;
use nut_protocol::{expect_exact_ok, extract_quoted, Query, Request, Subcommand};

/// An instant command of a device, e.g. `test.battery.start`.
#[derive(Debug, Clone)]
pub struct Command {
    device: String,
    name: String,
    handle: SessionHandle,
}

impl Command {
    pub(crate) fn new(device: String, name: String, handle: SessionHandle) -> Self {
        Command {
            device,
            name,
            handle,
        }
    }

    /// Command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the device the command belongs to.
    pub fn device_name(&self) -> &str {
        &self.device
    }

    /// Whether the session this command came from is still connected.
    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    /// Description (`GET CMDDESC`).
    pub fn description(&self) -> ClientResult<Option<String>> {
        let reply = self
            .handle
            .with(|s| s.get(Query::new(Subcommand::CmdDesc, [&self.device, &self.name])))?;
        Ok(reply.and_then(|r| extract_quoted(&r)))
    }

    /// Execute the command (`INSTCMD`).
    ///
    /// Unlike the other mutating requests, only an exact `OK` counts as
    /// success; `OK TRACKING ...` and the like are rejected as unknown
    /// responses.
    pub fn execute(&self) -> ClientResult<()> {
        let request = Request::InstCmd {
            device: self.device.clone(),
            command: self.name.clone(),
        };
        self.handle.with(|s| {
            let reply = s.exchange(&request)?;
            expect_exact_ok(&reply, "INSTCMD")?;
            Ok(())
        })
    }
}

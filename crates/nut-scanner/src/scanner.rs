//! Running the discovery tool.

use crate::config::ScanConfig;
use crate::error::{ScanError, ScanResult};
use crate::parser::{parse_line, DiscoveredDevice};
use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};
use tracing::debug;

/// Always passed: parsable output.
const PARAM_PARSABLE: &str = "-P";
/// Always passed: no progress chatter.
const PARAM_QUIET: &str = "-q";

/// Runs the discovery tool with a [`ScanConfig`] and collects the devices it
/// reports.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Scanner { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Full argv: executable, fixed flags, scan type flags, then option flags
    /// with their values.
    pub fn command_line(&self) -> Vec<String> {
        self.arguments(false)
    }

    fn arguments(&self, redact: bool) -> Vec<String> {
        let mut args = vec![
            self.config.exec.clone(),
            PARAM_PARSABLE.to_string(),
            PARAM_QUIET.to_string(),
        ];
        args.extend(self.config.types.flags().into_iter().map(str::to_string));
        for (option, value) in self.config.options() {
            args.push(option.flag().to_string());
            if redact && option.is_secret() {
                args.push("****".to_string());
            } else {
                args.push(value);
            }
        }
        args
    }

    /// Parse discovery output, one device per line.
    ///
    /// Lines that do not parse are skipped. Invalid UTF-8 is replaced rather
    /// than rejected.
    pub fn parse_output<R: BufRead>(mut reader: R) -> ScanResult<Vec<DiscoveredDevice>> {
        let mut devices = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                continue;
            }
            match parse_line(line) {
                Some(device) => devices.push(device),
                None => debug!("skipping malformed discovery line: {}", line),
            }
        }
        Ok(devices)
    }

    /// Run the discovery tool and wait for it to finish.
    ///
    /// Blocks for as long as the scan takes; bound it with the `timeout`
    /// option.
    pub fn scan(&self) -> ScanResult<Vec<DiscoveredDevice>> {
        self.config.validate()?;

        let argv = self.command_line();
        debug!("running {}", self.arguments(true).join(" "));

        let mut command = Command::new(&argv[0]);
        command
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(dir) = self.config.working_dir.as_ref().filter(|d| d.is_dir()) {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| ScanError::Spawn {
            exec: self.config.exec.clone(),
            source,
        })?;
        let parsed = match child.stdout.take() {
            Some(stdout) => Scanner::parse_output(BufReader::new(stdout)),
            None => Ok(Vec::new()),
        };
        let status = child.wait()?;
        let devices = parsed?;

        if !status.success() {
            return Err(ScanError::Failed { status });
        }
        debug!("discovered {} device(s)", devices.len());
        Ok(devices)
    }
}

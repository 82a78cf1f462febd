//! Settings file and command line merging.

use crate::commands::{ScanArgs, ServerArgs};
use anyhow::Context;
use nut_client::ClientConfig;
use nut_scanner::{ScanConfig, ScanTypes};
use serde::Deserialize;
use std::path::Path;

/// Contents of the YAML settings file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub client: ClientConfig,
    pub scan: ScanConfig,
}

impl Settings {
    /// Load settings from `path`, or defaults if no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Settings> {
        let Some(path) = path else {
            return Ok(Settings::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Settings::from_yaml(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Settings> {
        let settings: Settings = serde_yaml::from_str(text)?;
        settings.scan.validate()?;
        Ok(settings)
    }

    /// Client parameters with command line overrides applied.
    pub fn client_config(&self, args: &ServerArgs) -> ClientConfig {
        let mut config = self.client.clone();
        if let Some(host) = &args.host {
            config.host = host.clone();
        }
        if let Some(port) = args.port {
            config.port = port;
        }
        if args.login.is_some() {
            config.login = args.login.clone();
        }
        if args.password.is_some() {
            config.password = args.password.clone();
        }
        config
    }

    /// Scan parameters with command line overrides applied, validated.
    pub fn scan_config(&self, args: &ScanArgs) -> anyhow::Result<ScanConfig> {
        let mut config = self.scan.clone();
        if !args.types.is_empty() {
            config.types = args.types.iter().copied().collect::<ScanTypes>();
        }
        if let Some(exec) = &args.exec {
            config.exec = exec.clone();
        }
        if args.timeout.is_some() {
            config.timeout = args.timeout;
        }
        if args.start_ip.is_some() {
            config.start_ip = args.start_ip;
        }
        if args.end_ip.is_some() {
            config.end_ip = args.end_ip;
        }
        if args.cidr.is_some() {
            config.mask_cidr = args.cidr.clone();
        }
        if args.community.is_some() {
            config.community = args.community.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

//! Scan configuration.
//!
//! This module provides:
//! - [`ScanType`] / [`ScanTypes`] - Which buses to probe
//! - [`ScanOption`] and [`OPTION_FLAGS`] - Value-bearing options and their flags
//! - [`ScanConfig`] / [`ScanConfigBuilder`] - Validated parameters of one scan
//!
//! ## YAML Form
//!
//! ```yaml
//! exec: /usr/bin/nut-scanner
//! types: [snmp, xml]
//! timeout: 5
//! start_ip: 192.168.1.1
//! end_ip: 192.168.1.254
//! community: public
//! ```

use crate::error::{ScanError, ScanResult};
use serde::{Deserialize, Deserializer};
use std::net::IpAddr;
use std::ops::{BitOr, BitOrAssign};
use std::path::PathBuf;
use std::str::FromStr;

/// Default name of the discovery executable.
pub const DEFAULT_SCANNER_EXEC: &str = "nut-scanner";

// ============================================================================
// Scan Types
// ============================================================================

/// A bus or protocol the discovery tool can probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanType {
    Usb,
    Snmp,
    /// XML/HTTP (network management cards).
    Xml,
    /// Other NUT servers.
    OldNut,
    Avahi,
    Ipmi,
    /// Everything the tool supports.
    Complete,
}

impl ScanType {
    /// All specific types, in flag order.
    pub const SPECIFIC: [ScanType; 6] = [
        ScanType::Usb,
        ScanType::Snmp,
        ScanType::Xml,
        ScanType::OldNut,
        ScanType::Avahi,
        ScanType::Ipmi,
    ];

    /// Command line flag selecting this type.
    pub fn flag(self) -> &'static str {
        match self {
            ScanType::Usb => "-U",
            ScanType::Snmp => "-S",
            ScanType::Xml => "-M",
            ScanType::OldNut => "-O",
            ScanType::Avahi => "-A",
            ScanType::Ipmi => "-I",
            ScanType::Complete => "-C",
        }
    }

    /// Configuration name of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            ScanType::Usb => "usb",
            ScanType::Snmp => "snmp",
            ScanType::Xml => "xml",
            ScanType::OldNut => "oldnut",
            ScanType::Avahi => "avahi",
            ScanType::Ipmi => "ipmi",
            ScanType::Complete => "complete",
        }
    }

    fn bits(self) -> u8 {
        match self {
            ScanType::Usb => 1,
            ScanType::Snmp => 1 << 1,
            ScanType::Xml => 1 << 2,
            ScanType::OldNut => 1 << 3,
            ScanType::Avahi => 1 << 4,
            ScanType::Ipmi => 1 << 5,
            ScanType::Complete => u8::MAX,
        }
    }
}

impl FromStr for ScanType {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "usb" => Ok(ScanType::Usb),
            "snmp" => Ok(ScanType::Snmp),
            "xml" | "http" => Ok(ScanType::Xml),
            "oldnut" | "nut" => Ok(ScanType::OldNut),
            "avahi" => Ok(ScanType::Avahi),
            "ipmi" => Ok(ScanType::Ipmi),
            "complete" | "all" => Ok(ScanType::Complete),
            other => Err(ScanError::InvalidConfig(format!("unknown scan type: {}", other))),
        }
    }
}

impl std::fmt::Display for ScanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of [`ScanType`]s.
///
/// [`ScanTypes::COMPLETE`] absorbs every other type: a complete scan is
/// requested with `-C` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTypes(u8);

impl ScanTypes {
    /// No type selected.
    pub const NONE: ScanTypes = ScanTypes(0);
    /// Complete scan.
    pub const COMPLETE: ScanTypes = ScanTypes(u8::MAX);

    /// Whether no type is selected.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether this is a complete scan.
    pub fn is_complete(self) -> bool {
        self == ScanTypes::COMPLETE
    }

    /// Whether `scan_type` is part of the set.
    pub fn contains(self, scan_type: ScanType) -> bool {
        let bits = scan_type.bits();
        self.0 & bits == bits
    }

    /// Flags selecting these types.
    pub fn flags(self) -> Vec<&'static str> {
        if self.is_complete() {
            return vec![ScanType::Complete.flag()];
        }
        ScanType::SPECIFIC
            .iter()
            .filter(|t| self.contains(**t))
            .map(|t| t.flag())
            .collect()
    }
}

impl Default for ScanTypes {
    fn default() -> Self {
        ScanTypes::COMPLETE
    }
}

impl From<ScanType> for ScanTypes {
    fn from(scan_type: ScanType) -> Self {
        ScanTypes(scan_type.bits())
    }
}

impl FromIterator<ScanType> for ScanTypes {
    fn from_iter<I: IntoIterator<Item = ScanType>>(iter: I) -> Self {
        iter.into_iter().fold(ScanTypes::NONE, |acc, t| acc | t)
    }
}

impl<T: Into<ScanTypes>> BitOr<T> for ScanTypes {
    type Output = ScanTypes;

    fn bitor(self, rhs: T) -> ScanTypes {
        ScanTypes(self.0 | rhs.into().0)
    }
}

impl<T: Into<ScanTypes>> BitOrAssign<T> for ScanTypes {
    fn bitor_assign(&mut self, rhs: T) {
        self.0 |= rhs.into().0;
    }
}

impl BitOr for ScanType {
    type Output = ScanTypes;

    fn bitor(self, rhs: ScanType) -> ScanTypes {
        ScanTypes::from(self) | rhs
    }
}

impl<'de> Deserialize<'de> for ScanTypes {
    /// Accepts a single name (`complete`) or a list of names (`[usb, snmp]`).
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<String>),
        }

        let names = match Raw::deserialize(deserializer)? {
            Raw::One(name) => vec![name],
            Raw::Many(names) => names,
        };
        names
            .iter()
            .map(|name| name.parse::<ScanType>())
            .collect::<Result<ScanTypes, _>>()
            .map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Option Flags
// ============================================================================

/// A value-bearing option of the discovery tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanOption {
    /// Network timeout in seconds.
    Timeout,
    StartIp,
    EndIp,
    /// Network in `addr/prefix` notation.
    MaskCidr,
    /// SNMPv1 community.
    Community,
    /// SNMPv3 security level.
    SecurityLevel,
    /// SNMPv3 security name.
    SecurityName,
    /// SNMPv3 authentication protocol.
    AuthProtocol,
    /// SNMPv3 authentication password.
    AuthPassword,
    /// SNMPv3 privacy protocol.
    PrivProtocol,
    /// SNMPv3 privacy password.
    PrivPassword,
    /// Port of remote NUT servers.
    UpsdPort,
}

/// Option → flag table, in the order flags are emitted.
pub const OPTION_FLAGS: [(ScanOption, &str); 12] = [
    (ScanOption::Timeout, "-t"),
    (ScanOption::StartIp, "-s"),
    (ScanOption::EndIp, "-e"),
    (ScanOption::MaskCidr, "-m"),
    (ScanOption::Community, "-c"),
    (ScanOption::SecurityLevel, "-l"),
    (ScanOption::SecurityName, "-u"),
    (ScanOption::AuthProtocol, "-a"),
    (ScanOption::AuthPassword, "-A"),
    (ScanOption::PrivProtocol, "-x"),
    (ScanOption::PrivPassword, "-X"),
    (ScanOption::UpsdPort, "-p"),
];

impl ScanOption {
    /// Command line flag of this option.
    pub fn flag(self) -> &'static str {
        OPTION_FLAGS
            .iter()
            .find(|(option, _)| *option == self)
            .map(|(_, flag)| *flag)
            .unwrap_or_default()
    }

    /// Whether the value must be kept out of logs.
    pub fn is_secret(self) -> bool {
        matches!(self, ScanOption::AuthPassword | ScanOption::PrivPassword)
    }
}

/// SNMPv3 security level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SecurityLevel {
    #[serde(rename = "noAuthNoPriv")]
    NoAuthNoPriv,
    #[serde(rename = "authNoPriv")]
    AuthNoPriv,
    #[serde(rename = "authPriv")]
    AuthPriv,
}

impl SecurityLevel {
    /// Value passed to the discovery tool.
    pub fn as_str(self) -> &'static str {
        match self {
            SecurityLevel::NoAuthNoPriv => "noAuthNoPriv",
            SecurityLevel::AuthNoPriv => "authNoPriv",
            SecurityLevel::AuthPriv => "authPriv",
        }
    }
}

impl FromStr for SecurityLevel {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "noAuthNoPriv" => Ok(SecurityLevel::NoAuthNoPriv),
            "authNoPriv" => Ok(SecurityLevel::AuthNoPriv),
            "authPriv" => Ok(SecurityLevel::AuthPriv),
            other => Err(ScanError::InvalidConfig(format!(
                "unknown SNMPv3 security level: {}",
                other
            ))),
        }
    }
}

// ============================================================================
// Scan Config
// ============================================================================

/// Parameters of one scan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Discovery executable, optionally with a path.
    pub exec: String,
    /// Directory the executable is started in. Ignored if it does not exist.
    pub working_dir: Option<PathBuf>,
    /// Buses to probe.
    pub types: ScanTypes,
    /// Network timeout in seconds.
    pub timeout: Option<u32>,
    pub start_ip: Option<IpAddr>,
    pub end_ip: Option<IpAddr>,
    /// Network to probe, `addr/prefix`.
    pub mask_cidr: Option<String>,
    pub community: Option<String>,
    pub security_level: Option<SecurityLevel>,
    pub security_name: Option<String>,
    pub auth_protocol: Option<String>,
    pub auth_password: Option<String>,
    pub priv_protocol: Option<String>,
    pub priv_password: Option<String>,
    /// Port probed on remote NUT servers.
    pub upsd_port: Option<u16>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            exec: DEFAULT_SCANNER_EXEC.to_string(),
            working_dir: None,
            types: ScanTypes::default(),
            timeout: None,
            start_ip: None,
            end_ip: None,
            mask_cidr: None,
            community: None,
            security_level: None,
            security_name: None,
            auth_protocol: None,
            auth_password: None,
            priv_protocol: None,
            priv_password: None,
            upsd_port: None,
        }
    }
}

impl ScanConfig {
    /// Start building a configuration.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Value of an option, as passed on the command line.
    pub fn option(&self, option: ScanOption) -> Option<String> {
        match option {
            ScanOption::Timeout => self.timeout.map(|t| t.to_string()),
            ScanOption::StartIp => self.start_ip.map(|ip| ip.to_string()),
            ScanOption::EndIp => self.end_ip.map(|ip| ip.to_string()),
            ScanOption::MaskCidr => self.mask_cidr.clone(),
            ScanOption::Community => self.community.clone(),
            ScanOption::SecurityLevel => self.security_level.map(|l| l.as_str().to_string()),
            ScanOption::SecurityName => self.security_name.clone(),
            ScanOption::AuthProtocol => self.auth_protocol.clone(),
            ScanOption::AuthPassword => self.auth_password.clone(),
            ScanOption::PrivProtocol => self.priv_protocol.clone(),
            ScanOption::PrivPassword => self.priv_password.clone(),
            ScanOption::UpsdPort => self.upsd_port.map(|p| p.to_string()),
        }
    }

    /// Set options with their values, in [`OPTION_FLAGS`] order.
    pub fn options(&self) -> Vec<(ScanOption, String)> {
        OPTION_FLAGS
            .iter()
            .filter_map(|(option, _)| self.option(*option).map(|value| (*option, value)))
            .collect()
    }

    /// Check the configuration for consistency.
    pub fn validate(&self) -> ScanResult<()> {
        if self.exec.trim().is_empty() {
            return Err(invalid("scanner executable is empty"));
        }
        if self.types.is_empty() {
            return Err(invalid("no scan type selected"));
        }
        if self.timeout == Some(0) {
            return Err(invalid("timeout must be positive"));
        }
        if self.upsd_port == Some(0) {
            return Err(invalid("upsd port must be non-zero"));
        }
        match (self.start_ip, self.end_ip) {
            (None, Some(_)) => return Err(invalid("end IP given without start IP")),
            (Some(start), Some(end)) => {
                if start.is_ipv4() != end.is_ipv4() {
                    return Err(invalid(format!(
                        "start IP {} and end IP {} are of different families",
                        start, end
                    )));
                }
                if start > end {
                    return Err(invalid(format!("start IP {} is after end IP {}", start, end)));
                }
            }
            _ => {}
        }
        if let Some(cidr) = &self.mask_cidr {
            parse_cidr(cidr)?;
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ScanError {
    ScanError::InvalidConfig(message.into())
}

/// Parse `addr/prefix` and check the prefix against the address family.
pub fn parse_cidr(cidr: &str) -> ScanResult<(IpAddr, u8)> {
    let (addr, prefix) = cidr
        .split_once('/')
        .ok_or_else(|| invalid(format!("CIDR {} lacks a /prefix", cidr)))?;
    let addr: IpAddr = addr
        .parse()
        .map_err(|_| invalid(format!("CIDR {} has an invalid address", cidr)))?;
    let prefix: u8 = prefix
        .parse()
        .map_err(|_| invalid(format!("CIDR {} has an invalid prefix", cidr)))?;
    let max = if addr.is_ipv4() { 32 } else { 128 };
    if prefix > max {
        return Err(invalid(format!("CIDR prefix /{} exceeds /{}", prefix, max)));
    }
    Ok((addr, prefix))
}

/// Builder for [`ScanConfig`]; [`build`](Self::build) validates.
#[derive(Debug, Clone, Default)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
    types: Option<ScanTypes>,
}

impl ScanConfigBuilder {
    /// Discovery executable.
    pub fn exec(mut self, exec: impl Into<String>) -> Self {
        self.config.exec = exec.into();
        self
    }

    /// Directory the executable is started in.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.working_dir = Some(dir.into());
        self
    }

    /// Add a bus to probe. Without any, a complete scan is done.
    pub fn scan(mut self, types: impl Into<ScanTypes>) -> Self {
        let types = types.into();
        self.types = Some(self.types.map_or(types, |t| t | types));
        self
    }

    pub fn timeout(mut self, seconds: u32) -> Self {
        self.config.timeout = Some(seconds);
        self
    }

    /// Address range to probe.
    pub fn ip_range(mut self, start: IpAddr, end: Option<IpAddr>) -> Self {
        self.config.start_ip = Some(start);
        self.config.end_ip = end;
        self
    }

    pub fn mask_cidr(mut self, cidr: impl Into<String>) -> Self {
        self.config.mask_cidr = Some(cidr.into());
        self
    }

    pub fn community(mut self, community: impl Into<String>) -> Self {
        self.config.community = Some(community.into());
        self
    }

    /// SNMPv3 security level and name.
    pub fn snmp_v3(mut self, level: SecurityLevel, name: impl Into<String>) -> Self {
        self.config.security_level = Some(level);
        self.config.security_name = Some(name.into());
        self
    }

    /// SNMPv3 authentication protocol and password.
    pub fn auth(mut self, protocol: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.auth_protocol = Some(protocol.into());
        self.config.auth_password = Some(password.into());
        self
    }

    /// SNMPv3 privacy protocol and password.
    pub fn privacy(mut self, protocol: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.priv_protocol = Some(protocol.into());
        self.config.priv_password = Some(password.into());
        self
    }

    pub fn upsd_port(mut self, port: u16) -> Self {
        self.config.upsd_port = Some(port);
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> ScanResult<ScanConfig> {
        let mut config = self.config;
        config.types = self.types.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_type_flags() {
        assert_eq!(ScanTypes::from(ScanType::Usb).flags(), vec!["-U"]);
        assert_eq!((ScanType::Snmp | ScanType::Xml).flags(), vec!["-S", "-M"]);
        assert_eq!(
            (ScanType::Ipmi | ScanType::Usb | ScanType::Avahi | ScanType::OldNut).flags(),
            vec!["-U", "-O", "-A", "-I"]
        );
        assert_eq!(ScanTypes::COMPLETE.flags(), vec!["-C"]);
        assert!(ScanTypes::NONE.flags().is_empty());
    }

    #[test]
    fn test_complete_absorbs_specific_types() {
        let types = ScanType::Usb | ScanType::Complete;
        assert!(types.is_complete());
        assert_eq!(types.flags(), vec!["-C"]);

        let all: ScanTypes = ScanType::SPECIFIC.into_iter().collect();
        assert!(!all.is_complete());
        assert_eq!(all.flags().len(), 6);
    }

    #[test]
    fn test_option_flag_table() {
        let flags: Vec<&str> = OPTION_FLAGS.iter().map(|(_, f)| *f).collect();
        assert_eq!(
            flags,
            vec!["-t", "-s", "-e", "-m", "-c", "-l", "-u", "-a", "-A", "-x", "-X", "-p"]
        );
        assert_eq!(ScanOption::PrivPassword.flag(), "-X");
        assert!(ScanOption::AuthPassword.is_secret());
        assert!(!ScanOption::Community.is_secret());
    }

    #[test]
    fn test_builder_defaults_to_complete() {
        let config = ScanConfig::builder().build().unwrap();
        assert!(config.types.is_complete());
        assert_eq!(config.exec, DEFAULT_SCANNER_EXEC);
        assert!(config.options().is_empty());
    }

    #[test]
    fn test_builder_options_in_table_order() {
        let config = ScanConfig::builder()
            .scan(ScanType::Snmp)
            .upsd_port(3493)
            .community("public")
            .ip_range("10.0.0.1".parse().unwrap(), Some("10.0.0.9".parse().unwrap()))
            .timeout(5)
            .build()
            .unwrap();
        let options: Vec<(ScanOption, String)> = config.options();
        assert_eq!(
            options,
            vec![
                (ScanOption::Timeout, "5".to_string()),
                (ScanOption::StartIp, "10.0.0.1".to_string()),
                (ScanOption::EndIp, "10.0.0.9".to_string()),
                (ScanOption::Community, "public".to_string()),
                (ScanOption::UpsdPort, "3493".to_string()),
            ]
        );
    }

    #[test]
    fn test_validation() {
        let ip = |s: &str| s.parse::<IpAddr>().unwrap();

        let err = ScanConfig::builder()
            .ip_range(ip("10.0.0.9"), Some(ip("10.0.0.1")))
            .build();
        assert!(matches!(err, Err(ScanError::InvalidConfig(_))));

        let err = ScanConfig::builder()
            .ip_range(ip("10.0.0.1"), Some(ip("::1")))
            .build();
        assert!(matches!(err, Err(ScanError::InvalidConfig(_))));

        assert!(ScanConfig::builder().timeout(0).build().is_err());
        assert!(ScanConfig::builder().upsd_port(0).build().is_err());
        assert!(ScanConfig::builder().exec(" ").build().is_err());
        assert!(ScanConfig::builder().mask_cidr("10.0.0.0/33").build().is_err());
        assert!(ScanConfig::builder().mask_cidr("10.0.0.0").build().is_err());
        assert!(ScanConfig::builder().mask_cidr("fd00::/64").build().is_ok());

        let config = ScanConfig {
            end_ip: Some(ip("10.0.0.1")),
            ..ScanConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ScanConfig {
            types: ScanTypes::NONE,
            ..ScanConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_cidr() {
        let (addr, prefix) = parse_cidr("192.168.0.0/24").unwrap();
        assert_eq!(addr, "192.168.0.0".parse::<IpAddr>().unwrap());
        assert_eq!(prefix, 24);
        assert!(parse_cidr("192.168.0.0/x").is_err());
        assert!(parse_cidr("nope/24").is_err());
    }

    #[test]
    fn test_scan_type_from_str() {
        assert_eq!("SNMP".parse::<ScanType>().unwrap(), ScanType::Snmp);
        assert_eq!("all".parse::<ScanType>().unwrap(), ScanType::Complete);
        assert!("serial".parse::<ScanType>().is_err());
    }

    #[test]
    fn test_deserialize_yaml() {
        let config: ScanConfig = serde_yaml::from_str(
            "exec: /opt/nut/bin/nut-scanner\n\
             types: [snmp, xml]\n\
             timeout: 5\n\
             start_ip: 192.168.1.1\n\
             end_ip: 192.168.1.254\n\
             security_level: authPriv\n",
        )
        .unwrap();
        assert_eq!(config.exec, "/opt/nut/bin/nut-scanner");
        assert_eq!(config.types, ScanType::Snmp | ScanType::Xml);
        assert_eq!(config.timeout, Some(5));
        assert_eq!(config.security_level, Some(SecurityLevel::AuthPriv));
        config.validate().unwrap();

        let config: ScanConfig = serde_yaml::from_str("types: complete\n").unwrap();
        assert!(config.types.is_complete());

        assert!(serde_yaml::from_str::<ScanConfig>("types: [floppy]\n").is_err());
        assert!(serde_yaml::from_str::<ScanConfig>("colour: blue\n").is_err());
    }
}

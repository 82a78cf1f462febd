//! Device discovery through the NUT `nut-scanner` tool.
//!
//! The tool is run as a child process in parsable mode (`-P`). Each line of
//! its standard output describes one device and is decoded by
//! [`parse_line`]:
//!
//! ```rust
//! use nut_scanner::parse_line;
//!
//! let device = parse_line("USB:driver=\"usbhid-ups\",port=\"auto\"").unwrap();
//! assert_eq!(device.driver(), "USB");
//! assert_eq!(device.property("driver"), Some("usbhid-ups"));
//! ```
//!
//! Lines that do not parse are dropped; they never abort a scan.

mod config;
mod error;
mod parser;
mod scanner;

pub use config::{
    parse_cidr, ScanConfig, ScanConfigBuilder, ScanOption, ScanType, ScanTypes, SecurityLevel,
    DEFAULT_SCANNER_EXEC, OPTION_FLAGS,
};
pub use error::{ScanError, ScanResult};
pub use parser::{parse_line, DiscoveredDevice};
pub use scanner::Scanner;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use nut_scanner::ScanType;
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nutc")]
#[command(about = "Query NUT servers and discover power devices.")]
#[command(version)]
pub struct CommandLine {
    /// YAML file with `client:` and `scan:` sections
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub server: ServerArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection flags; each one overrides the config file.
#[derive(Args, Debug, Default)]
pub struct ServerArgs {
    /// Server host
    #[arg(short = 'H', long, global = true)]
    pub host: Option<String>,

    /// Server port
    #[arg(short = 'p', long, global = true)]
    pub port: Option<u16>,

    /// User name
    #[arg(short = 'u', long, global = true)]
    pub login: Option<String>,

    /// Password (prefer the config file or NUT_PASSWORD)
    #[arg(long, env = "NUT_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dump every device with its variables and commands
    #[command(alias = "l")]
    List,
    /// Read one variable
    #[command(alias = "g")]
    Get { device: String, variable: String },
    /// Change a writable variable
    Set {
        device: String,
        variable: String,
        value: String,
    },
    /// Run an instant command
    Cmd { device: String, command: String },
    /// Show server and protocol versions
    Version,
    /// Discover devices with nut-scanner
    #[command(alias = "s")]
    Scan(ScanArgs),
}

#[derive(Args, Debug, Default)]
pub struct ScanArgs {
    /// Bus to probe; repeat for several (default: complete scan)
    #[arg(short = 't', long = "type", value_parser = parse_scan_type)]
    pub types: Vec<ScanType>,

    /// nut-scanner executable
    #[arg(long)]
    pub exec: Option<String>,

    /// Network timeout in seconds
    #[arg(long)]
    pub timeout: Option<u32>,

    /// First address of the range to probe
    #[arg(long)]
    pub start_ip: Option<IpAddr>,

    /// Last address of the range to probe
    #[arg(long)]
    pub end_ip: Option<IpAddr>,

    /// Network to probe, addr/prefix
    #[arg(long)]
    pub cidr: Option<String>,

    /// SNMPv1 community
    #[arg(long)]
    pub community: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn parse_scan_type(s: &str) -> Result<ScanType, String> {
    s.parse().map_err(|e: nut_scanner::ScanError| e.to_string())
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

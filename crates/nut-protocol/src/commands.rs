//! Requests that can be sent to a NUT server.
//!
//! The server understands several categories of requests:
//! - Session setup (`USERNAME`, `PASSWORD`, `LOGOUT`)
//! - Single-value reads (`GET <subcommand> ...`)
//! - Multi-line reads (`LIST <subcommand> ...`)
//! - Mutating commands (`SET VAR`, `LOGIN`, `MASTER`, `FSD`, `INSTCMD`)

use crate::codec::LineCodec;
use crate::quoting::quote;

/// Subcommands used with `GET` and `LIST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcommand {
    /// Device list (`UPS`)
    Ups,
    /// Device description (`UPSDESC`)
    UpsDesc,
    /// Number of clients logged into a device (`NUMLOGINS`)
    NumLogins,
    /// Variable value, or list of variables (`VAR`)
    Var,
    /// Writable variables (`RW`)
    Rw,
    /// Instant commands (`CMD`)
    Cmd,
    /// Instant command description (`CMDDESC`)
    CmdDesc,
    /// Variable description (`DESC`)
    Desc,
    /// Variable type (`TYPE`)
    Type,
    /// Accepted values of an enumerated variable (`ENUM`)
    Enum,
    /// Accepted ranges of a variable (`RANGE`)
    Range,
    /// Clients logged into a device (`CLIENT`)
    Client,
}

impl Subcommand {
    /// Get the subcommand string used in requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Subcommand::Ups => "UPS",
            Subcommand::UpsDesc => "UPSDESC",
            Subcommand::NumLogins => "NUMLOGINS",
            Subcommand::Var => "VAR",
            Subcommand::Rw => "RW",
            Subcommand::Cmd => "CMD",
            Subcommand::CmdDesc => "CMDDESC",
            Subcommand::Desc => "DESC",
            Subcommand::Type => "TYPE",
            Subcommand::Enum => "ENUM",
            Subcommand::Range => "RANGE",
            Subcommand::Client => "CLIENT",
        }
    }
}

impl std::fmt::Display for Subcommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The target of a `GET` or `LIST`: a subcommand followed by its arguments.
///
/// The server echoes this text at the start of every reply line, so it is
/// also what replies are matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
}

impl Query {
    /// Build a query from a typed subcommand.
    pub fn new<I, S>(subcommand: Subcommand, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Query::raw(subcommand.as_str(), args)
    }

    /// Build a query from a free-form subcommand.
    pub fn raw<I, S>(subcommand: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Query {
            text: join_words(subcommand, args),
        }
    }

    /// The subcommand and arguments joined with single spaces.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Prefix every data line of a reply starts with (`"<query> "`).
    pub fn reply_prefix(&self) -> String {
        format!("{} ", self.text)
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Join a head word and its arguments with single spaces.
pub fn join_words<I, S>(head: &str, args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = head.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg.as_ref());
    }
    line
}

/// Requests that can be sent to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    // ========== Session ==========
    /// Set the user name for this connection.
    Username(String),

    /// Set the password for this connection.
    Password(String),

    /// Close the session.
    Logout,

    /// Ask for the server version.
    Version,

    /// Ask for the network protocol version.
    NetVersion,

    // ========== Reads ==========
    /// Read a single value.
    Get(Query),

    /// Read a multi-line list.
    List(Query),

    // ========== Mutations ==========
    /// Set a writable variable.
    SetVar {
        /// Device name.
        device: String,
        /// Variable name.
        name: String,
        /// New value (unescaped).
        value: String,
    },

    /// Log into a device.
    Login {
        /// Device name.
        device: String,
    },

    /// Take primary (master) control of a device.
    Master {
        /// Device name.
        device: String,
    },

    /// Set the forced shutdown flag of a device.
    Fsd {
        /// Device name.
        device: String,
    },

    /// Execute an instant command.
    InstCmd {
        /// Device name.
        device: String,
        /// Command name.
        command: String,
    },

    // ========== Raw ==========
    /// A free-form request: a command word followed by arguments.
    Raw {
        /// The command word.
        command: String,
        /// Arguments, joined with single spaces.
        args: Vec<String>,
    },
}

impl Request {
    /// Encode the request as a line to send to the server.
    /// Returns the bytes to send (including the `\n` terminator).
    pub fn encode(&self) -> Vec<u8> {
        LineCodec::encode_line(&self.to_line())
    }

    /// Get the request line without the terminator.
    pub fn to_line(&self) -> String {
        match self {
            Request::Username(login) => format!("USERNAME {}", login),
            Request::Password(password) => format!("PASSWORD {}", password),
            Request::Logout => "LOGOUT".to_string(),
            Request::Version => "VER".to_string(),
            Request::NetVersion => "NETVER".to_string(),

            Request::Get(query) => format!("GET {}", query),
            Request::List(query) => format!("LIST {}", query),

            Request::SetVar { device, name, value } => {
                format!("SET VAR {} {} {}", device, name, quote(value))
            }
            Request::Login { device } => format!("LOGIN {}", device),
            Request::Master { device } => format!("MASTER {}", device),
            Request::Fsd { device } => format!("FSD {}", device),
            Request::InstCmd { device, command } => format!("INSTCMD {} {}", device, command),

            Request::Raw { command, args } => join_words(command, args),
        }
    }

    /// Line suitable for logs: secrets are masked.
    pub fn redacted_line(&self) -> String {
        match self {
            Request::Password(_) => "PASSWORD ****".to_string(),
            other => other.to_line(),
        }
    }
}

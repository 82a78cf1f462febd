//! NUT Network Protocol
//!
//! This crate provides the wire layer for talking to a NUT (Network UPS Tools)
//! server (`upsd`). It performs no I/O: transports feed bytes into the
//! [`LineCodec`] and hand complete lines to the parsing helpers here.
//!
//! # Protocol Overview
//!
//! The protocol is a simple line-based text interface:
//!
//! - **Requests** (client → server): one text line terminated with `\n`
//! - **Replies** (server → client): one line, or for `LIST` a block framed by
//!   `BEGIN LIST <query>` and `END LIST <query>` sentinel lines
//! - **Errors**: any reply starting with `ERR ` carries an error code and an
//!   optional detail
//!
//! Values travel as quoted strings (`"..."`) where `\"` and `\\` are the only
//! escape sequences; see [`escape`] and [`extract_quoted`].
//!
//! # Example
//!
//! ```rust
//! use nut_protocol::{ListDecoder, ListStep, Query, Request, Subcommand};
//!
//! let query = Query::new(Subcommand::Ups, Vec::<String>::new());
//! assert_eq!(Request::List(query.clone()).to_line(), "LIST UPS");
//!
//! let mut list = ListDecoder::begin(&query, "BEGIN LIST UPS").unwrap();
//! assert_eq!(list.feed("UPS ups1 \"desc1\""), ListStep::Continue);
//! assert_eq!(
//!     list.feed("END LIST UPS"),
//!     ListStep::Done(vec!["ups1 \"desc1\"".to_string()])
//! );
//! ```

mod codec;
mod commands;
mod error;
mod quoting;
mod responses;

pub use codec::*;
pub use commands::*;
pub use error::*;
pub use quoting::*;
pub use responses::*;

/// Default TCP port of a NUT server.
pub const DEFAULT_PORT: u16 = 3493;

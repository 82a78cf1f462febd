//! Shared helpers for the client integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use nut_client::{Client, ClientConfig, LineTransport};

/// In-memory transport that replays canned server lines and records what
/// the client wrote.
pub struct ScriptedTransport {
    replies: VecDeque<String>,
    sent: Rc<RefCell<Vec<String>>>,
    open: bool,
}

impl ScriptedTransport {
    pub fn new(replies: &[&str]) -> (Self, Rc<RefCell<Vec<String>>>) {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let transport = ScriptedTransport {
            replies: replies.iter().map(|s| s.to_string()).collect(),
            sent: sent.clone(),
            open: true,
        };
        (transport, sent)
    }
}

impl LineTransport for ScriptedTransport {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.sent.borrow_mut().push(line.to_string());
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.replies.pop_front())
    }

    fn is_connected(&self) -> bool {
        self.open
    }

    fn close(&mut self) -> io::Result<()> {
        self.open = false;
        Ok(())
    }
}

/// Connect an anonymous client to a scripted server.
pub fn scripted_client(replies: &[&str]) -> (Client, Rc<RefCell<Vec<String>>>) {
    scripted_client_with(ClientConfig::default(), replies)
}

/// Connect a client with the given configuration to a scripted server.
pub fn scripted_client_with(
    config: ClientConfig,
    replies: &[&str],
) -> (Client, Rc<RefCell<Vec<String>>>) {
    let mut client = Client::with_config(config);
    let (transport, sent) = ScriptedTransport::new(replies);
    client
        .connect_transport(Box::new(transport))
        .expect("scripted connect failed");
    (client, sent)
}

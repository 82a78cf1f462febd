//! Protocol session with a NUT server.
//!
//! A [`Client`] owns exactly one transport. Devices, variables and commands
//! obtained from it hold a non-owning [`SessionHandle`]; once the client
//! disconnects (or reconnects) those handles report
//! [`ClientError::SessionExpired`] instead of talking to the wrong session.
//!
//! All calls are blocking and single-threaded: one request line out, then one
//! reply line (or one framed `LIST` block) back. There are no timeouts,
//! retries or keep-alives; wrap the transport if you need them.

use crate::device::Device;
use crate::error::{AuthPhase, ClientError, ClientResult};
use crate::transport::{LineTransport, TcpLineTransport};
use nut_protocol::{
    check_error, expect_ok, split_name_value, strip_echo, ErrorCode, ListDecoder, ListStep,
    ProtocolError, Query, Request, Subcommand, DEFAULT_PORT,
};
use serde::Deserialize;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, trace, warn};

/// Connection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Host name or address of the server.
    pub host: String,
    /// TCP port of the server.
    pub port: u16,
    /// User name sent with `USERNAME`, if any.
    pub login: Option<String>,
    /// Password sent with `PASSWORD`, if any.
    pub password: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            login: None,
            password: None,
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Connection state shared between a client and its handles.
pub(crate) struct Session {
    transport: Option<Box<dyn LineTransport>>,
    /// Bumped on every new connection so stale handles can be told apart.
    generation: u64,
}

impl Session {
    fn new() -> Self {
        Session {
            transport: None,
            generation: 0,
        }
    }

    fn is_connected(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| t.is_connected())
    }

    fn transport(&mut self) -> ClientResult<&mut Box<dyn LineTransport>> {
        match self.transport.as_mut() {
            Some(transport) if transport.is_connected() => Ok(transport),
            _ => Err(ClientError::NotConnected),
        }
    }

    fn send(&mut self, request: &Request) -> ClientResult<()> {
        trace!("-> {}", request.redacted_line());
        self.transport()?.write_line(&request.to_line())?;
        Ok(())
    }

    /// Read one reply line and fail if it is an `ERR` line.
    fn receive(&mut self) -> ClientResult<String> {
        let line = self
            .transport()?
            .read_line()?
            .ok_or(ClientError::ConnectionClosed)?;
        trace!("<- {}", line);
        check_error(&line)?;
        Ok(line)
    }

    /// Send a request and read its single-line reply.
    pub(crate) fn exchange(&mut self, request: &Request) -> ClientResult<String> {
        self.send(request)?;
        self.receive()
    }

    /// Send a request and require a reply starting with `OK`.
    pub(crate) fn command(&mut self, request: &Request, context: &str) -> ClientResult<()> {
        let line = self.exchange(request)?;
        expect_ok(&line, context)?;
        Ok(())
    }

    pub(crate) fn get(&mut self, query: Query) -> ClientResult<Option<String>> {
        let line = self.exchange(&Request::Get(query.clone()))?;
        let value = strip_echo(&query, &line).map(str::to_string);
        if value.is_none() {
            debug!("GET {}: reply does not echo the query: {}", query, line);
        }
        Ok(value)
    }

    pub(crate) fn list(&mut self, query: Query) -> ClientResult<Option<Vec<String>>> {
        let first = self.exchange(&Request::List(query.clone()))?;
        let mut decoder = match ListDecoder::begin(&query, &first) {
            Some(decoder) => decoder,
            None => {
                debug!("LIST {}: unexpected first line: {}", query, first);
                return Ok(None);
            }
        };
        loop {
            let line = self.receive()?;
            match decoder.feed(&line) {
                ListStep::Continue => {}
                ListStep::Done(items) => return Ok(Some(items)),
                ListStep::Mismatch => {
                    debug!("LIST {}: unexpected terminator: {}", query, line);
                    return Ok(None);
                }
            }
        }
    }

    fn authenticate(&mut self, phase: AuthPhase, request: &Request) -> ClientResult<()> {
        let line = self.exchange(request).map_err(|e| match e {
            ClientError::Protocol(source) => ClientError::Authentication { phase, source },
            other => other,
        })?;
        expect_ok(&line, phase.as_str())
            .map_err(|source| ClientError::Authentication { phase, source })
    }

    fn close(&mut self, farewell: bool) {
        if let Some(mut transport) = self.transport.take() {
            if farewell && transport.is_connected() {
                trace!("-> {}", Request::Logout.to_line());
                if let Err(e) = transport.write_line(&Request::Logout.to_line()) {
                    warn!("failed to send LOGOUT: {}", e);
                }
            }
            if let Err(e) = transport.close() {
                warn!("failed to close transport: {}", e);
            }
            debug!("session closed");
        }
    }
}

/// Non-owning reference from an entity back to its session.
#[derive(Debug, Clone)]
pub(crate) struct SessionHandle {
    session: Weak<RefCell<Session>>,
    generation: u64,
}

impl SessionHandle {
    /// Whether the session this handle came from is still connected.
    pub(crate) fn is_valid(&self) -> bool {
        self.session.upgrade().is_some_and(|session| {
            let session = session.borrow();
            session.generation == self.generation && session.is_connected()
        })
    }

    /// Run `f` against the live session.
    pub(crate) fn with<R>(
        &self,
        f: impl FnOnce(&mut Session) -> ClientResult<R>,
    ) -> ClientResult<R> {
        let session = self.session.upgrade().ok_or(ClientError::SessionExpired)?;
        let mut session = session.borrow_mut();
        if session.generation != self.generation || !session.is_connected() {
            return Err(ClientError::SessionExpired);
        }
        f(&mut session)
    }
}

// ============================================================================
// Client
// ============================================================================

/// A client session with a NUT server.
///
/// ```no_run
/// use nut_client::Client;
///
/// let client = Client::connect_to("127.0.0.1", 3493, None, None)?;
/// for device in client.device_list()?.unwrap_or_default() {
///     println!("{}: {:?}", device.name(), device.description()?);
/// }
/// client.logout();
/// # Ok::<(), nut_client::ClientError>(())
/// ```
pub struct Client {
    config: ClientConfig,
    session: Rc<RefCell<Session>>,
}

impl Default for Client {
    fn default() -> Self {
        Client::new()
    }
}

impl Client {
    /// Create an unconnected client with default parameters.
    pub fn new() -> Self {
        Client::with_config(ClientConfig::default())
    }

    /// Create an unconnected client.
    pub fn with_config(config: ClientConfig) -> Self {
        Client {
            config,
            session: Rc::new(RefCell::new(Session::new())),
        }
    }

    /// Create a client, connect and authenticate.
    pub fn connect_to(
        host: &str,
        port: u16,
        login: Option<&str>,
        password: Option<&str>,
    ) -> ClientResult<Client> {
        let mut client = Client::with_config(ClientConfig {
            host: host.to_string(),
            port,
            login: login.map(str::to_string),
            password: password.map(str::to_string),
        });
        client.connect()?;
        Ok(client)
    }

    /// Connection parameters.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Host the client is (or will be) connected to.
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Set the host used by the next [`connect`](Self::connect).
    pub fn set_host(&mut self, host: impl Into<String>) {
        self.config.host = host.into();
    }

    /// Port the client is (or will be) connected to.
    pub fn port(&self) -> u16 {
        self.config.port
    }

    /// Set the port used by the next [`connect`](Self::connect).
    pub fn set_port(&mut self, port: u16) {
        self.config.port = port;
    }

    /// Login used for authentication.
    pub fn login(&self) -> Option<&str> {
        self.config.login.as_deref()
    }

    /// Set the login used for authentication.
    pub fn set_login(&mut self, login: Option<String>) {
        self.config.login = login;
    }

    /// Password used for authentication.
    pub fn password(&self) -> Option<&str> {
        self.config.password.as_deref()
    }

    /// Set the password used for authentication.
    pub fn set_password(&mut self, password: Option<String>) {
        self.config.password = password;
    }

    // ========================================================================
    // Connection lifecycle
    // ========================================================================

    /// Connect over TCP with the configured parameters and authenticate.
    ///
    /// An existing connection is torn down first.
    pub fn connect(&mut self) -> ClientResult<()> {
        self.disconnect();
        debug!("connecting to {}:{}", self.config.host, self.config.port);
        let transport = TcpLineTransport::connect(&self.config.host, self.config.port)?;
        self.connect_transport(Box::new(transport))
    }

    /// Replace the connection parameters, then [`connect`](Self::connect).
    pub fn connect_with(
        &mut self,
        host: &str,
        port: u16,
        login: Option<&str>,
        password: Option<&str>,
    ) -> ClientResult<()> {
        self.config.host = host.to_string();
        self.config.port = port;
        self.config.login = login.map(str::to_string);
        self.config.password = password.map(str::to_string);
        self.connect()
    }

    /// Use an already established transport, then authenticate.
    ///
    /// An existing connection is torn down first. If authentication fails the
    /// new transport is closed again.
    pub fn connect_transport(&mut self, transport: Box<dyn LineTransport>) -> ClientResult<()> {
        self.disconnect();
        {
            let mut session = self.session.borrow_mut();
            session.transport = Some(transport);
            session.generation += 1;
        }
        if let Err(e) = self.authenticate() {
            self.disconnect();
            return Err(e);
        }
        Ok(())
    }

    /// Authenticate with the configured login and password.
    ///
    /// Empty or absent credentials are skipped.
    pub fn authenticate(&self) -> ClientResult<()> {
        let mut session = self.session.borrow_mut();
        if let Some(login) = self.config.login.as_deref().filter(|l| !l.is_empty()) {
            session.authenticate(AuthPhase::Username, &Request::Username(login.to_string()))?;
        }
        if let Some(password) = self.config.password.as_deref().filter(|p| !p.is_empty()) {
            session.authenticate(AuthPhase::Password, &Request::Password(password.to_string()))?;
        }
        Ok(())
    }

    /// Replace the credentials and authenticate on the current connection.
    pub fn authenticate_with(
        &mut self,
        login: Option<&str>,
        password: Option<&str>,
    ) -> ClientResult<()> {
        self.config.login = login.map(str::to_string);
        self.config.password = password.map(str::to_string);
        self.authenticate()
    }

    /// Whether a transport is attached and usable.
    ///
    /// A server-side close is only noticed on the next read.
    pub fn is_connected(&self) -> bool {
        self.session.borrow().is_connected()
    }

    /// Close the connection. Entities obtained from it become invalid.
    pub fn disconnect(&self) {
        self.session.borrow_mut().close(false);
    }

    /// Send `LOGOUT` and close the connection without waiting for the reply.
    pub fn logout(&self) {
        self.session.borrow_mut().close(true);
    }

    pub(crate) fn handle(&self) -> SessionHandle {
        SessionHandle {
            session: Rc::downgrade(&self.session),
            generation: self.session.borrow().generation,
        }
    }

    // ========================================================================
    // Raw protocol access
    // ========================================================================

    /// Send `command` followed by `args` and return the raw reply line.
    ///
    /// `ERR` replies become [`ClientError::Protocol`].
    pub fn query(&self, command: &str, args: &[&str]) -> ClientResult<String> {
        let request = Request::Raw {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        };
        self.session.borrow_mut().exchange(&request)
    }

    /// Send `GET <subcommand> <args...>` and return the reply with the echoed
    /// query stripped.
    ///
    /// `Ok(None)` means the reply did not echo the query.
    pub fn get(&self, subcommand: &str, args: &[&str]) -> ClientResult<Option<String>> {
        self.session.borrow_mut().get(Query::raw(subcommand, args))
    }

    /// Send `LIST <subcommand> <args...>` and return every entry with the
    /// echoed query stripped.
    ///
    /// `Ok(None)` means the reply was not framed by matching `BEGIN LIST` /
    /// `END LIST` lines; partial results are never returned.
    pub fn list(&self, subcommand: &str, args: &[&str]) -> ClientResult<Option<Vec<String>>> {
        self.session.borrow_mut().list(Query::raw(subcommand, args))
    }

    /// Server version string (`VER`).
    pub fn server_version(&self) -> ClientResult<String> {
        self.session.borrow_mut().exchange(&Request::Version)
    }

    /// Network protocol version (`NETVER`).
    pub fn protocol_version(&self) -> ClientResult<String> {
        self.session.borrow_mut().exchange(&Request::NetVersion)
    }

    // ========================================================================
    // Devices
    // ========================================================================

    /// Devices served by the server.
    ///
    /// Entries that are not `NAME "DESCRIPTION"` pairs are skipped.
    pub fn device_list(&self) -> ClientResult<Option<Vec<Device>>> {
        let entries = match self
            .session
            .borrow_mut()
            .list(Query::new(Subcommand::Ups, Vec::<String>::new()))?
        {
            Some(entries) => entries,
            None => return Ok(None),
        };
        let handle = self.handle();
        Ok(Some(
            entries
                .iter()
                .filter_map(|entry| split_name_value(entry))
                .map(|(name, _)| Device::new(name, handle.clone()))
                .collect(),
        ))
    }

    /// Look a device up by name.
    ///
    /// The server is probed with `GET UPSDESC`. `DRIVER-NOT-CONNECTED` does
    /// not prevent getting the device; any other error does.
    pub fn device(&self, name: &str) -> ClientResult<Device> {
        let probe = self
            .session
            .borrow_mut()
            .get(Query::new(Subcommand::UpsDesc, [name]));
        match probe {
            Ok(_) => {}
            Err(e) if e.is_code(&ErrorCode::DriverNotConnected) => {
                debug!("device {}: driver not connected", name);
            }
            Err(e) => return Err(e),
        }
        Ok(Device::new(name.to_string(), self.handle()))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("login", &self.config.login)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Parse an integer reply, reporting anything else as `UNKNOWN-RESPONSE`.
pub(crate) fn parse_count(value: &str) -> ClientResult<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| ProtocolError::unknown_response(value).into())
}

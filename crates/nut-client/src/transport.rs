//! Line transport.
//!
//! The session only needs to write a line and read a line. [`LineTransport`]
//! captures that, and [`TcpLineTransport`] implements it over a blocking
//! TCP stream.

use nut_protocol::LineCodec;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

/// Default read buffer size.
const READ_BUFFER_SIZE: usize = 4096;

/// A bidirectional stream of `\n`-terminated text lines.
///
/// Reads block until a full line is available. Closing the transport from
/// another thread while a read is blocked is not supported.
pub trait LineTransport {
    /// Write one line. The terminator is added by the transport.
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Read one line without its terminator.
    ///
    /// Returns `Ok(None)` once the peer has closed the stream.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Whether the transport can still be used.
    fn is_connected(&self) -> bool {
        true
    }

    /// Close the transport.
    fn close(&mut self) -> io::Result<()>;
}

/// Line transport over a blocking TCP connection.
pub struct TcpLineTransport {
    stream: TcpStream,
    codec: LineCodec,
    buffer: Vec<u8>,
    closed: bool,
}

impl TcpLineTransport {
    /// Connect to `host:port`.
    pub fn connect(host: &str, port: u16) -> io::Result<Self> {
        let stream = TcpStream::connect((host, port))?;
        Ok(Self::from_stream(stream))
    }

    /// Wrap an already connected stream.
    pub fn from_stream(stream: TcpStream) -> Self {
        TcpLineTransport {
            stream,
            codec: LineCodec::new(),
            buffer: vec![0u8; READ_BUFFER_SIZE],
            closed: false,
        }
    }

    /// Bound blocking reads. `None` blocks forever.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_read_timeout(timeout)
    }

    /// Address of the server.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }
}

impl LineTransport for TcpLineTransport {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.stream.write_all(&LineCodec::encode_line(line))?;
        self.stream.flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(line) = self.codec.decode_line() {
                return Ok(Some(line));
            }
            if self.closed {
                return Ok(self.codec.take_remaining());
            }
            let n = match self.stream.read(&mut self.buffer) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if n == 0 {
                self.closed = true;
                return Ok(self.codec.take_remaining());
            }
            self.codec.push(&self.buffer[..n]);
        }
    }

    fn is_connected(&self) -> bool {
        !self.closed
    }

    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.codec.clear();
        match self.stream.shutdown(Shutdown::Both) {
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_tcp_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = io::BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            assert_eq!(line, "VER\n");
            writer.write_all(b"Network UPS Tools upsd 2.8.1\r\npartial").unwrap();
        });

        let mut transport = TcpLineTransport::connect("127.0.0.1", port).unwrap();
        transport.write_line("VER").unwrap();
        assert_eq!(
            transport.read_line().unwrap().as_deref(),
            Some("Network UPS Tools upsd 2.8.1")
        );
        server.join().unwrap();

        // Unterminated data is delivered once the peer hangs up.
        assert_eq!(transport.read_line().unwrap().as_deref(), Some("partial"));
        assert_eq!(transport.read_line().unwrap(), None);
        assert!(!transport.is_connected());
        transport.close().unwrap();
    }

    #[test]
    fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        assert!(TcpLineTransport::connect("127.0.0.1", port).is_err());
    }
}

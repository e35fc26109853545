//! Transport contract consumed by the execution engine, and the TCP backend.
//!
//! A transport owns nothing between calls: the engine holds the connection value
//! for the lifetime of one exchange and hands it back to [`Transport::close`].

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Zero socket timeouts are rejected with `InvalidInput`.
const MIN_TIMEOUT: Duration = Duration::from_millis(1);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection refused: {0}")]
    Refused(String),
    #[error("Timed out: {0}")]
    Timeout(String),
    #[error("Connection reset: {0}")]
    Reset(String),
    #[error("{0}")]
    Other(String),
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        let msg = err.to_string();
        match err.kind() {
            io::ErrorKind::ConnectionRefused => TransportError::Refused(msg),
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportError::Timeout(msg),
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => TransportError::Reset(msg),
            _ => TransportError::Other(msg),
        }
    }
}

/// Outcome of one receive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Data(Vec<u8>),
    /// Orderly close by the peer (zero-length read).
    Closed,
    /// Nothing arrived and the transport cannot tell why.
    Nothing,
}

pub trait Transport {
    type Conn;

    fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<Self::Conn, TransportError>;

    fn send(&mut self, conn: &mut Self::Conn, bytes: &[u8]) -> Result<(), TransportError>;

    fn receive(&mut self, conn: &mut Self::Conn, max_size: usize, timeout: Duration) -> Result<Received, TransportError>;

    fn close(&mut self, conn: Self::Conn);
}

/// Stream-socket backend over `std::net`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpTransport;

impl TcpTransport {
    pub fn new() -> Self {
        TcpTransport
    }
}

impl Transport for TcpTransport {
    type Conn = TcpStream;

    /// Tries each resolved address in turn; the last error wins.
    fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<TcpStream, TransportError> {
        let addrs = (host, port).to_socket_addrs()?;
        let mut last = TransportError::Other(format!("no address for {}:{}", host, port));
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout.max(MIN_TIMEOUT)) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    stream.set_write_timeout(Some(timeout.max(MIN_TIMEOUT)))?;
                    return Ok(stream);
                }
                Err(e) => last = e.into(),
            }
        }
        Err(last)
    }

    fn send(&mut self, conn: &mut TcpStream, bytes: &[u8]) -> Result<(), TransportError> {
        conn.write_all(bytes)?;
        conn.flush()?;
        Ok(())
    }

    fn receive(&mut self, conn: &mut TcpStream, max_size: usize, timeout: Duration) -> Result<Received, TransportError> {
        conn.set_read_timeout(Some(timeout.max(MIN_TIMEOUT)))?;
        let mut buf = vec![0u8; max_size.max(1)];
        let n = conn.read(&mut buf)?;
        if n == 0 {
            return Ok(Received::Closed);
        }
        buf.truncate(n);
        Ok(Received::Data(buf))
    }

    fn close(&mut self, conn: TcpStream) {
        let _ = conn.shutdown(Shutdown::Both);
    }
}

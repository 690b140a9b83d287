//! Byte-stream transport for a single request/response exchange.
//!
//! The exchange writes the whole request, then reads until the peer closes
//! the connection. No framing is interpreted here: the response is whatever
//! bytes arrived before end-of-stream.
//!
//! ```text
//! Connector::connect(target) → Stream
//!   → exchange(stream, request)
//!     → write_all(request)
//!     → read until 0-byte read
//!   → stream dropped (connection closed)
//! ```

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::config::TransportSettings;
use crate::target::Target;

/// Opens byte-stream connections to a target. Injected for testability.
pub trait Connector {
    type Stream: Read + Write;

    fn connect(&self, target: &Target) -> io::Result<Self::Stream>;
}

/// Plain TCP connector.
#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    settings: TransportSettings,
}

impl TcpConnector {
    pub fn new(settings: TransportSettings) -> Self {
        Self { settings }
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self, target: &Target) -> io::Result<TcpStream> {
        let stream = match self.settings.connect_timeout {
            None => TcpStream::connect((target.host(), target.port()))?,
            Some(timeout) => connect_timeout(target, timeout)?,
        };

        stream.set_read_timeout(self.settings.read_timeout)?;
        stream.set_write_timeout(self.settings.write_timeout)?;

        debug!(
            remote = %target,
            peer = ?stream.peer_addr().ok(),
            "established tcp connection"
        );
        Ok(stream)
    }
}

/// Try each resolved address in turn, each bounded by `timeout`.
fn connect_timeout(target: &Target, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in target.socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!(%addr, error = %e, "connect attempt failed");
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no addresses found for {target}"),
        )
    }))
}

/// Send `request` and read the response until the peer closes.
///
/// Takes the stream by value so the connection is closed when this returns,
/// whether or not the exchange succeeded.
pub fn exchange<S: Read + Write>(
    mut stream: S,
    request: &[u8],
    recv_buffer_size: usize,
) -> io::Result<Bytes> {
    stream.write_all(request)?;
    stream.flush()?;
    debug!(sent = request.len(), "request written");

    let response = read_to_close(&mut stream, recv_buffer_size)?;
    debug!(received = response.len(), "peer closed connection");
    Ok(response.freeze())
}

/// Read from `reader` until a zero-length read.
///
/// # Panics
///
/// Panics if `recv_buffer_size` is zero.
pub fn read_to_close<R: Read>(reader: &mut R, recv_buffer_size: usize) -> io::Result<BytesMut> {
    assert!(recv_buffer_size > 0, "recv_buffer_size must be > 0");
    let mut buf = vec![0u8; recv_buffer_size];
    let mut response = BytesMut::new();
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => response.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(response)
}

//! One-shot fetch: resolve, exchange, decode.

use bytes::Bytes;
use tracing::info;

use crate::config::TransportSettings;
use crate::error::{FetchError, FetchResult};
use crate::request::Request;
use crate::response::{Decoded, decode};
use crate::target::Target;
use crate::transport::{Connector, TcpConnector, exchange};

/// Issues single `GET` requests through a [`Connector`].
#[derive(Debug, Clone)]
pub struct Client<C = TcpConnector> {
    connector: C,
    recv_buffer_size: usize,
}

impl Client<TcpConnector> {
    /// A TCP client using the given transport settings.
    ///
    /// # Panics
    ///
    /// Panics if `settings.recv_buffer_size` is zero; settings from
    /// [`ClientConfig::transport_settings`](crate::ClientConfig::transport_settings)
    /// never are.
    pub fn new(settings: TransportSettings) -> Self {
        Self::with_connector(TcpConnector::new(settings), settings.recv_buffer_size)
    }
}

impl Default for Client<TcpConnector> {
    fn default() -> Self {
        Self::new(TransportSettings::default())
    }
}

impl<C: Connector> Client<C> {
    /// A client that opens its connections through `connector`.
    ///
    /// # Panics
    ///
    /// Panics if `recv_buffer_size` is zero.
    pub fn with_connector(connector: C, recv_buffer_size: usize) -> Self {
        assert!(recv_buffer_size > 0, "recv_buffer_size must be > 0");
        Self {
            connector,
            recv_buffer_size,
        }
    }

    /// Fetch `url` and decode the response.
    ///
    /// A non-200 status is `Ok(Decoded::NoSuccess)`, not an error.
    pub fn fetch(&self, url: &str) -> FetchResult<Decoded> {
        let target = Target::resolve(url)?;
        let raw = self.exchange(&target)?;
        decode(&raw)
    }

    /// Fetch `url` and return only the body; non-200 becomes
    /// [`FetchError::NoSuccessStatus`].
    pub fn fetch_body(&self, url: &str) -> FetchResult<Bytes> {
        self.fetch(url)?.into_body()
    }

    /// Send the request for `target` and return the raw response bytes.
    pub fn exchange(&self, target: &Target) -> FetchResult<Bytes> {
        info!(remote = %target, path = target.path(), "sending GET");

        let stream = self
            .connector
            .connect(target)
            .map_err(|e| FetchError::connection(target, e))?;
        let request = Request::get(target).to_bytes();
        let raw = exchange(stream, &request, self.recv_buffer_size)
            .map_err(|e| FetchError::connection(target, e))?;

        info!(remote = %target, bytes = raw.len(), "response received");
        Ok(raw)
    }
}

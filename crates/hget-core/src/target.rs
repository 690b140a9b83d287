//! Connection target resolution from `http://host[:port][/path]` URLs.

use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};

use crate::error::{FetchError, FetchResult};

/// Port used when the URL authority carries none.
pub const DEFAULT_PORT: u16 = 80;

/// Where a request goes: host and port to connect to, path to request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    host: String,
    port: u16,
    path: String,
}

impl Target {
    /// Split a URL into host, port and path.
    ///
    /// The path always starts with `/`; a URL without one resolves to `/`.
    /// Fragments are dropped, query strings are kept.
    pub fn resolve(url: &str) -> FetchResult<Self> {
        let url = url.trim();
        let (scheme, rest) = url.split_once("://").ok_or_else(|| {
            FetchError::MalformedUrl(format!("missing scheme separator in {url:?}"))
        })?;

        if scheme.is_empty() {
            return Err(FetchError::MalformedUrl(format!("empty scheme in {url:?}")));
        }
        if !scheme.eq_ignore_ascii_case("http") {
            return Err(FetchError::UnsupportedScheme(scheme.to_string()));
        }

        let rest = rest.split_once('#').map_or(rest, |(before, _)| before);
        let (authority, remainder) = match rest.find(['/', '?']) {
            Some(i) => rest.split_at(i),
            None => (rest, ""),
        };

        let (host, port) = match authority.split_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    FetchError::MalformedUrl(format!("invalid port {port:?} in {url:?}"))
                })?;
                (host, port)
            }
            None => (authority, DEFAULT_PORT),
        };

        if host.is_empty() {
            return Err(FetchError::MalformedUrl(format!("missing host in {url:?}")));
        }

        let path = if remainder.starts_with('/') {
            remainder.to_string()
        } else {
            format!("/{remainder}")
        };

        Ok(Target {
            host: host.to_string(),
            port,
            path,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Resolve the host name to socket addresses.
    pub fn socket_addrs(&self) -> io::Result<Vec<SocketAddr>> {
        Ok((self.host.as_str(), self.port).to_socket_addrs()?.collect())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

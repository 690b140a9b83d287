//! hget-core — a minimal HTTP/1.1 `GET` client.
//!
//! Resolves a URL into a [`Target`], sends a `Connection: close` request,
//! reads until the server closes the connection, and decodes the body
//! (reassembling it when the response uses chunked transfer coding).
//!
//! # Flow
//!
//! ```text
//! Client::fetch(url)
//!   ├── Target::resolve(url)        → host, port, path
//!   ├── Connector::connect(target)  → byte stream
//!   ├── transport::exchange()       → raw response bytes
//!   └── response::decode()          → Decoded::Body | Decoded::NoSuccess
//!         └── chunked::decode_chunks() when Transfer-Encoding lists chunked
//! ```

pub mod chunked;
pub mod client;
pub mod config;
mod error;
mod header;
pub mod request;
pub mod response;
pub mod target;
pub mod transport;

pub use chunked::{ChunkCursor, decode_chunks, encode_chunks};
pub use client::Client;
pub use config::{ClientConfig, TransportSettings};
pub use error::{FetchError, FetchResult};
pub use header::{Header, HeaderMap};
pub use response::{Decoded, ParsedResponse, decode};
pub use target::Target;
pub use transport::{Connector, TcpConnector};

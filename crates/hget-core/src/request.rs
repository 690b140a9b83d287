use crate::target::Target;

/// A `GET` request for a single target.
///
/// Always asks the server to close the connection, since the response is
/// read until end-of-stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request<'a> {
    host: &'a str,
    path: &'a str,
}

impl<'a> Request<'a> {
    pub fn get(target: &'a Target) -> Self {
        Self {
            host: target.host(),
            path: target.path(),
        }
    }

    /// Wire form of the request.
    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
            self.path, self.host
        )
        .into_bytes()
    }
}

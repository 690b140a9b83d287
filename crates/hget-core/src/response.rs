//! Response splitting and body decoding.
//!
//! A raw response is split once: the status line ends at the first CRLF,
//! the header block ends at the first blank line, and everything after is
//! the body. Only the chunked transfer coding changes how the body is read;
//! every other header is carried along untouched.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::chunked::{decode_chunks, find_crlf};
use crate::error::{FetchError, FetchResult};
use crate::header::HeaderMap;

const BLANK_LINE: &[u8] = b"\r\n\r\n";

fn contains_200(status_line: &[u8]) -> bool {
    status_line.windows(3).any(|w| w == b"200")
}

/// A response split into its three sections.
///
/// Borrows from the raw buffer; nothing is copied until the body is decoded.
#[derive(Debug)]
pub struct ParsedResponse<'a> {
    pub status_line: &'a [u8],
    /// Header lines between the status line and the blank line.
    pub headers: &'a [u8],
    pub body: &'a [u8],
}

impl<'a> ParsedResponse<'a> {
    /// Split `raw` at the status-line terminator and the blank-line delimiter.
    pub fn split(raw: &'a [u8]) -> FetchResult<Self> {
        let status_end = find_crlf(raw).ok_or_else(|| {
            FetchError::MalformedResponse("no status line terminator".to_string())
        })?;
        let header_end = raw
            .windows(BLANK_LINE.len())
            .position(|w| w == BLANK_LINE)
            .ok_or_else(|| {
                FetchError::MalformedResponse("no blank line after headers".to_string())
            })?;

        // With no header fields the blank line starts at the status CRLF.
        let headers_start = (status_end + 2).min(header_end);

        Ok(ParsedResponse {
            status_line: &raw[..status_end],
            headers: &raw[headers_start..header_end],
            body: &raw[header_end + BLANK_LINE.len()..],
        })
    }

    /// Whether the status line contains `200`.
    pub fn is_success(&self) -> bool {
        contains_200(self.status_line)
    }

    /// Numeric status code, if the second token of the status line is one.
    pub fn status_code(&self) -> Option<u16> {
        String::from_utf8_lossy(self.status_line)
            .split_whitespace()
            .nth(1)?
            .parse()
            .ok()
    }

    pub fn header_map(&self) -> HeaderMap {
        HeaderMap::parse(self.headers)
    }
}

/// Outcome of decoding a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// The status was 200; this is the entity body.
    Body(Bytes),
    /// The status was anything else; no body is produced.
    NoSuccess { status_line: String },
}

impl Decoded {
    /// The body, or [`FetchError::NoSuccessStatus`].
    pub fn into_body(self) -> FetchResult<Bytes> {
        match self {
            Decoded::Body(body) => Ok(body),
            Decoded::NoSuccess { status_line } => {
                Err(FetchError::NoSuccessStatus { status_line })
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Decoded::Body(_))
    }
}

/// Decode a complete response into its body.
///
/// A non-chunked body is returned as a zero-copy slice of `raw`.
pub fn decode(raw: &Bytes) -> FetchResult<Decoded> {
    let status_end = find_crlf(raw).ok_or_else(|| {
        FetchError::MalformedResponse("no status line terminator".to_string())
    })?;
    let status_line = &raw[..status_end];
    if !contains_200(status_line) {
        let status_line = String::from_utf8_lossy(status_line).into_owned();
        warn!(%status_line, "non-200 response");
        return Ok(Decoded::NoSuccess { status_line });
    }

    let parsed = ParsedResponse::split(raw)?;
    let headers = parsed.header_map();
    let chunked = headers.is_chunked();
    debug!(
        status = ?parsed.status_code(),
        headers = headers.len(),
        body_len = parsed.body.len(),
        chunked,
        "split response"
    );

    let body = if chunked {
        decode_chunks(parsed.body)?
    } else {
        raw.slice_ref(parsed.body)
    };
    Ok(Decoded::Body(body))
}

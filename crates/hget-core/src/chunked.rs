//! Chunked transfer-coding.
//!
//! A chunked body is a sequence of `<hex-size>[;ext]\r\n<data>\r\n` chunks
//! closed by a zero-size chunk. [`ChunkCursor`] walks such a body and yields
//! each payload slice; [`decode_chunks`] concatenates them.
//!
//! The terminal chunk is recognised by its parsed size, so `0`, `000` and
//! `0;name=value` all end the body. Anything after the terminal size line
//! (trailer fields, the final CRLF) is ignored.

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::error::{FetchError, FetchResult};

const CRLF: &[u8] = b"\r\n";

/// Find the first `\r\n` in `data`, returning the index of the `\r`.
pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == CRLF)
}

fn malformed(message: impl Into<String>) -> FetchError {
    FetchError::MalformedChunkEncoding(message.into())
}

/// Cursor over a chunked body.
pub struct ChunkCursor<'a> {
    buf: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> ChunkCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            done: false,
        }
    }

    /// Decode the next chunk, returning `None` once the terminal chunk
    /// has been read.
    pub fn next_chunk(&mut self) -> FetchResult<Option<&'a [u8]>> {
        if self.done {
            return Ok(None);
        }

        let buf = self.buf;
        let rest = &buf[self.pos..];
        let line_end = find_crlf(rest).ok_or_else(|| {
            malformed(format!("no chunk-size line at offset {}", self.pos))
        })?;
        let size = parse_chunk_size(&rest[..line_end])?;
        self.pos += line_end + CRLF.len();

        if size == 0 {
            self.done = true;
            return Ok(None);
        }

        let rest = &buf[self.pos..];
        if rest.len() < size {
            return Err(malformed(format!(
                "chunk declares {size} bytes but only {} remain",
                rest.len()
            )));
        }
        let (data, after) = rest.split_at(size);
        if !after.starts_with(CRLF) {
            return Err(malformed(format!(
                "missing CRLF after {size}-byte chunk at offset {}",
                self.pos
            )));
        }
        self.pos += size + CRLF.len();

        Ok(Some(data))
    }

    /// Offset of the first byte not yet consumed.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether the terminal chunk has been reached.
    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl<'a> Iterator for ChunkCursor<'a> {
    type Item = FetchResult<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Parse a chunk-size line, discarding any `;` extension.
fn parse_chunk_size(line: &[u8]) -> FetchResult<usize> {
    let token = match line.iter().position(|&b| b == b';') {
        Some(i) => &line[..i],
        None => line,
    };
    let token = std::str::from_utf8(token)
        .map_err(|_| malformed("chunk size is not ASCII"))?
        .trim();

    // from_str_radix alone would accept a leading sign.
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed(format!("invalid chunk size {token:?}")));
    }
    usize::from_str_radix(token, 16)
        .map_err(|_| malformed(format!("chunk size {token:?} out of range")))
}

/// Reassemble a chunked body into its payload.
pub fn decode_chunks(body: &[u8]) -> FetchResult<Bytes> {
    let mut out = BytesMut::with_capacity(body.len());
    let mut cursor = ChunkCursor::new(body);
    let mut chunks = 0usize;

    for chunk in cursor.by_ref() {
        out.extend_from_slice(chunk?);
        chunks += 1;
    }

    debug!(
        chunks,
        decoded = out.len(),
        discarded = body.len() - cursor.position(),
        "decoded chunked body"
    );
    Ok(out.freeze())
}

/// Encode `body` as chunks of at most `chunk_size` bytes, followed by the
/// terminal chunk.
pub fn encode_chunks(body: &[u8], chunk_size: usize) -> Bytes {
    assert!(chunk_size > 0, "chunk_size must be > 0");
    let mut out = BytesMut::with_capacity(body.len() + 16);
    for chunk in body.chunks(chunk_size) {
        out.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
        out.extend_from_slice(chunk);
        out.extend_from_slice(CRLF);
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_wikipedia() {
        let body = decode_chunks(b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n").unwrap();
        assert_eq!(&body[..], b"Wikipedia");
    }

    #[test]
    fn decode_strips_extensions() {
        let with_ext = decode_chunks(b"5;foo=bar\r\nHELLO\r\n0\r\n\r\n").unwrap();
        let without = decode_chunks(b"5\r\nHELLO\r\n0\r\n\r\n").unwrap();
        assert_eq!(&with_ext[..], b"HELLO");
        assert_eq!(with_ext, without);
    }

    #[test]
    fn decode_uppercase_hex_and_padding() {
        let data = vec![b'x'; 0x1A];
        let mut encoded = b"001A\r\n".to_vec();
        encoded.extend_from_slice(&data);
        encoded.extend_from_slice(b"\r\n0\r\n\r\n");
        assert_eq!(&decode_chunks(&encoded).unwrap()[..], &data[..]);
    }

    #[test]
    fn decode_zero_variants_terminate() {
        for terminal in ["0", "00", "000", "0;last=yes", "0 "] {
            let stream = format!("3\r\nabc\r\n{terminal}\r\n\r\n");
            let body = decode_chunks(stream.as_bytes()).unwrap();
            assert_eq!(&body[..], b"abc", "terminal {terminal:?}");
        }
    }

    #[test]
    fn decode_discards_trailers() {
        let body = decode_chunks(b"2\r\nhi\r\n0\r\nExpires: never\r\n\r\n").unwrap();
        assert_eq!(&body[..], b"hi");
    }

    #[test]
    fn decode_empty_body() {
        assert!(decode_chunks(b"0\r\n\r\n").unwrap().is_empty());
    }

    #[test]
    fn decode_payload_may_contain_crlf() {
        let body = decode_chunks(b"6\r\na\r\nb\r\n\r\n0\r\n\r\n").unwrap();
        assert_eq!(&body[..], b"a\r\nb\r\n");
    }

    #[test]
    fn decode_rejects_bad_hex() {
        let err = decode_chunks(b"zz\r\nHELLO\r\n0\r\n\r\n").unwrap_err();
        assert!(matches!(err, FetchError::MalformedChunkEncoding(_)));

        let err = decode_chunks(b"+5\r\nHELLO\r\n0\r\n\r\n").unwrap_err();
        assert!(matches!(err, FetchError::MalformedChunkEncoding(_)));

        let err = decode_chunks(b";ext\r\n0\r\n\r\n").unwrap_err();
        assert!(matches!(err, FetchError::MalformedChunkEncoding(_)));
    }

    #[test]
    fn decode_rejects_oversized_chunk_size() {
        let err = decode_chunks(b"fffffffffffffffffffff\r\n").unwrap_err();
        assert!(matches!(err, FetchError::MalformedChunkEncoding(_)));
    }

    #[test]
    fn decode_rejects_truncated_data() {
        let err = decode_chunks(b"a\r\nshort").unwrap_err();
        assert!(matches!(err, FetchError::MalformedChunkEncoding(_)));
    }

    #[test]
    fn decode_rejects_missing_chunk_terminator() {
        let err = decode_chunks(b"3\r\nabcX\r\n0\r\n\r\n").unwrap_err();
        assert!(matches!(err, FetchError::MalformedChunkEncoding(_)));
    }

    #[test]
    fn decode_rejects_missing_terminal_chunk() {
        let err = decode_chunks(b"4\r\nWiki\r\n").unwrap_err();
        assert!(matches!(err, FetchError::MalformedChunkEncoding(_)));

        let err = decode_chunks(b"").unwrap_err();
        assert!(matches!(err, FetchError::MalformedChunkEncoding(_)));
    }

    #[test]
    fn cursor_yields_chunks_in_order() {
        let encoded = b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
        let mut cursor = ChunkCursor::new(encoded);
        assert_eq!(cursor.next_chunk().unwrap(), Some(&b"Wiki"[..]));
        assert_eq!(cursor.next_chunk().unwrap(), Some(&b"pedia"[..]));
        assert!(!cursor.is_done());
        assert_eq!(cursor.next_chunk().unwrap(), None);
        assert!(cursor.is_done());
        assert_eq!(cursor.position(), encoded.len() - 2);
        assert_eq!(cursor.next_chunk().unwrap(), None);
    }

    #[test]
    fn cursor_stops_after_error() {
        let mut cursor = ChunkCursor::new(b"zz\r\n");
        assert!(matches!(cursor.next(), Some(Err(_))));
        assert!(cursor.next().is_none());
    }

    #[test]
    fn encode_layout() {
        assert_eq!(
            &encode_chunks(b"Wikipedia", 4)[..],
            b"4\r\nWiki\r\n4\r\npedi\r\n1\r\na\r\n0\r\n\r\n"
        );
        assert_eq!(&encode_chunks(b"", 8)[..], b"0\r\n\r\n");
    }

    #[test]
    fn encode_then_decode_reproduces_body() {
        let binary: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let bodies: [&[u8]; 4] = [b"", b"\r\n0\r\n\r\n", b"hello world", &binary];

        for body in bodies {
            for chunk_size in [1, 7, 16, 4096] {
                let encoded = encode_chunks(body, chunk_size);
                let decoded = decode_chunks(&encoded).unwrap();
                assert_eq!(&decoded[..], body, "chunk_size {chunk_size}");
            }
        }
    }

    #[test]
    #[should_panic(expected = "chunk_size must be > 0")]
    fn encode_zero_chunk_size_panics() {
        let _ = encode_chunks(b"x", 0);
    }

    #[test]
    fn find_crlf_positions() {
        assert_eq!(find_crlf(b"abc\r\n"), Some(3));
        assert_eq!(find_crlf(b"\r\n"), Some(0));
        assert_eq!(find_crlf(b"abc\r"), None);
        assert_eq!(find_crlf(b""), None);
    }
}

use std::collections::HashMap;
use std::io;

use bytes::{Buf, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{Instant, timeout_at};

use crate::http::request::{Method, Request, canonical_header_name};

/// Upper bound on the request line plus headers.
pub const MAX_HEAD_SIZE: usize = 64 * 1024;

const HTTP_VERSION: &str = "HTTP/1.1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("incomplete request")]
    Incomplete,
    #[error("malformed request line")]
    InvalidRequestLine,
    #[error("unsupported method {0:?}")]
    InvalidMethod(String),
    #[error("request target must be an absolute path")]
    InvalidTarget,
    #[error("unsupported protocol version {0:?}")]
    InvalidVersion(String),
    #[error("line terminated by a bare LF")]
    InvalidLineEnding,
    #[error("malformed header line")]
    InvalidHeader,
    #[error("missing Host header")]
    MissingHost,
    #[error("request head exceeds {MAX_HEAD_SIZE} bytes")]
    HeadTooLarge,
}

/// Why [`read_request`] could not produce a request.
///
/// `Idle` and `TimedOut` are both deadline expiries; they are kept apart
/// because an idle keep-alive connection is closed silently while a
/// half-sent request earns a `400`.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("no request bytes received before the connection went idle")]
    Idle,
    #[error("deadline elapsed with a partial request buffered")]
    TimedOut,
    #[error("stream ended in the middle of a request")]
    UnexpectedEof,
    #[error("malformed request: {0}")]
    Malformed(#[from] ParseError),
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
}

impl ReadError {
    /// Whether the connection should be dropped without writing a response.
    pub fn is_silent(&self) -> bool {
        matches!(self, ReadError::Idle | ReadError::Io(_))
    }
}

/// Parses one request from the front of `buf`.
///
/// On success returns the request and the number of bytes it occupied, so
/// any pipelined bytes after it are left for the next call. Returns
/// [`ParseError::Incomplete`] when the head is not finished yet; every
/// other error is final.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let mut cursor = 0;

    let request_line = next_line(buf, &mut cursor)?;
    let (method, url) = parse_request_line(request_line)?;

    let mut headers = HashMap::new();
    loop {
        let line = next_line(buf, &mut cursor)?;
        if line.is_empty() {
            break;
        }

        let (name, value) = parse_header_line(line)?;
        headers.insert(name, value);
    }

    let host = headers
        .remove("Host")
        .filter(|host| !host.is_empty())
        .ok_or(ParseError::MissingHost)?;
    let close = headers
        .remove("Connection")
        .is_some_and(|v| v.eq_ignore_ascii_case("close"));

    let request = Request {
        method,
        url,
        version: HTTP_VERSION.to_string(),
        headers,
        host,
        close,
    };

    Ok((request, cursor))
}

/// Reads the next request from `reader`, buffering into `buf`.
///
/// Bytes already in `buf` (left over from a pipelined read) are parsed
/// before anything is read. A single `deadline` bounds the whole read, so
/// a client trickling header lines cannot extend it.
pub async fn read_request<R>(
    reader: &mut R,
    buf: &mut BytesMut,
    deadline: Instant,
) -> Result<Request, ReadError>
where
    R: AsyncRead + Unpin,
{
    loop {
        match parse_http_request(buf) {
            Ok((request, consumed)) => {
                buf.advance(consumed);
                return Ok(request);
            }
            Err(ParseError::Incomplete) => {}
            Err(e) => return Err(e.into()),
        }

        let n = match timeout_at(deadline, reader.read_buf(buf)).await {
            Ok(read) => read?,
            Err(_) if buf.is_empty() => return Err(ReadError::Idle),
            Err(_) => return Err(ReadError::TimedOut),
        };

        if n == 0 {
            return Err(if buf.is_empty() {
                ReadError::Idle
            } else {
                ReadError::UnexpectedEof
            });
        }
    }
}

/// Returns the next CRLF-terminated line (without the CRLF) and moves the
/// cursor past it.
fn next_line<'a>(buf: &'a [u8], cursor: &mut usize) -> Result<&'a [u8], ParseError> {
    let rest = &buf[*cursor..];

    let Some(lf) = rest.iter().position(|&b| b == b'\n') else {
        return Err(if buf.len() >= MAX_HEAD_SIZE {
            ParseError::HeadTooLarge
        } else {
            ParseError::Incomplete
        });
    };

    if lf == 0 || rest[lf - 1] != b'\r' {
        return Err(ParseError::InvalidLineEnding);
    }

    *cursor += lf + 1;
    if *cursor > MAX_HEAD_SIZE {
        return Err(ParseError::HeadTooLarge);
    }

    Ok(&rest[..lf - 1])
}

fn parse_request_line(line: &[u8]) -> Result<(Method, String), ParseError> {
    let line = std::str::from_utf8(line).map_err(|_| ParseError::InvalidRequestLine)?;

    let mut parts = line.split(' ');
    let (Some(method), Some(url), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::InvalidRequestLine);
    };

    if method.is_empty() || url.is_empty() || version.is_empty() {
        return Err(ParseError::InvalidRequestLine);
    }

    let method =
        Method::from_str(method).ok_or_else(|| ParseError::InvalidMethod(method.to_string()))?;

    if !url.starts_with('/') || url.bytes().any(|b| b.is_ascii_control()) {
        return Err(ParseError::InvalidTarget);
    }

    if version != HTTP_VERSION {
        return Err(ParseError::InvalidVersion(version.to_string()));
    }

    Ok((method, url.to_string()))
}

fn parse_header_line(line: &[u8]) -> Result<(String, String), ParseError> {
    let colon = line
        .iter()
        .position(|&b| b == b':')
        .ok_or(ParseError::InvalidHeader)?;
    let (name, value) = (&line[..colon], &line[colon + 1..]);

    if name.is_empty() || !name.iter().all(|&b| is_token_byte(b)) {
        return Err(ParseError::InvalidHeader);
    }

    let value = value.trim_ascii();
    if value.iter().any(|&b| b.is_ascii_control() && b != b'\t') {
        return Err(ParseError::InvalidHeader);
    }

    // Token bytes are ASCII, so the name is always valid UTF-8.
    let name = std::str::from_utf8(name).map_err(|_| ParseError::InvalidHeader)?;
    // obs-text (0x80-0xFF) is legal in values; keep it as replacement chars.
    let value = String::from_utf8_lossy(value).into_owned();

    Ok((canonical_header_name(name), value))
}

// tchar from RFC 9110 section 5.6.2
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

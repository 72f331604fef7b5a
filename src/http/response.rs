use std::collections::HashMap;
use std::path::PathBuf;
use std::time::SystemTime;

/// HTTP status codes the server can answer with.
///
/// - `Ok` (200): File served
/// - `BadRequest` (400): Malformed request
/// - `Forbidden` (403): Path escapes the document root or is not servable
/// - `NotFound` (404): No such file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use lantern::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use lantern::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::Forbidden.reason_phrase(), "Forbidden");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
        }
    }
}

/// Where the bytes after the blank line come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Empty,
    /// Small in-memory body, used for error responses
    Bytes(Vec<u8>),
    /// A resolved file streamed from disk; `len` is its size at resolution time
    File { path: PathBuf, len: u64 },
}

impl Body {
    pub fn len(&self) -> u64 {
        match self {
            Body::Empty => 0,
            Body::Bytes(bytes) => bytes.len() as u64,
            Body::File { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Represents a complete HTTP response ready to be sent to a client.
#[derive(Debug, Clone)]
pub struct Response {
    /// Protocol version written on the status line
    pub version: String,
    /// The HTTP status code
    pub status: StatusCode,
    /// HTTP headers as key-value pairs
    pub headers: HashMap<String, String>,
    /// Response body source
    pub body: Body,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```
/// # use lantern::http::response::{ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/plain")
///     .body(b"hi".to_vec())
///     .build();
/// assert_eq!(response.headers["Content-Length"], "2");
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HashMap<String, String>,
    body: Body,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Body::Empty,
        }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets an in-memory response body.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Body::Bytes(body);
        self
    }

    /// Streams the body from a file of known length.
    pub fn file(mut self, path: impl Into<PathBuf>, len: u64) -> Self {
        self.body = Body::File {
            path: path.into(),
            len,
        };
        self
    }

    /// Builds the final Response.
    ///
    /// Adds the Content-Length header from the body size if not already present.
    pub fn build(mut self) -> Response {
        let len = self.body.len();
        self.headers
            .entry("Content-Length".to_string())
            .or_insert_with(|| len.to_string());

        Response {
            version: "HTTP/1.1".to_string(),
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// A `200 OK` streaming the file at `path`.
    pub fn file(path: impl Into<PathBuf>, len: u64, content_type: impl Into<String>) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", content_type)
            .file(path, len)
            .build()
    }

    /// An error response whose body is the status line text, e.g. `404 Not Found`.
    pub fn error(status: StatusCode) -> Self {
        let body = format!("{} {}", status.as_u16(), status.reason_phrase());
        ResponseBuilder::new(status)
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body.into_bytes())
            .build()
    }

    /// Creates a 400 Bad Request response. The connection is always closed after it.
    pub fn bad_request() -> Self {
        let mut response = Self::error(StatusCode::BadRequest);
        response.set_close();
        response
    }

    /// Creates a 403 Forbidden response.
    pub fn forbidden() -> Self {
        Self::error(StatusCode::Forbidden)
    }

    /// Creates a 404 Not Found response.
    pub fn not_found() -> Self {
        Self::error(StatusCode::NotFound)
    }

    pub fn set_close(&mut self) {
        self.headers
            .insert("Connection".to_string(), "close".to_string());
    }

    pub fn is_close(&self) -> bool {
        self.headers
            .get("Connection")
            .is_some_and(|v| v.eq_ignore_ascii_case("close"))
    }

    /// Sets the `Date` header in IMF-fixdate form.
    pub fn set_date(&mut self, now: SystemTime) {
        self.headers
            .insert("Date".to_string(), httpdate::fmt_http_date(now));
    }
}

use std::collections::HashMap;

/// HTTP request methods.
///
/// The server only serves static files, so `GET` is the only method the
/// parser accepts. Anything else, including case variants such as `get`,
/// is rejected as a malformed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// # Arguments
    ///
    /// * `s` - String representation of the method (case-sensitive)
    ///
    /// # Returns
    ///
    /// `Some(Method)` if the string matches a supported method, `None` otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// # use lantern::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
        }
    }
}

/// Represents a parsed HTTP request from a client.
///
/// `Host` and `Connection` are lifted out of the header map into
/// [`Request::host`] and [`Request::close`]; every other header is kept in
/// `headers` under its canonical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The HTTP method
    pub method: Method,
    /// The request target (e.g., "/index.html")
    pub url: String,
    /// HTTP version, always "HTTP/1.1" once parsed
    pub version: String,
    /// Remaining request headers keyed by canonical name
    pub headers: HashMap<String, String>,
    /// Value of the mandatory Host header
    pub host: String,
    /// Whether the client sent `Connection: close`
    pub close: bool,
}

impl Request {
    /// Retrieves a header value by name, whatever casing the caller uses.
    ///
    /// # Returns
    ///
    /// `Some(&str)` with the header value if present, `None` otherwise.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&canonical_header_name(key))
            .map(|v| v.as_str())
    }

    /// Determines whether the connection should remain open after the response.
    ///
    /// HTTP/1.1 defaults to keep-alive unless the client sent `Connection: close`.
    pub fn keep_alive(&self) -> bool {
        !self.close
    }
}

/// Normalizes a header name to its canonical form.
///
/// The first letter and every letter following a hyphen are upper-cased,
/// all others are lower-cased, so `content-TYPE` becomes `Content-Type`.
///
/// ```
/// # use lantern::http::request::canonical_header_name;
/// assert_eq!(canonical_header_name("x-forwarded-for"), "X-Forwarded-For");
/// ```
pub fn canonical_header_name(name: &str) -> String {
    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

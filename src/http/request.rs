use std::collections::HashMap;

/// HTTP request methods.
///
/// Only GET and POST are routed. Any other token is kept verbatim in
/// `Other` so the router can answer it with 404 instead of dropping the
/// connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// Any other method token, case preserved
    Other(String),
}

/// Represents a parsed HTTP request head.
///
/// Contains the request line and headers. The body is never part of a
/// `Request`: handlers that need it read it from the connection themselves,
/// using the `Content-Length` header.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request path exactly as sent (e.g., "/echo/abc")
    pub path: String,
    /// HTTP version token (typically "HTTP/1.1")
    pub version: String,
    /// Request headers; names are case-sensitive, the last duplicate wins
    pub headers: HashMap<String, String>,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    version: Option<String>,
    headers: HashMap<String, String>,
}

impl Method {
    /// Parses an HTTP method token.
    ///
    /// Matching is case-sensitive, so `get` becomes `Method::Other("get")`.
    ///
    /// # Example
    ///
    /// ```
    /// # use parcel::http::request::Method;
    /// assert_eq!(Method::parse("GET"), Method::GET);
    /// assert_eq!(Method::parse("get"), Method::Other("get".to_string()));
    /// ```
    pub fn parse(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "POST" => Method::POST,
            other => Method::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::Other(s) => s,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            path: None,
            version: None,
            headers: HashMap::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            path: self.path.ok_or("path missing")?,
            version: self.version.unwrap_or_else(|| "HTTP/1.1".to_string()),
            headers: self.headers,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    /// Retrieves a header value by exact name.
    ///
    /// Lookup is case-sensitive: `accept-encoding` does not match a header
    /// sent as `Accept-Encoding`.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// Parses the Content-Length header as a non-negative integer.
    ///
    /// Returns `None` when the header is absent or not a valid number.
    pub fn content_length(&self) -> Option<u64> {
        self.header("Content-Length")
            .and_then(|v| v.trim().parse().ok())
    }
}

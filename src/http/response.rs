/// HTTP status codes produced by the server.
///
/// - `Ok` (200): Request successful
/// - `Created` (201): File written
/// - `Forbidden` (403): Path escapes the served directory
/// - `NotFound` (404): Unknown route or missing file
/// - `InternalServerError` (500): Filesystem failure or short request body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 201 Created
    Created,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use parcel::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use parcel::http::response::StatusCode;
    /// assert_eq!(StatusCode::Created.reason_phrase(), "Created");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// A complete HTTP response ready to be serialized.
///
/// Headers are kept in insertion order because that is the order they go
/// on the wire. Whenever `body` is `Some`, a `Content-Length` header
/// matching its byte length is present.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Ordered header name/value pairs
    pub headers: Vec<(String, String)>,
    /// Response body, `None` for bodiless responses
    pub body: Option<Vec<u8>>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```
/// # use parcel::http::response::{ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/plain")
///     .body(b"hi".to_vec())
///     .build();
/// assert_eq!(response.header("Content-Length"), Some("2"));
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Appends a header, or replaces the value of an existing one with the
    /// same name while keeping its position.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.headers.push((key, value)),
        }
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Builds the final Response.
    ///
    /// Appends `Content-Length` after the other headers when a body is set
    /// and the caller did not supply one.
    pub fn build(mut self) -> Response {
        if let Some(body) = &self.body {
            if !self.headers.iter().any(|(k, _)| k == "Content-Length") {
                self.headers
                    .push(("Content-Length".to_string(), body.len().to_string()));
            }
        }

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// A bare response: status line only, no headers, no body.
    pub fn empty(status: StatusCode) -> Self {
        ResponseBuilder::new(status).build()
    }

    /// Creates a 200 OK `text/plain` response with the given body.
    pub fn text(body: impl Into<Vec<u8>>) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", "text/plain")
            .body(body.into())
            .build()
    }

    /// Creates a bodiless 404 Not Found response.
    pub fn not_found() -> Self {
        Self::empty(StatusCode::NotFound)
    }

    /// Creates a bodiless 500 Internal Server Error response.
    pub fn internal_error() -> Self {
        Self::empty(StatusCode::InternalServerError)
    }

    /// Looks up a header by exact name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

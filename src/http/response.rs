use std::fmt;
use std::time::SystemTime;

use bytes::Bytes;

use crate::http::mime::TEXT_PLAIN;

/// HTTP status codes the server answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use fileserve::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// Formats as the status line token, e.g. `404 Not Found`.
impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// A complete HTTP response ready to be serialized.
///
/// `content_length` is what gets advertised; it is kept apart from `body` so
/// a HEAD response can announce the file size while sending no bytes.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub content_length: u64,
    pub date: SystemTime,
    /// Headers written after `Date`, in order
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .content_type("text/html")
///     .body(Bytes::from_static(b"<h1>hi</h1>"))
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    content_type: &'static str,
    content_length: Option<u64>,
    date: Option<SystemTime>,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            content_type: TEXT_PLAIN,
            content_length: None,
            date: None,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn content_type(mut self, content_type: &'static str) -> Self {
        self.content_type = content_type;
        self
    }

    /// Overrides the advertised length. Without it the body length is used.
    pub fn content_length(mut self, len: u64) -> Self {
        self.content_length = Some(len);
        self
    }

    pub fn date(mut self, date: SystemTime) -> Self {
        self.date = Some(date);
        self
    }

    /// Appends an extra header after `Date`.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn build(self) -> Response {
        let body_len = self.body.as_ref().map_or(0, |b| b.len() as u64);

        Response {
            status: self.status,
            content_type: self.content_type,
            content_length: self.content_length.unwrap_or(body_len),
            date: self.date.unwrap_or_else(SystemTime::now),
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// Creates a bodiless error response with `Content-Length: 0`.
    pub fn error(status: StatusCode) -> Self {
        ResponseBuilder::new(status).build()
    }

    pub fn bad_request() -> Self {
        Self::error(StatusCode::BadRequest)
    }

    pub fn not_found() -> Self {
        Self::error(StatusCode::NotFound)
    }

    /// 405 with an `Allow` header listing what is served.
    pub fn method_not_allowed() -> Self {
        ResponseBuilder::new(StatusCode::MethodNotAllowed)
            .header("Allow", "GET, HEAD, POST")
            .build()
    }

    pub fn internal_error() -> Self {
        Self::error(StatusCode::InternalServerError)
    }
}

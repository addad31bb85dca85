use std::fmt;
use std::io;

use bytes::Bytes;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::http::headers::HeaderMap;
use crate::http::request::{HTTP_1_1, Method, Request};
use crate::http::response::StatusCode;

const MAX_LINE_LEN: usize = 8 * 1024;
const MAX_HEADERS: usize = 100;
const DEFAULT_MAX_BODY: usize = 1024 * 1024;

#[derive(Debug)]
pub enum ParseError {
    /// The stream closed, reset or timed out. The peer cannot be answered.
    Transport(io::Error),
    MalformedRequestLine,
    MalformedHeaderLine,
    UnsupportedMethod,
    UnsupportedVersion,
    InvalidContentLength,
    TruncatedBody,
}

impl ParseError {
    /// Status to answer with, or `None` when the transport is gone.
    pub fn response_status(&self) -> Option<StatusCode> {
        match self {
            ParseError::Transport(_) => None,
            _ => Some(StatusCode::BadRequest),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Transport(e) => write!(f, "transport error: {e}"),
            ParseError::MalformedRequestLine => f.write_str("malformed request line"),
            ParseError::MalformedHeaderLine => f.write_str("malformed header line"),
            ParseError::UnsupportedMethod => f.write_str("unsupported method"),
            ParseError::UnsupportedVersion => f.write_str("unsupported HTTP version"),
            ParseError::InvalidContentLength => f.write_str("missing or invalid Content-Length"),
            ParseError::TruncatedBody => f.write_str("connection closed before the full body arrived"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        ParseError::Transport(e)
    }
}

/// Upper bounds applied while reading a request.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_line: usize,
    pub max_headers: usize,
    pub max_body: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_line: MAX_LINE_LEN,
            max_headers: MAX_HEADERS,
            max_body: DEFAULT_MAX_BODY,
        }
    }
}

/// The first line of a request, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub path: String,
    pub version: String,
}

/// Parses `<METHOD> <PATH> <VERSION>` (line terminator already stripped).
pub fn parse_request_line(line: &str) -> Result<RequestLine, ParseError> {
    let mut tokens = line.splitn(3, ' ').map(str::trim);

    let (Some(method), Some(path), Some(version)) = (tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(ParseError::MalformedRequestLine);
    };

    if method.is_empty() || path.is_empty() || version.is_empty() {
        return Err(ParseError::MalformedRequestLine);
    }

    let method = Method::from_str(method).ok_or(ParseError::UnsupportedMethod)?;

    if version != HTTP_1_1 {
        return Err(ParseError::UnsupportedVersion);
    }

    Ok(RequestLine {
        method,
        path: path.to_string(),
        version: version.to_string(),
    })
}

/// Splits `Name: value` on the first colon, trimming both halves.
pub fn parse_header_line(line: &str) -> Result<(&str, &str), ParseError> {
    let (name, value) = line.split_once(':').ok_or(ParseError::MalformedHeaderLine)?;
    let name = name.trim();

    if name.is_empty() {
        return Err(ParseError::MalformedHeaderLine);
    }

    Ok((name, value.trim()))
}

/// Reads one `\n` terminated line and strips the terminator (and a `\r`
/// before it). EOF before the terminator is a transport failure; a line
/// longer than `max` yields `too_long`.
async fn read_line<R>(reader: &mut R, max: usize, too_long: ParseError) -> Result<Vec<u8>, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = (&mut *reader)
        .take(max as u64 + 1)
        .read_until(b'\n', &mut buf)
        .await?;

    if buf.last() != Some(&b'\n') {
        if n > max {
            return Err(too_long);
        }
        return Err(ParseError::Transport(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed mid-line",
        )));
    }

    buf.pop();
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }

    Ok(buf)
}

pub async fn read_request_line<R>(reader: &mut R, limits: &Limits) -> Result<RequestLine, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let raw = read_line(reader, limits.max_line, ParseError::MalformedRequestLine).await?;
    let line = std::str::from_utf8(&raw).map_err(|_| ParseError::MalformedRequestLine)?;
    parse_request_line(line)
}

/// Reads header lines up to and including the blank line that ends them.
pub async fn read_headers<R>(reader: &mut R, limits: &Limits) -> Result<HeaderMap, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut headers = HeaderMap::new();
    let mut count = 0;

    loop {
        let raw = read_line(reader, limits.max_line, ParseError::MalformedHeaderLine).await?;
        let line = std::str::from_utf8(&raw).map_err(|_| ParseError::MalformedHeaderLine)?;

        if line.trim().is_empty() {
            return Ok(headers);
        }

        count += 1;
        if count > limits.max_headers {
            return Err(ParseError::MalformedHeaderLine);
        }

        let (name, value) = parse_header_line(line)?;
        headers.insert(name, value);
    }
}

/// Declared body length for methods that carry one.
pub fn content_length(headers: &HeaderMap, limits: &Limits) -> Result<usize, ParseError> {
    let value = headers
        .get("Content-Length")
        .ok_or(ParseError::InvalidContentLength)?;

    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidContentLength);
    }

    let len: usize = value
        .parse()
        .map_err(|_| ParseError::InvalidContentLength)?;

    if len < 1 || len > limits.max_body {
        return Err(ParseError::InvalidContentLength);
    }

    Ok(len)
}

/// Reads exactly `len` body bytes.
pub async fn read_body<R>(reader: &mut R, len: usize) -> Result<Bytes, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut body = vec![0u8; len];

    match reader.read_exact(&mut body).await {
        Ok(_) => Ok(Bytes::from(body)),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(ParseError::TruncatedBody),
        Err(e) => Err(ParseError::Transport(e)),
    }
}

/// Reads a complete request: request line, headers and, for POST, the body.
pub async fn parse_request<R>(reader: &mut R, limits: &Limits) -> Result<Request, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let line = read_request_line(reader, limits).await?;
    let headers = read_headers(reader, limits).await?;

    let body = if line.method.expects_body() {
        let len = content_length(&headers, limits)?;
        Some(read_body(reader, len).await?)
    } else {
        None
    };

    Ok(Request {
        method: line.method,
        path: line.path,
        version: line.version,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parse_simple_get() {
        let mut req: &[u8] = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let parsed = parse_request(&mut req, &Limits::default()).await.unwrap();

        assert_eq!(parsed.path, "/");
        assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
        assert!(parsed.body.is_none());
        assert!(req.is_empty());
    }

    #[test]
    fn request_line_tokens_are_trimmed() {
        let line = parse_request_line("HEAD /a.html  HTTP/1.1 ").unwrap();
        assert_eq!(line.method, Method::HEAD);
        assert_eq!(line.path, "/a.html");
        assert_eq!(line.version, "HTTP/1.1");
    }

    #[test]
    fn header_value_keeps_later_colons() {
        let (name, value) = parse_header_line("Host: localhost:6703").unwrap();
        assert_eq!(name, "Host");
        assert_eq!(value, "localhost:6703");
    }

    #[tokio::test]
    async fn overlong_request_line_is_malformed() {
        let limits = Limits {
            max_line: 16,
            ..Limits::default()
        };
        let mut req: &[u8] = b"GET /a-very-long-path-indeed HTTP/1.1\r\n\r\n";

        let result = parse_request(&mut req, &limits).await;
        assert!(matches!(result, Err(ParseError::MalformedRequestLine)));
    }
}

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::{Instant, timeout, timeout_at};

use crate::files::PathResolver;
use crate::http::headers::HeaderMap;
use crate::http::mime;
use crate::http::parser::{self, Limits, ParseError, RequestLine};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::http::writer::ResponseWriter;

/// Everything a connection needs besides its stream. Shared read-only.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub resolver: PathResolver,
    pub limits: Limits,
    /// Budget for reading the whole request
    pub read_timeout: Duration,
    /// Budget for writing the whole response
    pub write_timeout: Duration,
}

pub struct Connection<S> {
    stream: BufReader<S>,
    settings: Arc<ConnectionSettings>,
    state: ConnectionState,
}

pub enum ConnectionState {
    AwaitRequestLine,
    ReadingHeaders(RequestLine),
    ReadingBody(RequestLine, HeaderMap),
    Resolving(Request),
    WritingResponse(Response, bool), // bool = send body?
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, settings: Arc<ConnectionSettings>) -> Self {
        Self {
            stream: BufReader::new(stream),
            settings,
            state: ConnectionState::AwaitRequestLine,
        }
    }

    /// Drives one request/response exchange and closes the stream.
    ///
    /// Consumes the connection, so the stream is released exactly once.
    /// Transport failures while reading end the exchange silently; a failed
    /// write is returned as an error.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let deadline = Instant::now() + self.settings.read_timeout;
        let limits = self.settings.limits;

        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

            self.state = match state {
                ConnectionState::AwaitRequestLine => {
                    match within(deadline, parser::read_request_line(&mut self.stream, &limits)).await {
                        Ok(line) => ConnectionState::ReadingHeaders(line),
                        Err(e) => Self::rejected(e),
                    }
                }

                ConnectionState::ReadingHeaders(line) => {
                    match within(deadline, parser::read_headers(&mut self.stream, &limits)).await {
                        Ok(headers) if line.method.expects_body() => {
                            ConnectionState::ReadingBody(line, headers)
                        }
                        Ok(headers) => ConnectionState::Resolving(Request {
                            method: line.method,
                            path: line.path,
                            version: line.version,
                            headers,
                            body: None,
                        }),
                        Err(e) => Self::rejected(e),
                    }
                }

                ConnectionState::ReadingBody(line, headers) => {
                    let body = match parser::content_length(&headers, &limits) {
                        Ok(len) => within(deadline, parser::read_body(&mut self.stream, len)).await,
                        Err(e) => Err(e),
                    };

                    match body {
                        Ok(body) => ConnectionState::Resolving(Request {
                            method: line.method,
                            path: line.path,
                            version: line.version,
                            headers,
                            body: Some(body),
                        }),
                        Err(e) => Self::rejected(e),
                    }
                }

                ConnectionState::Resolving(req) => {
                    let response = handle_request(&req, &self.settings.resolver).await;
                    let send_body = req.method != Method::HEAD;

                    tracing::info!(
                        method = %req.method,
                        path = %req.path,
                        status = response.status.as_u16(),
                        bytes = response.content_length,
                        "Request served"
                    );

                    ConnectionState::WritingResponse(response, send_body)
                }

                ConnectionState::WritingResponse(response, send_body) => {
                    let writer = ResponseWriter::new(&response, send_body);

                    timeout(
                        self.settings.write_timeout,
                        writer.write_to_stream(&mut self.stream),
                    )
                    .await
                    .map_err(|_| anyhow::anyhow!("timed out writing response"))??;

                    ConnectionState::Closed
                }

                ConnectionState::Closed => {
                    // The peer may already be gone; nothing left to tell it.
                    let _ = self.stream.shutdown().await;
                    break;
                }
            };
        }

        Ok(())
    }

    /// Next state after a failed read: a 400 if the peer can still hear us,
    /// otherwise straight to `Closed`.
    fn rejected(err: ParseError) -> ConnectionState {
        match err.response_status() {
            Some(status) => {
                tracing::info!(error = %err, "Rejecting malformed request");
                ConnectionState::WritingResponse(Response::error(status), true)
            }
            None => {
                tracing::debug!(error = %err, "Connection dropped while reading request");
                ConnectionState::Closed
            }
        }
    }
}

/// Runs `fut` against the request-read deadline; expiry is a transport error.
async fn within<T, F>(deadline: Instant, fut: F) -> Result<T, ParseError>
where
    F: Future<Output = Result<T, ParseError>>,
{
    timeout_at(deadline, fut).await.map_err(|_| {
        ParseError::Transport(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "request read deadline exceeded",
        ))
    })?
}

/// Builds the response for a fully parsed request.
///
/// GET and POST carry the file contents; HEAD only stats the file. PUT,
/// DELETE and PATCH are answered with 405.
pub async fn handle_request(req: &Request, resolver: &PathResolver) -> Response {
    if !req.method.is_served() {
        return Response::method_not_allowed();
    }

    if let Some(body) = &req.body {
        tracing::debug!(method = %req.method, len = body.len(), "Discarding request body");
    }

    let file = match resolver.resolve(&req.path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::info!(path = %req.path, error = %e, "Could not resolve request path");
            return Response::error(e.response_status());
        }
    };

    let builder = ResponseBuilder::new(StatusCode::Ok).content_type(mime::content_type(file.name()));

    if req.method == Method::HEAD {
        return builder.content_length(file.size).build();
    }

    match resolver.read(&file).await {
        Ok(contents) => builder.body(contents).build(),
        Err(e) => {
            tracing::error!(path = %file.path.display(), error = %e, "Failed to read resolved file");
            Response::internal_error()
        }
    }
}

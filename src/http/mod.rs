//! HTTP protocol implementation.
//!
//! One request per connection: no keep-alive, no chunked encoding.
//!
//! # Architecture
//!
//! - **`connection`**: The per-connection state machine and request handling
//! - **`headers`**: Case-insensitive header map, read-only once parsed
//! - **`parser`**: Reads a request off a buffered stream, line by line
//! - **`request`**: HTTP request representation
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │ AwaitRequestLine │ ← Read and validate the request line
//!        └────────┬─────────┘
//!                 ▼
//!        ┌──────────────────┐
//!        │  ReadingHeaders  │ ← Header lines up to the blank line
//!        └────────┬─────────┘
//!                 │ POST only
//!                 ▼
//!        ┌──────────────────┐
//!        │   ReadingBody    │ ← Exactly Content-Length bytes
//!        └────────┬─────────┘
//!                 ▼
//!        ┌──────────────────┐
//!        │    Resolving     │ ← Map the path onto the document root
//!        └────────┬─────────┘
//!                 ▼
//!        ┌──────────────────┐
//!        │ WritingResponse  │ ← Status line, headers, body
//!        └────────┬─────────┘
//!                 ▼
//!             Closed
//! ```
//!
//! A parse failure jumps to `WritingResponse` with a 400 while the transport
//! is usable, and straight to `Closed` when it is not.
//!
//! # Example
//!
//! ```ignore
//! use fileserve::config::Config;
//! use fileserve::http::connection::Connection;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Config::default().connection_settings();
//!     let listener = TcpListener::bind("127.0.0.1:6703").await?;
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         let settings = settings.clone();
//!         tokio::spawn(async move {
//!             if let Err(e) = Connection::new(socket, settings).run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod headers;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;

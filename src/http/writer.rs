use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::request::HTTP_1_1;
use crate::http::response::Response;

/// Serializes the status line and header block, including the blank line.
///
/// The status line keeps a space before its CRLF (`HTTP/1.1 200 OK \r\n`).
pub fn serialize_head(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128);

    // Status line
    buf.extend_from_slice(format!("{} {} \r\n", HTTP_1_1, resp.status).as_bytes());

    // Headers
    push_header(&mut buf, "Content-Type", resp.content_type);
    push_header(&mut buf, "Content-Length", &resp.content_length.to_string());
    push_header(&mut buf, "Date", &httpdate::fmt_http_date(resp.date));
    for (k, v) in &resp.headers {
        push_header(&mut buf, k, v);
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

fn push_header(buf: &mut Vec<u8>, name: &str, value: &str) {
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(value.as_bytes());
    buf.extend_from_slice(b"\r\n");
}

pub struct ResponseWriter {
    head: Vec<u8>,
    body: Option<Bytes>,
}

impl ResponseWriter {
    /// Prepares `response` for writing. With `send_body` false (HEAD) only
    /// the head goes out, still advertising the full Content-Length.
    pub fn new(response: &Response, send_body: bool) -> Self {
        Self {
            head: serialize_head(response),
            body: if send_body { response.body.clone() } else { None },
        }
    }

    /// Total bytes this writer will emit.
    pub fn len(&self) -> usize {
        self.head.len() + self.body.as_ref().map_or(0, |b| b.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn write_to_stream<W>(&self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        write_all(stream, &self.head).await?;

        if let Some(body) = &self.body {
            write_all(stream, body).await?;
        }

        stream.flush().await?;
        Ok(())
    }
}

async fn write_all<W>(stream: &mut W, mut buf: &[u8]) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while !buf.is_empty() {
        let n = stream.write(buf).await?;

        if n == 0 {
            return Err(anyhow::anyhow!("connection closed while writing"));
        }

        buf = &buf[n..];
    }

    Ok(())
}

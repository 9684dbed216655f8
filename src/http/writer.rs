use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Renders a response into its exact wire bytes.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let body_len = resp.body.as_ref().map_or(0, Vec::len);
    let mut buf = Vec::with_capacity(128 + body_len);

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers, in the order the handler supplied them
    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    if let Some(body) = &resp.body {
        buf.extend_from_slice(body);
    }

    buf
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
        }
    }

    /// Writes the whole response or fails; a short write is a transport error.
    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}

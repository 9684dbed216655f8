use std::collections::HashMap;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::http::request::{Method, Request};

/// Longest request or header line accepted, terminator included.
pub const MAX_LINE_LEN: usize = 8 * 1024;
/// Most header lines accepted in one request head.
pub const MAX_HEADERS: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("connection closed before a request line arrived")]
    ConnectionClosed,
    #[error("empty request line")]
    EmptyRequestLine,
    #[error("request line has fewer than three parts: {0:?}")]
    InvalidRequestLine(String),
    #[error("stream ended before the end of the header block")]
    UnexpectedEof,
    #[error("line exceeds {} bytes", MAX_LINE_LEN)]
    LineTooLong,
    #[error("more than {} header lines", MAX_HEADERS)]
    TooManyHeaders,
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads one request head (request line + headers) from `reader`.
///
/// Stops right after the first empty line, so any body is left unread in
/// `reader`. Every error means the connection should be closed without a
/// response.
pub async fn parse_request<R>(reader: &mut R) -> Result<Request, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let request_line = read_line(reader)
        .await?
        .ok_or(ParseError::ConnectionClosed)?;

    if request_line.is_empty() {
        return Err(ParseError::EmptyRequestLine);
    }

    let mut parts: Vec<&str> = request_line.split(' ').collect();
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    if parts.len() < 3 {
        return Err(ParseError::InvalidRequestLine(request_line));
    }

    let method = Method::parse(parts[0]);
    let path = parts[1].to_string();
    let version = parts[2].to_string();

    // Headers
    let mut headers = HashMap::new();
    let mut count = 0;

    loop {
        let line = read_line(reader).await?.ok_or(ParseError::UnexpectedEof)?;
        if line.is_empty() {
            break;
        }

        count += 1;
        if count > MAX_HEADERS {
            return Err(ParseError::TooManyHeaders);
        }

        if let Some((key, value)) = line.split_once(": ") {
            headers.insert(key.to_string(), value.to_string());
        }
    }

    Ok(Request {
        method,
        path,
        version,
        headers,
    })
}

/// Reads one line without its terminator. `Ok(None)` means EOF with nothing
/// read; a final unterminated line is still returned.
async fn read_line<R>(reader: &mut R) -> Result<Option<String>, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = reader
        .take(MAX_LINE_LEN as u64)
        .read_until(b'\n', &mut buf)
        .await?;

    if n == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if n == MAX_LINE_LEN {
        return Err(ParseError::LineTooLong);
    }

    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

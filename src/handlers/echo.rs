use crate::handlers::HandlerError;
use crate::http::encoding;
use crate::http::request::Request;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

/// `GET /echo/<text>`: returns `text` as plain text, gzip-compressed when the
/// client's `Accept-Encoding` lists gzip.
pub fn handle(text: &str, request: &Request) -> Result<Response, HandlerError> {
    let wants_gzip = request
        .header("Accept-Encoding")
        .is_some_and(encoding::accepts_gzip);

    if !wants_gzip {
        return Ok(Response::text(text.as_bytes()));
    }

    let compressed = encoding::gzip(text.as_bytes()).map_err(HandlerError::Compression)?;

    Ok(ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Encoding", "gzip")
        .header("Content-Type", "text/plain")
        .body(compressed)
        .build())
}

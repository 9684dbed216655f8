use tokio::io::{AsyncRead, AsyncReadExt};

use crate::files::{ResolveError, ServedDirectory, is_missing};
use crate::handlers::HandlerError;
use crate::http::request::Request;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

/// `GET /files/<name>`: serves a regular file from the served directory.
pub async fn read(name: &str, served: Option<&ServedDirectory>) -> Response {
    let Some(served) = served else {
        return Response::not_found();
    };

    let path = match served.resolve(name) {
        Ok(path) => path,
        Err(e) => return resolve_failure(name, e),
    };

    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Response::not_found(),
        Err(e) if is_missing(&e) => return Response::not_found(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to stat file");
            return Response::internal_error();
        }
    }

    match tokio::fs::read(&path).await {
        Ok(contents) => ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", "application/octet-stream")
            .body(contents)
            .build(),
        Err(e) if is_missing(&e) => Response::not_found(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read file");
            Response::internal_error()
        }
    }
}

/// `POST /files/<name>`: stores exactly `Content-Length` bytes of the request
/// body, replacing any existing file.
///
/// The containment check runs before the body is read. A body that ends
/// early yields 500 and leaves the target untouched.
pub async fn write<R>(
    name: &str,
    request: &Request,
    body: &mut R,
    served: Option<&ServedDirectory>,
) -> Result<Response, HandlerError>
where
    R: AsyncRead + Unpin,
{
    let Some(served) = served else {
        return Ok(Response::not_found());
    };

    let path = match served.resolve(name) {
        Ok(path) => path,
        Err(e) => return Ok(resolve_failure(name, e)),
    };

    let expected = request.content_length().ok_or_else(|| {
        HandlerError::InvalidContentLength(request.header("Content-Length").map(str::to_string))
    })?;

    let mut data = Vec::new();
    if let Err(e) = body.take(expected).read_to_end(&mut data).await {
        tracing::warn!(error = %e, "Failed to read request body");
        return Ok(Response::internal_error());
    }

    if data.len() as u64 != expected {
        tracing::warn!(
            expected,
            received = data.len(),
            "Request body ended before Content-Length"
        );
        return Ok(Response::internal_error());
    }

    match tokio::fs::write(&path, &data).await {
        Ok(()) => Ok(Response::empty(StatusCode::Created)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write file");
            Ok(Response::internal_error())
        }
    }
}

fn resolve_failure(name: &str, error: ResolveError) -> Response {
    match error {
        ResolveError::OutsideRoot(_) => {
            tracing::warn!(name, "Rejected path outside served directory");
            Response::empty(StatusCode::Forbidden)
        }
        ResolveError::Io(e) => {
            tracing::warn!(name, error = %e, "Failed to resolve path");
            Response::internal_error()
        }
    }
}

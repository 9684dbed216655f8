//! Response handlers, one per route.
//!
//! Handlers turn a parsed request into a [`Response`]. Only the file-write
//! handler touches the connection again, to read the request body.

pub mod echo;
pub mod files;
pub mod root;
pub mod user_agent;

use tokio::io::AsyncRead;

use crate::files::ServedDirectory;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::router::Route;

/// Failures that end the connection without any response.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("missing or invalid Content-Length header: {0:?}")]
    InvalidContentLength(Option<String>),
    #[error("failed to compress response body: {0}")]
    Compression(#[source] std::io::Error),
}

/// Runs the handler selected by `route`.
///
/// `body` is the connection positioned right after the request head.
pub async fn dispatch<R>(
    route: Route,
    request: &Request,
    body: &mut R,
    served: Option<&ServedDirectory>,
) -> Result<Response, HandlerError>
where
    R: AsyncRead + Unpin,
{
    let response = match route {
        Route::Root => root::handle(),
        Route::Echo(text) => echo::handle(&text, request)?,
        Route::UserAgent => user_agent::handle(request),
        Route::ReadFile(name) => files::read(&name, served).await,
        Route::WriteFile(name) => files::write(&name, request, body, served).await?,
        Route::NotFound => Response::not_found(),
    };

    Ok(response)
}

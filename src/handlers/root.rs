use crate::http::response::{Response, StatusCode};

/// `GET /`: status line only.
pub fn handle() -> Response {
    Response::empty(StatusCode::Ok)
}

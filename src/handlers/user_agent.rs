use crate::http::request::Request;
use crate::http::response::Response;

/// Reported when the client sends no `User-Agent` header.
pub const UNKNOWN_AGENT: &str = "Unknown";

/// `GET /user-agent`: reflects the `User-Agent` header back as plain text.
pub fn handle(request: &Request) -> Response {
    let agent = request.header("User-Agent").unwrap_or(UNKNOWN_AGENT);
    Response::text(agent.as_bytes())
}

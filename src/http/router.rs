use crate::http::request::Method;

const ECHO_PREFIX: &str = "/echo/";
const FILES_PREFIX: &str = "/files/";

/// Handler chosen for a request. Carries the path remainder where the
/// handler needs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Root,
    /// Text after `/echo/`, possibly empty
    Echo(String),
    UserAgent,
    /// Filename after `/files/`, may contain `/`
    ReadFile(String),
    /// Filename after `/files/`, may contain `/`
    WriteFile(String),
    NotFound,
}

/// Maps a method and path to a route.
///
/// Checks run in a fixed order and the patterns are disjoint, so the first
/// match is the only match.
pub fn route(method: &Method, path: &str) -> Route {
    match method {
        Method::GET => {
            if path == "/" {
                Route::Root
            } else if let Some(rest) = path.strip_prefix(ECHO_PREFIX) {
                Route::Echo(rest.to_string())
            } else if path == "/user-agent" {
                Route::UserAgent
            } else if let Some(rest) = path.strip_prefix(FILES_PREFIX) {
                Route::ReadFile(rest.to_string())
            } else {
                Route::NotFound
            }
        }
        Method::POST => match path.strip_prefix(FILES_PREFIX) {
            Some(rest) => Route::WriteFile(rest.to_string()),
            None => Route::NotFound,
        },
        Method::Other(_) => Route::NotFound,
    }
}

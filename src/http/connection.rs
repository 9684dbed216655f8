use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, BufReader};

use crate::files::ServedDirectory;
use crate::handlers;
use crate::http::parser::{ParseError, parse_request};
use crate::http::request::Request;
use crate::http::router::route;
use crate::http::writer::ResponseWriter;

/// One accepted client. Serves a single request, then closes.
pub struct Connection<S> {
    stream: BufReader<S>,
    served: Option<Arc<ServedDirectory>>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, served: Option<Arc<ServedDirectory>>) -> Self {
        Self {
            stream: BufReader::new(stream),
            served,
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await? {
                        Some(req) => ConnectionState::Processing(req),
                        None => ConnectionState::Closed,
                    };
                }

                ConnectionState::Processing(req) => {
                    let route = route(&req.method, &req.path);
                    let result =
                        handlers::dispatch(route, req, &mut self.stream, self.served.as_deref())
                            .await;

                    self.state = match result {
                        Ok(response) => {
                            tracing::info!(
                                method = %req.method,
                                path = %req.path,
                                status = response.status.as_u16(),
                                "Handled request"
                            );
                            ConnectionState::Writing(ResponseWriter::new(&response))
                        }
                        Err(e) => {
                            tracing::debug!(
                                method = %req.method,
                                path = %req.path,
                                error = %e,
                                "Dropping request without response"
                            );
                            ConnectionState::Closed
                        }
                    };
                }

                ConnectionState::Writing(writer) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    // Single request per connection, whatever the client asked for.
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Parses the request head. `None` means the request was malformed or
    /// never arrived; the connection is closed without a response.
    pub async fn read_request(&mut self) -> anyhow::Result<Option<Request>> {
        match parse_request(&mut self.stream).await {
            Ok(request) => Ok(Some(request)),
            Err(ParseError::Io(e)) => Err(e.into()),
            Err(e) => {
                tracing::debug!(error = %e, "Malformed request, closing connection");
                Ok(None)
            }
        }
    }
}

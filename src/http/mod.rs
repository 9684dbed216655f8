//! HTTP protocol implementation.
//!
//! A deliberately small HTTP/1.1 server core: one request per connection,
//! no keep-alive, no chunked encoding.
//!
//! # Architecture
//!
//! - **`connection`**: Drives one client through the request-response state machine
//! - **`parser`**: Reads the request line and header block from a buffered stream
//! - **`request`**: HTTP request representation
//! - **`router`**: Maps method and path to a handler route
//! - **`response`**: HTTP response representation with builder pattern
//! - **`encoding`**: `Accept-Encoding` negotiation and gzip compression
//! - **`writer`**: Serializes and writes HTTP responses to the client
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Parse request line + headers
//!        └──────┬──────┘
//!               │ Request parsed (malformed → Closed, no response)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Route and run the handler
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ▼
//!        ┌──────────────────┐
//!        │     Closed       │
//!        └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use parcel::http::connection::Connection;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:4221").await?;
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, None);
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod encoding;
pub mod parser;
pub mod request;
pub mod response;
pub mod router;
pub mod writer;

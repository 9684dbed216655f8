//! Parcel - minimal HTTP/1.1 echo and file server
//!
//! Core library for request parsing, routing, handlers and the acceptor.

pub mod config;
pub mod files;
pub mod handlers;
pub mod http;
pub mod server;

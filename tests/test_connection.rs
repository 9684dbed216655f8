//! End-to-end request handling over in-memory pipes.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use flate2::read::GzDecoder;
use parcel::files::ServedDirectory;
use parcel::http::connection::Connection;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Sends `request`, half-closes the client side and returns everything the
/// server wrote before closing.
async fn exchange(request: &[u8], dir: Option<&Path>) -> Vec<u8> {
    let served = dir.map(|d| Arc::new(ServedDirectory::new(d).unwrap()));
    let (mut client, server) = tokio::io::duplex(64 * 1024);

    let task = tokio::spawn(async move {
        let mut conn = Connection::new(server, served);
        conn.run().await
    });

    client.write_all(request).await.unwrap();
    client.shutdown().await.unwrap();

    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    task.await.unwrap().unwrap();
    out
}

fn split_response(raw: &[u8]) -> (String, Vec<u8>) {
    let pos = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response head terminator");
    (
        String::from_utf8(raw[..pos + 4].to_vec()).unwrap(),
        raw[pos + 4..].to_vec(),
    )
}

#[tokio::test]
async fn test_root() {
    let out = exchange(b"GET / HTTP/1.1\r\nHost: localhost:4221\r\n\r\n", None).await;
    assert_eq!(out, b"HTTP/1.1 200 OK\r\n\r\n");
}

#[tokio::test]
async fn test_echo_plain() {
    let out = exchange(b"GET /echo/abc123 HTTP/1.1\r\n\r\n", None).await;
    assert_eq!(
        out,
        b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 6\r\n\r\nabc123"
    );
}

#[tokio::test]
async fn test_echo_gzip() {
    let out = exchange(
        b"GET /echo/abc123 HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n",
        None,
    )
    .await;
    let (head, body) = split_response(&out);

    assert!(head.starts_with("HTTP/1.1 200 OK\r\nContent-Encoding: gzip\r\n"));
    assert!(head.contains(&format!("Content-Length: {}\r\n", body.len())));
    assert_ne!(body.len(), 6);

    let mut decoded = String::new();
    GzDecoder::new(body.as_slice())
        .read_to_string(&mut decoded)
        .unwrap();
    assert_eq!(decoded, "abc123");
}

#[tokio::test]
async fn test_user_agent() {
    let out = exchange(
        b"GET /user-agent HTTP/1.1\r\nUser-Agent: foobar/1.2.3\r\n\r\n",
        None,
    )
    .await;
    let (head, body) = split_response(&out);

    assert!(head.contains("Content-Length: 12\r\n"));
    assert_eq!(body, b"foobar/1.2.3");
}

#[tokio::test]
async fn test_unknown_route() {
    let out = exchange(b"GET /nonexistent HTTP/1.1\r\n\r\n", None).await;
    assert_eq!(out, b"HTTP/1.1 404 Not Found\r\n\r\n");
}

#[tokio::test]
async fn test_unsupported_method_is_404() {
    let out = exchange(b"DELETE /files/a HTTP/1.1\r\n\r\n", None).await;
    assert_eq!(out, b"HTTP/1.1 404 Not Found\r\n\r\n");
}

#[tokio::test]
async fn test_malformed_request_gets_no_response() {
    for raw in [&b""[..], b"\r\n", b"GET /\r\n\r\n", b"GET / HTTP/1.1\r\nHost: x\r\n"] {
        let out = exchange(raw, None).await;
        assert!(out.is_empty(), "request {raw:?}");
    }
}

#[tokio::test]
async fn test_keep_alive_is_ignored() {
    let out = exchange(
        b"GET / HTTP/1.1\r\nConnection: keep-alive\r\n\r\nGET /echo/x HTTP/1.1\r\n\r\n",
        None,
    )
    .await;
    assert_eq!(out, b"HTTP/1.1 200 OK\r\n\r\n");
}

#[tokio::test]
async fn test_file_write_then_read() {
    let dir = tempfile::tempdir().unwrap();

    let out = exchange(
        b"POST /files/test.txt HTTP/1.1\r\nContent-Length: 5\r\nContent-Type: application/octet-stream\r\n\r\nhello",
        Some(dir.path()),
    )
    .await;
    assert_eq!(out, b"HTTP/1.1 201 Created\r\n\r\n");

    let out = exchange(b"GET /files/test.txt HTTP/1.1\r\n\r\n", Some(dir.path())).await;
    assert_eq!(
        out,
        b"HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: 5\r\n\r\nhello"
    );
}

#[tokio::test]
async fn test_file_write_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let request = b"POST /files/same.txt HTTP/1.1\r\nContent-Length: 4\r\n\r\ndata";

    exchange(request, Some(dir.path())).await;
    exchange(request, Some(dir.path())).await;

    assert_eq!(std::fs::read(dir.path().join("same.txt")).unwrap(), b"data");
}

#[tokio::test]
async fn test_file_traversal_rejected() {
    let parent = tempfile::tempdir().unwrap();
    let root = parent.path().join("root");
    std::fs::create_dir(&root).unwrap();

    let out = exchange(
        b"POST /files/../outside.txt HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello",
        Some(&root),
    )
    .await;

    assert_eq!(out, b"HTTP/1.1 403 Forbidden\r\n\r\n");
    assert!(!parent.path().join("outside.txt").exists());
}

#[tokio::test]
async fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = exchange(
        b"GET /files/doesnotexist.txt HTTP/1.1\r\n\r\n",
        Some(dir.path()),
    )
    .await;
    assert_eq!(out, b"HTTP/1.1 404 Not Found\r\n\r\n");
}

#[tokio::test]
async fn test_under_length_body() {
    let dir = tempfile::tempdir().unwrap();
    let out = exchange(
        b"POST /files/x.txt HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello",
        Some(dir.path()),
    )
    .await;

    assert_eq!(out, b"HTTP/1.1 500 Internal Server Error\r\n\r\n");
    assert!(!dir.path().join("x.txt").exists());
}

#[tokio::test]
async fn test_bad_content_length_closes_silently() {
    let dir = tempfile::tempdir().unwrap();
    let out = exchange(
        b"POST /files/x.txt HTTP/1.1\r\nContent-Length: lots\r\n\r\nhello",
        Some(dir.path()),
    )
    .await;

    assert!(out.is_empty());
    assert!(!dir.path().join("x.txt").exists());
}

#[tokio::test]
async fn test_files_without_directory() {
    let out = exchange(b"GET /files/a.txt HTTP/1.1\r\n\r\n", None).await;
    assert_eq!(out, b"HTTP/1.1 404 Not Found\r\n\r\n");
}

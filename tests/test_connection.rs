mod common;

use std::time::Duration;

use common::TempRoot;
use docserve::http::connection::Connection;
use docserve::http::resolver::Resolver;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;

const IDLE: Duration = Duration::from_millis(200);

fn site(name: &str) -> (TempRoot, Resolver) {
    let tmp = TempRoot::new(name);
    tmp.write("index.html", b"0123456789");
    let resolver = Resolver::new(tmp.path()).unwrap();
    (tmp, resolver)
}

fn start(resolver: Resolver) -> (DuplexStream, JoinHandle<anyhow::Result<()>>) {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let task = tokio::spawn(async move {
        let mut conn = Connection::new(server, resolver).with_idle_timeout(IDLE);
        conn.run().await
    });
    (client, task)
}

/// Sends `input`, then reads until the server closes the connection.
async fn exchange(resolver: Resolver, input: &[u8]) -> String {
    let (mut client, task) = start(resolver);
    client.write_all(input).await.unwrap();

    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    task.await.unwrap().unwrap();

    String::from_utf8_lossy(&out).into_owned()
}

#[tokio::test]
async fn test_connection_serves_file() {
    let (_tmp, resolver) = site("conn-ok");

    let out = exchange(resolver, b"GET /index.html HTTP/1.1\r\nHost: a\r\n\r\n").await;

    assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(out.contains("Content-Length: 10\r\n"));
    assert!(out.contains("Content-Type: text/html; charset=utf-8\r\n"));
    assert!(!out.contains("Connection: close"));
    assert!(out.ends_with("\r\n\r\n0123456789"));
}

#[tokio::test]
async fn test_connection_not_found() {
    let (_tmp, resolver) = site("conn-404");

    let out = exchange(resolver, b"GET /missing.html HTTP/1.1\r\nHost: a\r\n\r\n").await;

    assert!(out.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(out.ends_with("\r\n\r\n"));
    assert!(!out.contains("Content-Length"));
}

#[tokio::test]
async fn test_connection_bad_request_closes_despite_keep_alive() {
    let (_tmp, resolver) = site("conn-400");

    let out = exchange(
        resolver,
        b"POST / HTTP/1.1\r\nHost: a\r\nConnection: keep-alive\r\n\r\nGET /index.html HTTP/1.1\r\nHost: a\r\n\r\n",
    )
    .await;

    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(out.contains("Connection: close\r\n"));
    assert_eq!(out.matches("HTTP/1.1 ").count(), 1);
}

#[tokio::test]
async fn test_connection_keep_alive_then_close() {
    let (_tmp, resolver) = site("conn-keepalive");

    let out = exchange(
        resolver,
        b"GET /index.html HTTP/1.1\r\nHost: a\r\n\r\n\
          GET /nope HTTP/1.1\r\nHost: a\r\n\r\n\
          GET / HTTP/1.1\r\nHost: a\r\nConnection: close\r\n\r\n\
          GET /index.html HTTP/1.1\r\nHost: a\r\n\r\n",
    )
    .await;

    let statuses: Vec<&str> = out
        .match_indices("HTTP/1.1 ")
        .map(|(i, _)| &out[i..i + 12])
        .collect();
    assert_eq!(statuses, ["HTTP/1.1 200", "HTTP/1.1 404", "HTTP/1.1 200"]);
    assert_eq!(out.matches("Connection: close").count(), 1);
}

#[tokio::test]
async fn test_connection_keep_alive_across_separate_writes() {
    let (_tmp, resolver) = site("conn-separate-writes");
    let (mut client, task) = start(resolver);

    client
        .write_all(b"GET /index.html HTTP/1.1\r\nHost: a\r\n\r\n")
        .await
        .unwrap();
    let mut first = vec![0u8; 512];
    let n = client.read(&mut first).await.unwrap();
    assert!(first[..n].starts_with(b"HTTP/1.1 200 OK\r\n"));

    client
        .write_all(b"GET /index.html HTTP/1.1\r\nHost: a\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut rest = Vec::new();
    client.read_to_end(&mut rest).await.unwrap();
    task.await.unwrap().unwrap();

    let rest = String::from_utf8(rest).unwrap();
    assert!(rest.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(rest.contains("Connection: close\r\n"));
}

#[tokio::test]
async fn test_connection_idle_timeout_writes_nothing() {
    let (_tmp, resolver) = site("conn-idle");
    let (mut client, task) = start(resolver);

    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();

    assert!(out.is_empty());
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_connection_partial_request_timeout_is_bad_request() {
    let (_tmp, resolver) = site("conn-partial-timeout");
    let (mut client, task) = start(resolver);

    client.write_all(b"GET /index.html HTTP/1.1\r\nHost: a\r\n").await.unwrap();
    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    task.await.unwrap().unwrap();

    assert!(out.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_connection_end_of_stream_without_bytes() {
    let (_tmp, resolver) = site("conn-eof");
    let (mut client, task) = start(resolver);

    client.shutdown().await.unwrap();
    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    task.await.unwrap().unwrap();

    assert!(out.is_empty());
}

#[tokio::test]
async fn test_connection_end_of_stream_after_partial_request() {
    let (_tmp, resolver) = site("conn-eof-partial");
    let (mut client, task) = start(resolver);

    client.write_all(b"GET /index.html HT").await.unwrap();
    client.shutdown().await.unwrap();
    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    task.await.unwrap().unwrap();

    assert!(out.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_connection_missing_host_is_bad_request() {
    let (_tmp, resolver) = site("conn-missing-host");

    let out = exchange(resolver, b"GET /index.html HTTP/1.1\r\nUser-Agent: x\r\n\r\n").await;

    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_connection_empty_first_line_is_bad_request() {
    let (_tmp, resolver) = site("conn-empty-line");

    let out = exchange(resolver, b"\r\nGET /index.html HTTP/1.1\r\nHost: a\r\n\r\n").await;

    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert_eq!(out.matches("HTTP/1.1 ").count(), 1);
}

#[tokio::test]
async fn test_connection_oversized_header_is_bad_request() {
    let (_tmp, resolver) = site("conn-oversized");
    let mut raw = b"GET /index.html HTTP/1.1\r\nHost: a\r\nX-Big: ".to_vec();
    raw.extend(std::iter::repeat_n(b'a', 20 * 1024));
    raw.extend_from_slice(b"\r\n\r\n");

    let out = exchange(resolver, &raw).await;

    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert_eq!(out.matches("HTTP/1.1 ").count(), 1);
}

// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use super::*;
use crate::client::{ClientError, FuncPortalClient};
use crate::jobs::memory::MemoryJobStore;
use crate::worker::Worker;
use funcportal_api::Arguments;

fn args(value: serde_json::Value) -> Arguments {
    Arguments::try_from(value).unwrap()
}

/// Serve the demo functions on an ephemeral port and return the base URL.
async fn start(store: &MemoryJobStore) -> String {
    let mut portal = Portal::with_job_store(std::sync::Arc::new(store.clone()));
    portal.register_endpoint("/multiply", crate::demo::multiply().unwrap(), false).unwrap();
    portal.register_endpoint("/exponent", crate::demo::exponent().unwrap(), false).unwrap();
    portal.register_endpoint("/multiply_async", crate::demo::multiply().unwrap(), true).unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(serve(listener, std::sync::Arc::new(portal)));
    url
}

#[test]
fn test_parse_listen_addr() {
    assert_eq!(
        "127.0.0.1:7035".parse::<std::net::SocketAddr>().unwrap(),
        parse_listen_addr("http://127.0.0.1:7035").unwrap()
    );
    assert_eq!("[::1]:8080".parse::<std::net::SocketAddr>().unwrap(), parse_listen_addr("http://[::1]:8080").unwrap());
    assert_eq!(80, parse_listen_addr("http://0.0.0.0").unwrap().port());
    assert!(parse_listen_addr("https://127.0.0.1:7035").is_err());
    assert!(parse_listen_addr("http://localhost:7035").is_err());
    assert!(parse_listen_addr("not a url").is_err());
}

#[tokio::test]
async fn test_sync_scenarios_over_http() {
    let url = start(&MemoryJobStore::new()).await;
    let client = FuncPortalClient::new(&url);

    assert_eq!(
        serde_json::json!(6),
        client.call("/multiply", &args(serde_json::json!({"x": 2, "y": 3}))).await.unwrap()
    );
    assert_eq!(serde_json::json!(9), client.call("/exponent", &args(serde_json::json!({"base": 3}))).await.unwrap());
    assert_eq!(
        serde_json::json!(81),
        client.call("/exponent", &args(serde_json::json!({"base": 3, "power": 4}))).await.unwrap()
    );

    match client.call("/multiply", &args(serde_json::json!({"x": 2}))).await {
        Err(ClientError::MissingArguments { message, arguments }) => {
            assert_eq!("multiply() missing 1 required argument: 'y'", message);
            assert_eq!(
                serde_json::json!({"required": [{"name": "x"}, {"name": "y"}], "optional": []}),
                serde_json::to_value(arguments).unwrap()
            );
        }
        other => panic!("unexpected result: {:?}", other),
    }

    assert!(matches!(
        client.call("/divide", &args(serde_json::json!({}))).await,
        Err(ClientError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_raw_requests_over_http() {
    let url = start(&MemoryJobStore::new()).await;
    let client = reqwest::Client::new();

    let response = client.post(format!("{}/multiply", url)).body("{\"x\": 2,").send().await.unwrap();
    assert_eq!(400, response.status().as_u16());
    assert_eq!(
        Some("application/json"),
        response.headers().get("content-type").and_then(|v| v.to_str().ok())
    );
    assert_eq!(
        serde_json::json!({"error": "malformed payload"}),
        response.json::<serde_json::Value>().await.unwrap()
    );

    let response = client.get(format!("{}/multiply", url)).send().await.unwrap();
    assert_eq!(405, response.status().as_u16());

    let response = client.request(reqwest::Method::OPTIONS, format!("{}/multiply", url)).send().await.unwrap();
    assert_eq!(405, response.status().as_u16());
    assert_eq!(
        serde_json::json!({"error": "method not allowed"}),
        response.json::<serde_json::Value>().await.unwrap()
    );
}

#[tokio::test]
async fn test_async_scenario_over_http() {
    let store = MemoryJobStore::new().with_poll_interval(std::time::Duration::from_millis(10));
    let url = start(&store).await;
    let client = FuncPortalClient::new(&url);

    let token = client.submit("/multiply_async", &args(serde_json::json!({"x": 2, "y": 3}))).await.unwrap();
    assert!(matches!(client.fetch("/multiply_async", &token).await, Err(ClientError::NotReady)));
    assert!(matches!(
        client.fetch("/multiply_async", &funcportal_api::job::Token::new()).await,
        Err(ClientError::NotFound(_))
    ));

    let functions = std::collections::HashMap::from([("multiply".to_string(), crate::demo::multiply().unwrap())]);
    tokio::spawn(Worker::new(std::sync::Arc::new(store.clone()), functions).run());

    let result = client
        .wait("/multiply_async", &token, std::time::Duration::from_millis(20), 100)
        .await
        .unwrap();
    assert_eq!(serde_json::json!(6), result);
    assert_eq!(serde_json::json!(6), client.fetch("/multiply_async", &token).await.unwrap());
}

/// Send raw bytes and read the response until `expected` shows up or the server closes.
async fn raw_exchange(url: &str, request: &[u8], expected: &str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut stream = tokio::net::TcpStream::connect(url.trim_start_matches("http://")).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut received = vec![];
    let read = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
            if String::from_utf8_lossy(&received).contains(expected) {
                break;
            }
        }
    })
    .await;
    assert!(read.is_ok());
    String::from_utf8_lossy(&received).to_string()
}

#[tokio::test]
async fn test_unreadable_body_gets_json_response() {
    let url = start(&MemoryJobStore::new()).await;
    let response = raw_exchange(
        &url,
        b"POST /multiply HTTP/1.1\r\nhost: localhost\r\ntransfer-encoding: chunked\r\n\r\nzz\r\n\r\n",
        "malformed payload",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 400"), "{}", response);
    assert!(response.contains(r#"{"error":"malformed payload"}"#), "{}", response);
}

#[tokio::test]
async fn test_non_ascii_header_is_skipped() {
    let url = start(&MemoryJobStore::new()).await;
    let body = br#"{"x": 2, "y": 3}"#;
    let mut request = format!(
        "POST /multiply HTTP/1.1\r\nhost: localhost\r\ncontent-length: {}\r\nx-note: caf",
        body.len()
    )
    .into_bytes();
    request.extend_from_slice(b"\xe9\r\n\r\n");
    request.extend_from_slice(body);

    let response = raw_exchange(&url, &request, r#"{"result":6}"#).await;
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.contains(r#"{"result":6}"#), "{}", response);
}

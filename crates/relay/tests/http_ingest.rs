use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use logrelay_buffer::MemoryBuffer;
use logrelay_core::format::Formatter;
use logrelay_relay::http::router;
use logrelay_relay::logger::CallLogger;
use logrelay_relay::writer::BufferWriter;
use testkit::FixedIds;
use tower::ServiceExt;

const KEY: &str = "logs:list";

fn setup() -> (MemoryBuffer, axum::Router) {
    let buffer = MemoryBuffer::new();
    let writer = BufferWriter::new(buffer.clone(), KEY, Duration::from_secs(86_400));
    let logger = CallLogger::spawn(writer, Formatter::new(FixedIds), 16);
    (buffer, router(logger))
}

fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/calls")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn accepts_a_call_record() {
    let (buffer, app) = setup();

    let response = app
        .oneshot(post_json(
            r#"{"source":"svcA","destination":"svcB","method":"GET",
                "request":"req1","response":"resp1","success":true}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);

    tokio::time::sleep(Duration::from_millis(40)).await;
    let entries = buffer.entries(KEY);
    assert_eq!(entries.len(), 1);
    assert!(entries[0].contains("source=svcA, destination=svcB, method=GET"));
}

#[tokio::test]
async fn accepts_supplied_trace_ids() {
    let (buffer, app) = setup();

    let response = app
        .oneshot(post_json(
            r#"{"source":"svcA","destination":"svcB","method":"GET","success":false,
                "trace_id":"ffffffffffffffffffffffffffffffff",
                "span_id":"ffffffffffffffff",
                "parent_span_id":"eeeeeeeeeeeeeeee"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);

    tokio::time::sleep(Duration::from_millis(40)).await;
    let entries = buffer.entries(KEY);
    assert!(entries[0].contains("trace_id=ffffffffffffffffffffffffffffffff"));
    assert!(entries[0].contains("parent_span_id=eeeeeeeeeeeeeeee"));
    assert!(entries[0].contains("success=false"));
}

#[tokio::test]
async fn rejects_empty_identifiers() {
    let (buffer, app) = setup();

    let response = app
        .oneshot(post_json(
            r#"{"source":"","destination":"svcB","method":"GET","success":true}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(buffer.is_empty(KEY));
}

#[tokio::test]
async fn rejects_malformed_trace_id() {
    let (_buffer, app) = setup();

    let response = app
        .oneshot(post_json(
            r#"{"source":"svcA","destination":"svcB","method":"GET","success":true,
                "trace_id":"not-hex"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

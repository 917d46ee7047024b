//! End-to-end tests of the Lark notifier against a mock webhook server.

use std::time::{Duration, Instant};

use lark_notify::config::AppConfig;
use lark_notify::error::ProtocolError;
use lark_notify::notify::{LarkNotifier, Notifier};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUCCESS_BODY: &str = r#"{"Extra":null,"StatusCode":0,"StatusMessage":"success"}"#;
const FAILURE_BODY: &str = r#"{"code":9499,"msg":"Bad Request","data":{}}"#;

fn notifier(server: &MockServer, timeout: Duration) -> LarkNotifier {
    LarkNotifier::new("ops", &format!("{}/hook", server.uri()), timeout).unwrap()
}

async fn respond_with(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_posts_text_payload_as_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("content-type", "application/json"))
        .and(header("connection", "close"))
        .and(body_json(json!({
            "msg_type": "text",
            "content": {"text": "Probe down\napi.example.com timed out"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(SUCCESS_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let result = notifier(&server, Duration::from_secs(5))
        .send("Probe down", "api.example.com timed out")
        .await;

    assert_ok!(result);
}

#[tokio::test]
async fn test_success_with_extra_fields() {
    let server = MockServer::start().await;
    respond_with(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "StatusCode": 0,
            "StatusMessage": "success",
            "data": {"message_id": "om_123"},
            "trace": [1, 2, 3]
        })),
    )
    .await;

    assert_ok!(notifier(&server, Duration::from_secs(5)).send("t", "m").await);
}

#[tokio::test]
async fn test_error_schema_exposes_code_and_msg() {
    let server = MockServer::start().await;
    respond_with(&server, ResponseTemplate::new(200).set_body_string(FAILURE_BODY)).await;

    let err = assert_err!(notifier(&server, Duration::from_secs(5)).send("t", "m").await);

    assert_eq!(err.code(), Some(9499));
    assert_eq!(err.msg(), Some("Bad Request"));
    assert_eq!(err.kind(), "lark");
    assert_eq!(err.name(), "ops");
}

#[tokio::test]
async fn test_non_json_error_page_keeps_status_and_body() {
    let server = MockServer::start().await;
    respond_with(
        &server,
        ResponseTemplate::new(500).set_body_string("upstream connect error"),
    )
    .await;

    let err = assert_err!(notifier(&server, Duration::from_secs(5)).send("t", "m").await);

    assert_eq!(err.status(), Some(500));
    assert_eq!(
        err.protocol(),
        Some(&ProtocolError::Malformed {
            status: 500,
            body: "upstream connect error".to_string()
        })
    );
}

#[tokio::test]
async fn test_json_without_either_schema_is_unrecognized() {
    let server = MockServer::start().await;
    respond_with(
        &server,
        ResponseTemplate::new(200).set_body_string(r#"{"StatusCode":19001}"#),
    )
    .await;

    let err = assert_err!(notifier(&server, Duration::from_secs(5)).send("t", "m").await);

    assert!(matches!(
        err.protocol(),
        Some(ProtocolError::Unrecognized { status: 200, .. })
    ));
}

#[tokio::test]
async fn test_slow_server_times_out_within_bound() {
    let server = MockServer::start().await;
    respond_with(
        &server,
        ResponseTemplate::new(200)
            .set_body_string(SUCCESS_BODY)
            .set_delay(Duration::from_secs(10)),
    )
    .await;

    let started = Instant::now();
    let err = assert_err!(
        notifier(&server, Duration::from_millis(300))
            .send("t", "m")
            .await
    );

    assert!(err.is_timeout(), "expected timeout, got {}", err);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_deadline_shorter_than_timeout() {
    let server = MockServer::start().await;
    respond_with(
        &server,
        ResponseTemplate::new(200)
            .set_body_string(SUCCESS_BODY)
            .set_delay(Duration::from_secs(10)),
    )
    .await;

    let deadline = tokio::time::Instant::now() + Duration::from_millis(200);
    let started = Instant::now();
    let err = assert_err!(
        notifier(&server, Duration::from_secs(30))
            .send_before("t", "m", deadline)
            .await
    );

    assert!(err.is_timeout());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_expired_deadline_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SUCCESS_BODY))
        .expect(0)
        .mount(&server)
        .await;

    let notifier = notifier(&server, Duration::from_secs(5));
    for _ in 0..20 {
        let deadline = tokio::time::Instant::now() - Duration::from_secs(1);
        let err = assert_err!(notifier.send_before("t", "m", deadline).await);

        assert!(err.is_timeout());
        assert!(!err.is_retryable());
    }

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind then release a port so nothing is listening on it.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let notifier = LarkNotifier::new(
        "ops",
        &format!("http://127.0.0.1:{}/hook", port),
        Duration::from_secs(2),
    )
    .unwrap();

    let err = assert_err!(notifier.send("t", "m").await);

    assert!(err.protocol().is_none());
    assert!(err.to_string().starts_with("[lark / ops] - HTTP request failed"));
}

#[tokio::test]
async fn test_repeated_sends_are_independent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FAILURE_BODY))
        .expect(2)
        .mount(&server)
        .await;

    let notifier = notifier(&server, Duration::from_secs(5));
    let first = assert_err!(notifier.send("same", "input").await);
    let second = assert_err!(notifier.send("same", "input").await);

    assert_eq!(first.protocol(), second.protocol());
}

#[tokio::test]
async fn test_dispatch_retries_only_the_failing_webhook() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SUCCESS_BODY))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bad"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FAILURE_BODY))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dry"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SUCCESS_BODY))
        .expect(0)
        .mount(&server)
        .await;

    let yaml = format!(
        r#"
settings:
  timeout_seconds: 5
  retry:
    max_attempts: 2
    interval_seconds: 0
notify:
  lark:
    - name: ok
      webhook: {uri}/ok
    - name: bad
      webhook: {uri}/bad
    - name: dry
      webhook: {uri}/dry
      dry: true
"#,
        uri = server.uri()
    );
    let config: AppConfig = serde_yaml::from_str(&yaml).unwrap();

    let dispatcher = lark_notify::default_registry().build_all(&config).unwrap();
    let report = dispatcher.notify_all("Probe down", "api timed out").await;

    assert_eq!(report.outcomes.len(), 3);
    assert!(!report.is_success());
    assert_eq!(report.succeeded(), 2);

    let bad = report.failures().next().unwrap();
    assert_eq!(bad.name, "bad");
    assert_eq!(bad.attempts, 2);

    let dry = &report.outcomes[2];
    assert!(dry.dry);
    assert_eq!(dry.attempts, 0);
}

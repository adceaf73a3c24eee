//! HTTP executor against a live mock executor service.

use aoe_executor::error::InvokeError;
use aoe_executor::invoker::{ActionInvoker, ExecutorInvoker, HttpExecutor, DEFAULT_ACTION_TIMEOUT};
use aoe_executor::types::{Action, ExecutorSpec};
use serde_json::json;
use std::time::Duration;

use crate::integration::test_utils::MockExecutorService;

#[tokio::test]
async fn test_discovered_facts_from_json_body() {
    let service = MockExecutorService::start().await;
    let executor = HttpExecutor::new(DEFAULT_ACTION_TIMEOUT).unwrap();

    let facts = executor
        .execute(&ExecutorSpec::http("POST", service.url("/restart/web")))
        .await
        .unwrap();
    assert_eq!(facts.get("service_web_healthy"), Some(&json!(true)));
    assert_eq!(facts.len(), 1);
}

#[tokio::test]
async fn test_empty_and_text_bodies_discover_nothing() {
    let service = MockExecutorService::start().await;
    let executor = HttpExecutor::new(DEFAULT_ACTION_TIMEOUT).unwrap();

    let facts = executor
        .execute(&ExecutorSpec::http("GET", service.url("/empty")))
        .await
        .unwrap();
    assert!(facts.is_empty());

    let facts = executor
        .execute(&ExecutorSpec::http("POST", service.url("/text")))
        .await
        .unwrap();
    assert!(facts.is_empty());
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let service = MockExecutorService::start().await;
    let executor = HttpExecutor::new(DEFAULT_ACTION_TIMEOUT).unwrap();

    let err = executor
        .execute(&ExecutorSpec::http("POST", service.url("/fail")))
        .await
        .unwrap_err();
    match err {
        InvokeError::Status(status) => assert!(status.starts_with("500")),
        other => panic!("expected status error, got {:?}", other),
    }

    let err = executor
        .execute(&ExecutorSpec::http("GET", service.url("/missing")))
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::Status(_)));
}

#[tokio::test]
async fn test_timeout_is_a_transport_error() {
    let service = MockExecutorService::start().await;
    let executor = HttpExecutor::new(Duration::from_millis(200)).unwrap();

    let err = executor
        .execute(&ExecutorSpec::http("GET", service.url("/slow")))
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::Transport(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_service_is_a_transport_error() {
    let executor = HttpExecutor::new(Duration::from_secs(2)).unwrap();
    let err = executor
        .execute(&ExecutorSpec::http("GET", "http://127.0.0.1:1/restart/web"))
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::Transport(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_method_headers_and_json_body_are_sent() {
    let service = MockExecutorService::start().await;
    let executor = HttpExecutor::new(DEFAULT_ACTION_TIMEOUT).unwrap();

    let mut spec = ExecutorSpec::http("PUT", service.url("/diagnostics"));
    spec.headers
        .insert("X-Request-Source".to_string(), "aoe".to_string());
    spec.headers
        .insert("Content-Type".to_string(), "text/plain".to_string());
    spec.body = r#"{"unit": "web"}"#.to_string();

    let facts = executor.execute(&spec).await.unwrap();
    assert_eq!(facts.get("port_open"), Some(&json!(false)));
    assert_eq!(facts.get("disk_free_gb"), Some(&json!(12)));

    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "PUT");
    assert_eq!(request.path, "/diagnostics");
    assert_eq!(request.header("x-request-source").as_deref(), Some("aoe"));
    assert_eq!(
        request.header("content-type").as_deref(),
        Some("application/json")
    );
    assert_eq!(request.body, r#"{"unit": "web"}"#);
}

#[tokio::test]
async fn test_no_body_sends_no_content_type() {
    let service = MockExecutorService::start().await;
    let executor = HttpExecutor::new(DEFAULT_ACTION_TIMEOUT).unwrap();

    executor
        .execute(&ExecutorSpec::http("", service.url("/empty")))
        .await
        .unwrap();

    let request = &service.requests()[0];
    assert_eq!(request.method, "GET");
    assert!(request.header("content-type").is_none());
    assert!(request.body.is_empty());
}

#[tokio::test]
async fn test_invoker_routes_by_kind() {
    let service = MockExecutorService::start().await;
    let invoker = ExecutorInvoker::new(DEFAULT_ACTION_TIMEOUT).unwrap();

    let http_action = Action::new(
        "restart_web",
        ExecutorSpec::http("POST", service.url("/restart/web")),
    );
    let facts = invoker.invoke(&http_action).await.unwrap();
    assert_eq!(facts.get("service_web_healthy"), Some(&json!(true)));

    let cli_action = Action::new("free_port", ExecutorSpec::cli());
    assert!(invoker.invoke(&cli_action).await.unwrap().is_empty());

    assert_eq!(service.paths(), vec!["/restart/web".to_string()]);
}

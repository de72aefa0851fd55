use resilient_http::policies::{AttemptFailure, Fixed};
use resilient_http::{Client, ClientBuilder};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

use crate::helpers::{Outcome, ScriptedExecutor};

async fn failing_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn export_has_one_line_per_failed_attempt() {
    let executor = ScriptedExecutor::new(vec![
        Outcome::Refused,
        Outcome::Status(503),
        Outcome::Status(200),
    ]);
    let client = ClientBuilder::new(executor)
        .max_attempts(3)
        .backoff(Fixed::new(Duration::from_millis(1)))
        .keep_log(true)
        .build();

    client.get("http://localhost:9/jobs").await.unwrap();

    let records = client.attempt_records();
    let export = client.log_string();
    let lines: Vec<_> = export.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        format!(
            "{} get [GET] http://localhost:9/jobs attempt-1 error: Executor error: connection refused",
            records[0].unix_timestamp()
        )
    );
    assert_eq!(
        lines[1],
        format!(
            "{} get [GET] http://localhost:9/jobs attempt-2 error: unsuccessful status 503 Service Unavailable",
            records[1].unix_timestamp()
        )
    );
    assert!(matches!(records[0].failure(), AttemptFailure::Transport(_)));
}

#[tokio::test]
async fn verb_names_the_entry_point() {
    let executor = ScriptedExecutor::always(Outcome::Status(500));
    let client = ClientBuilder::new(executor)
        .max_attempts(1)
        .keep_log(true)
        .build();

    client
        .post_form("http://localhost/form", &[("a", "1")])
        .await
        .unwrap();
    client.head("http://localhost/head").await.unwrap();

    let records = client.attempt_records();
    assert_eq!(records[0].verb(), "post_form");
    assert_eq!(records[0].method(), http::Method::POST);
    assert_eq!(records[1].verb(), "head");
    assert!(client.log_string().contains("head [HEAD] http://localhost/head attempt-1"));
}

#[tokio::test]
async fn hook_is_called_instead_of_retaining() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let executor = ScriptedExecutor::always(Outcome::Status(502));
    let client = ClientBuilder::new(executor)
        .max_attempts(3)
        .backoff(Fixed::new(Duration::from_millis(1)))
        .log_hook(move |record| sink.lock().unwrap().push(record.attempt()))
        .build();

    client.get("http://localhost/").await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(client.log_error_count(), 0);
    assert_eq!(client.log_string(), "");
}

#[tokio::test]
async fn retained_log_wins_over_hook() {
    let calls = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&calls);
    let executor = ScriptedExecutor::always(Outcome::Status(502));
    let client = ClientBuilder::new(executor)
        .max_attempts(2)
        .backoff(Fixed::new(Duration::from_millis(1)))
        .keep_log(true)
        .log_hook(move |_| *counter.lock().unwrap() += 1)
        .build();

    client.get("http://localhost/").await.unwrap();

    assert_eq!(client.log_error_count(), 2);
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn without_log_or_hook_entries_are_dropped() {
    let executor = ScriptedExecutor::always(Outcome::Status(502));
    let client = ClientBuilder::new(executor)
        .max_attempts(2)
        .backoff(Fixed::new(Duration::from_millis(1)))
        .build();

    let resp = client.get("http://localhost/").await.unwrap();

    assert_eq!(resp.status(), 502);
    assert_eq!(client.log_error_count(), 0);
    assert!(client.attempt_records().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_lose_no_entries() {
    let server = failing_server().await;
    let client = Client::builder()
        .max_attempts(3)
        .backoff(Fixed::new(Duration::from_millis(1)))
        .keep_log(true)
        .build();

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let client = client.clone();
            let uri = server.uri();
            tokio::spawn(async move { client.get(uri).await })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        let resp = result.unwrap().unwrap();
        assert_eq!(resp.status(), 500);
    }

    assert_eq!(client.log_error_count(), 50 * 3);
    assert_eq!(server.received_requests().await.unwrap().len(), 50 * 3);
    for attempt in 1..=3 {
        let count = client
            .attempt_records()
            .iter()
            .filter(|r| r.attempt() == attempt)
            .count();
        assert_eq!(count, 50);
    }
}

//! JSON requests: query versus body routing, header merging, raw errors.

use kintone_api::client::{ErrorKind, USER_AGENT};
use kintone_api::{Auth, HttpHeader};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use crate::common::{connection, connection_with, TOKEN};

#[tokio::test]
async fn test_get_sends_body_as_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/k/v1/records.json"))
        .and(query_param("app", "7"))
        .and(query_param("query", "limit 10"))
        .and(query_param("fields[0]", "$id"))
        .and(query_param("fields[1]", "title"))
        .and(header("X-Cybozu-API-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [], "totalCount": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let conn = connection(&server);
    let value: Value = conn
        .request(
            "get",
            "RECORDS",
            &json!({"app": 7, "query": "limit 10", "fields": ["$id", "title"]}),
        )
        .await
        .unwrap();

    assert_eq!(value["records"], json!([]));
}

#[tokio::test]
async fn test_post_sends_body_as_json() {
    let server = MockServer::start().await;
    let body = json!({"app": 7, "record": {"title": {"value": "hello"}}});

    Mock::given(method("POST"))
        .and(path("/k/v1/record.json"))
        .and(header("content-type", "application/json"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "12", "revision": "1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let conn = connection(&server);
    let value: Value = conn.request("POST", "RECORD", &body).await.unwrap();
    assert_eq!(value["id"], "12");
}

#[tokio::test]
async fn test_bulk_request_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/k/v1/bulkRequest.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let conn = connection(&server);
    let _: Value = conn
        .request("POST", "BULK_REQUEST", &json!({"requests": []}))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_guest_space_path() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/k/guest/5/v1/record.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"record": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let conn = connection(&server).with_guest_space_id(5);
    let _: Value = conn
        .request("GET", "RECORD", &json!({"app": 1, "id": 1}))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_user_agent_accumulates_on_the_wire() {
    let server = MockServer::start().await;
    let expected = format!("{USER_AGENT} my-app/2.0");

    Mock::given(method("GET"))
        .and(path("/k/v1/app.json"))
        .and(header("user-agent", expected.as_str()))
        .and(header("X-Custom", "second"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"appId": "1"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut conn = connection(&server);
    conn.set_header("User-Agent", "my-app/2.0")
        .set_header("X-Custom", "first")
        .set_header("X-Custom", "second");
    assert_eq!(conn.user_agent().as_deref(), Some(expected.as_str()));

    let _: Value = conn.request("GET", "APP", &json!({"id": 1})).await.unwrap();
}

#[tokio::test]
async fn test_credential_headers_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/k/v1/record.json"))
        .and(header("X-Cybozu-Authorization", "dXNlcjpwYXNz"))
        .and(header("Authorization", "Basic YmFzaWM6c2VjcmV0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"record": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let auth = Auth::new()
        .with_password_auth("user", "pass")
        .with_basic_auth("basic", "secret");
    let conn = connection_with(&server, auth);
    let _: Value = conn
        .request("GET", "RECORD", &json!({"app": 1, "id": 1}))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_error_status_is_returned_raw() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/k/v1/record.json"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "GAIA_RE01", "id": "req-1", "message": "record not found"
        })))
        .mount(&server)
        .await;

    let conn = connection(&server);
    let err = conn
        .request::<Value, _>("GET", "RECORD", &json!({"app": 1, "id": 999}))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    match err.kind {
        ErrorKind::Http { message, .. } => assert!(message.contains("GAIA_RE01")),
        other => panic!("unexpected kind: {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_method_is_rejected_before_sending() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let conn = connection(&server);
    let err = conn
        .request::<Value, _>("FETCH", "RECORD", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidMethod(_)));
}

fn lacks_header(name: &'static str) -> impl Fn(&Request) -> bool + Send + Sync + 'static {
    move |request: &Request| !request.headers.contains_key(name)
}

#[tokio::test]
async fn test_per_call_headers_apply_to_that_call_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/k/v1/record.json"))
        .and(query_param("id", "1"))
        .and(header("X-Trace-Id", "trace-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"call": 1})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/k/v1/record.json"))
        .and(query_param("id", "2"))
        .and(lacks_header("x-trace-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"call": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let conn = connection(&server);
    let first: Value = conn
        .request_with_headers(
            "GET",
            "RECORD",
            &json!({"app": 1, "id": 1}),
            &[HttpHeader::new("X-Trace-Id", "trace-1")],
        )
        .await
        .unwrap();
    let second: Value = conn
        .request("GET", "RECORD", &json!({"app": 1, "id": 2}))
        .await
        .unwrap();

    assert_eq!(first["call"], 1);
    assert_eq!(second["call"], 2);
    assert_eq!(conn.headers().len(), 1);
}

#[tokio::test]
async fn test_refresh_header_stops_base_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/k/v1/app.json"))
        .and(query_param("id", "1"))
        .and(header("X-Once", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"appId": "1"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/k/v1/app.json"))
        .and(query_param("id", "2"))
        .and(lacks_header("x-once"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"appId": "2"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut conn = connection(&server);
    conn.set_header("X-Once", "1");
    let _: Value = conn.request("GET", "APP", &json!({"id": 1})).await.unwrap();

    conn.refresh_header();
    let _: Value = conn.request("GET", "APP", &json!({"id": 2})).await.unwrap();
}

#[tokio::test]
async fn test_concurrent_json_requests_are_isolated() {
    let server = MockServer::start().await;

    for (app, title) in [(1, "first"), (2, "second")] {
        Mock::given(method("POST"))
            .and(path("/k/v1/record.json"))
            .and(body_json(json!({"app": app, "record": {"title": {"value": title}}})))
            .and(header("X-Call", title))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": app.to_string()})))
            .expect(1)
            .mount(&server)
            .await;
    }

    let conn = connection(&server);
    let first_headers = [HttpHeader::new("X-Call", "first")];
    let second_headers = [HttpHeader::new("X-Call", "second")];
    let first_body = json!({"app": 1, "record": {"title": {"value": "first"}}});
    let second_body = json!({"app": 2, "record": {"title": {"value": "second"}}});
    let (first, second) = tokio::join!(
        conn.request_with_headers::<Value, _>(
            "POST",
            "RECORD",
            &first_body,
            &first_headers,
        ),
        conn.request_with_headers::<Value, _>(
            "POST",
            "RECORD",
            &second_body,
            &second_headers,
        ),
    );

    assert_eq!(first.unwrap()["id"], "1");
    assert_eq!(second.unwrap()["id"], "2");
}

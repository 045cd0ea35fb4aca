//! File transfer: upload, download, wrapped errors, per-call isolation.

use kintone_api::{Auth, HttpHeader};
use serde_json::{json, Value};
use wiremock::matchers::{
    body_string_contains, header, header_regex, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{connection, connection_with, TOKEN};

const MULTIPART: &str = "^multipart/form-data; boundary=.+$";

#[tokio::test]
async fn test_upload_posts_multipart_file() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/k/v1/file.json"))
        .and(header("X-Cybozu-API-Token", TOKEN))
        .and(header_regex("content-type", MULTIPART))
        .and(body_string_contains(r#"name="file""#))
        .and(body_string_contains(r#"filename="a.txt""#))
        .and(body_string_contains("hello kintone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fileKey": "c15b3870-7505-4ab6-9d8d-b9bdbc74f5d6"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let conn = connection(&server);
    let bytes = conn
        .upload("a.txt", b"hello kintone".to_vec())
        .await
        .unwrap();

    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["fileKey"], "c15b3870-7505-4ab6-9d8d-b9bdbc74f5d6");

    // the multipart content type applied to that call only
    assert!(conn
        .headers()
        .iter()
        .all(|h| !h.key().eq_ignore_ascii_case("content-type")));
}

#[tokio::test]
async fn test_download_returns_raw_bytes() {
    let server = MockServer::start().await;
    let payload: Vec<u8> = vec![0x89, b'P', b'N', b'G', 0x00, 0xff];

    Mock::given(method("GET"))
        .and(path("/k/v1/file.json"))
        .and(query_param("fileKey", "abc-123"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let conn = connection(&server);
    let bytes = conn.download("abc-123").await.unwrap();
    assert_eq!(bytes.as_ref(), payload.as_slice());
}

#[tokio::test]
async fn test_request_file_wraps_error_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/k/v1/file.json"))
        .respond_with(ResponseTemplate::new(520).set_body_json(json!({
            "code": "GAIA_BL01",
            "id": "req-9",
            "message": "file not found"
        })))
        .mount(&server)
        .await;

    let conn = connection(&server);
    let err = conn
        .request_file("GET", "FILE", json!({"fileKey": "missing"}))
        .await
        .unwrap_err();

    assert_eq!(err.status, Some(520));
    assert_eq!(err.code(), Some("GAIA_BL01"));
    assert_eq!(err.response.id.as_deref(), Some("req-9"));
    assert_eq!(err.response.message, "file not found");
    assert_eq!(err.to_string(), "kintone API error (520): file not found");
}

#[tokio::test]
async fn test_preflight_failure_wrapping_differs_by_path() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let auth = Auth::new()
        .with_api_token(TOKEN)
        .with_client_cert_data(b"not-a-certificate".to_vec(), "pw");
    let conn = connection_with(&server, auth);
    assert!(conn.agent().cert().is_some());

    // file path: wrapped
    let err = conn
        .request_file("GET", "FILE", json!({"fileKey": "k"}))
        .await
        .unwrap_err();
    assert!(err.inner().is_tls_error());
    assert_eq!(err.status, None);

    // JSON path: raw
    let err = conn
        .request::<Value, _>("GET", "RECORD", &json!({"app": 1, "id": 1}))
        .await
        .unwrap_err();
    assert!(err.is_tls_error());
}

#[tokio::test]
async fn test_concurrent_upload_and_json_request_are_isolated() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/k/v1/file.json"))
        .and(header_regex("content-type", MULTIPART))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"fileKey": "k1"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/k/v1/record.json"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
        .expect(1)
        .mount(&server)
        .await;

    let conn = connection(&server);
    let record_body = json!({"app": 1, "record": {}});
    let (upload, record) = tokio::join!(
        conn.upload("data.csv", b"a,b\n1,2\n".to_vec()),
        conn.request::<Value, _>("POST", "RECORD", &record_body),
    );

    let upload: Value = serde_json::from_slice(&upload.unwrap()).unwrap();
    assert_eq!(upload["fileKey"], "k1");
    assert_eq!(record.unwrap()["id"], "1");
}

#[tokio::test]
async fn test_concurrent_uploads_are_isolated() {
    let server = MockServer::start().await;

    for (file_name, content, key) in [
        ("first.txt", "first payload", "key-1"),
        ("second.csv", "second payload", "key-2"),
    ] {
        Mock::given(method("POST"))
            .and(path("/k/v1/file.json"))
            .and(header_regex("content-type", MULTIPART))
            .and(body_string_contains(format!(r#"filename="{file_name}""#)))
            .and(body_string_contains(content))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"fileKey": key})))
            .expect(1)
            .mount(&server)
            .await;
    }

    let conn = connection(&server);
    let (first, second) = tokio::join!(
        conn.upload("first.txt", b"first payload".to_vec()),
        conn.upload("second.csv", b"second payload".to_vec()),
    );

    let first: Value = serde_json::from_slice(&first.unwrap()).unwrap();
    let second: Value = serde_json::from_slice(&second.unwrap()).unwrap();
    assert_eq!(first["fileKey"], "key-1");
    assert_eq!(second["fileKey"], "key-2");
}

#[tokio::test]
async fn test_concurrent_downloads_with_per_call_headers() {
    let server = MockServer::start().await;

    for (file_key, tag, payload) in [("a", "one", b"AAAA".to_vec()), ("b", "two", b"BBBB".to_vec())] {
        Mock::given(method("GET"))
            .and(path("/k/v1/file.json"))
            .and(query_param("fileKey", file_key))
            .and(header("X-Download", tag))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload))
            .expect(1)
            .mount(&server)
            .await;
    }

    let conn = connection(&server);
    let one = [HttpHeader::new("X-Download", "one")];
    let two = [HttpHeader::new("X-Download", "two")];
    let (a, b) = tokio::join!(
        conn.request_file_with_headers("GET", "FILE", json!({"fileKey": "a"}), &one),
        conn.request_file_with_headers("GET", "FILE", json!({"fileKey": "b"}), &two),
    );

    assert_eq!(a.unwrap().as_ref(), b"AAAA");
    assert_eq!(b.unwrap().as_ref(), b"BBBB");
}

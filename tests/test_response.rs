use std::time::{Duration, SystemTime, UNIX_EPOCH};

use lantern::http::response::{Body, Response, ResponseBuilder, StatusCode};

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
    assert_eq!(StatusCode::Forbidden.reason_phrase(), "Forbidden");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
}

#[test]
fn test_response_builder_basic() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(b"Hello, World!".to_vec())
        .build();

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.version, "HTTP/1.1");
    assert_eq!(response.body, Body::Bytes(b"Hello, World!".to_vec()));
}

#[test]
fn test_response_builder_auto_content_length() {
    let body = b"This is the body".to_vec();
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(body.clone())
        .build();

    let content_length = response.headers.get("Content-Length").unwrap();
    assert_eq!(content_length, &body.len().to_string());
}

#[test]
fn test_response_builder_preserves_custom_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", "999")
        .body(b"test".to_vec())
        .build();

    // Should keep the custom value
    assert_eq!(response.headers.get("Content-Length").unwrap(), "999");
}

#[test]
fn test_response_builder_empty_body() {
    let response = ResponseBuilder::new(StatusCode::NotFound).build();

    assert_eq!(response.body, Body::Empty);
    assert!(response.body.is_empty());
    assert_eq!(response.headers.get("Content-Length").unwrap(), "0");
}

#[test]
fn test_response_builder_file_body_uses_declared_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .file("/srv/www/logo.png", 4096)
        .build();

    assert_eq!(response.body.len(), 4096);
    assert_eq!(response.headers.get("Content-Length").unwrap(), "4096");
}

#[test]
fn test_response_file_helper() {
    let response = Response::file("/srv/www/index.html", 12, "text/html; charset=utf-8");

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(
        response.headers.get("Content-Type").unwrap(),
        "text/html; charset=utf-8"
    );
    assert_eq!(
        response.body,
        Body::File {
            path: "/srv/www/index.html".into(),
            len: 12,
        }
    );
    assert!(!response.is_close());
}

#[test]
fn test_response_not_found_helper() {
    let response = Response::not_found();

    assert_eq!(response.status, StatusCode::NotFound);
    assert_eq!(response.body, Body::Bytes(b"404 Not Found".to_vec()));
    assert!(!response.is_close());
}

#[test]
fn test_response_forbidden_helper() {
    let response = Response::forbidden();

    assert_eq!(response.status, StatusCode::Forbidden);
    assert_eq!(response.body, Body::Bytes(b"403 Forbidden".to_vec()));
    assert_eq!(response.headers.get("Content-Length").unwrap(), "13");
}

#[test]
fn test_response_bad_request_always_closes() {
    let response = Response::bad_request();

    assert_eq!(response.status, StatusCode::BadRequest);
    assert_eq!(response.body, Body::Bytes(b"400 Bad Request".to_vec()));
    assert!(response.is_close());
    assert_eq!(response.headers.get("Connection").unwrap(), "close");
}

#[test]
fn test_response_set_close_is_idempotent() {
    let mut response = Response::not_found();
    response.set_close();
    response.set_close();

    assert!(response.is_close());
    assert_eq!(
        response.headers.keys().filter(|k| *k == "Connection").count(),
        1
    );
}

#[test]
fn test_response_set_date_uses_imf_fixdate() {
    let mut response = Response::not_found();
    response.set_date(UNIX_EPOCH + Duration::from_secs(784_111_777));

    assert_eq!(
        response.headers.get("Date").unwrap(),
        "Sun, 06 Nov 1994 08:49:37 GMT"
    );

    response.set_date(SystemTime::now());
    assert!(httpdate::parse_http_date(response.headers.get("Date").unwrap()).is_ok());
}

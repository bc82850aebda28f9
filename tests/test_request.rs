//! Tests for the request type and builder

use devgate::http::request::{Method, RequestBuilder};

#[test]
fn test_builder_defaults() {
    let req = RequestBuilder::new()
        .method(Method::GET)
        .target("/api/users")
        .build()
        .unwrap();

    assert_eq!(req.version, "HTTP/1.1");
    assert!(req.body.is_empty());
}

#[test]
fn test_builder_requires_method_and_target() {
    assert!(RequestBuilder::new().target("/").build().is_err());
    assert!(RequestBuilder::new().method(Method::GET).build().is_err());
}

#[test]
fn test_path_and_query_split() {
    let req = RequestBuilder::new()
        .method(Method::GET)
        .target("/api/users?id=5&sort=asc")
        .build()
        .unwrap();

    assert_eq!(req.path(), "/api/users");
    assert_eq!(req.query(), Some("id=5&sort=asc"));
}

#[test]
fn test_path_without_query() {
    let req = RequestBuilder::new()
        .method(Method::GET)
        .target("/api/users")
        .build()
        .unwrap();

    assert_eq!(req.path(), "/api/users");
    assert_eq!(req.query(), None);
}

#[test]
fn test_header_lookup_ignores_case() {
    let req = RequestBuilder::new()
        .method(Method::GET)
        .target("/")
        .header("Content-Type", "application/json")
        .build()
        .unwrap();

    assert_eq!(req.header("content-type"), Some("application/json"));
    assert_eq!(req.header("CONTENT-TYPE"), Some("application/json"));
}

#[test]
fn test_content_length_parsing() {
    let req = RequestBuilder::new()
        .method(Method::POST)
        .target("/")
        .header("Content-Length", "42")
        .build()
        .unwrap();

    assert_eq!(req.content_length(), 42);
}

#[test]
fn test_content_length_missing_is_zero() {
    let req = RequestBuilder::new()
        .method(Method::GET)
        .target("/")
        .build()
        .unwrap();

    assert_eq!(req.content_length(), 0);
}

#[test]
fn test_keep_alive_default_per_version() {
    let http11 = RequestBuilder::new()
        .method(Method::GET)
        .target("/")
        .build()
        .unwrap();
    assert!(http11.keep_alive());

    let http10 = RequestBuilder::new()
        .method(Method::GET)
        .target("/")
        .version("HTTP/1.0")
        .build()
        .unwrap();
    assert!(!http10.keep_alive());
}

#[test]
fn test_explicit_connection_header_wins() {
    let close = RequestBuilder::new()
        .method(Method::GET)
        .target("/")
        .header("Connection", "close")
        .build()
        .unwrap();
    assert!(!close.keep_alive());

    let keep = RequestBuilder::new()
        .method(Method::GET)
        .target("/")
        .version("HTTP/1.0")
        .header("Connection", "keep-alive")
        .build()
        .unwrap();
    assert!(keep.keep_alive());
}

#[test]
fn test_method_round_trip() {
    for s in ["GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH"] {
        assert_eq!(Method::from_str(s).unwrap().as_str(), s);
    }

    assert_eq!(Method::from_str("TRACE"), None);
}

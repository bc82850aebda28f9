//! Tests for response construction

use devgate::http::response::{Response, ResponseBuilder, StatusCode};

#[test]
fn test_status_code_numbers() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::BadGateway.as_u16(), 502);
    assert_eq!(StatusCode::GatewayTimeout.as_u16(), 504);
}

#[test]
fn test_reason_phrases() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::BadGateway.reason_phrase(), "Bad Gateway");
    assert_eq!(StatusCode::ServiceUnavailable.reason_phrase(), "Service Unavailable");
}

#[test]
fn test_from_u16_known_codes() {
    assert_eq!(StatusCode::from_u16(200), StatusCode::Ok);
    assert_eq!(StatusCode::from_u16(301), StatusCode::MovedPermanently);
    assert_eq!(StatusCode::from_u16(502), StatusCode::BadGateway);
}

#[test]
fn test_from_u16_preserves_unknown_codes() {
    let status = StatusCode::from_u16(418);

    assert_eq!(status, StatusCode::Other(418));
    assert_eq!(status.as_u16(), 418);
    assert_eq!(status.reason_phrase(), "");
}

#[test]
fn test_builder_sets_content_length() {
    let resp = ResponseBuilder::new(StatusCode::Ok)
        .body(b"hello".to_vec())
        .build();

    assert_eq!(resp.header("Content-Length"), Some("5"));
}

#[test]
fn test_builder_keeps_explicit_content_length() {
    let resp = ResponseBuilder::new(StatusCode::Ok)
        .header("content-length", "99")
        .build();

    assert_eq!(resp.header("Content-Length"), Some("99"));
}

#[test]
fn test_header_lookup_ignores_case() {
    let resp = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/html")
        .build();

    assert_eq!(resp.header("content-type"), Some("text/html"));
}

#[test]
fn test_ok_helper() {
    let resp = Response::ok("hi");

    assert_eq!(resp.status, StatusCode::Ok);
    assert_eq!(resp.body, b"hi");
}

#[test]
fn test_error_helpers() {
    assert_eq!(Response::not_found().status, StatusCode::NotFound);
    assert_eq!(Response::internal_error().status, StatusCode::InternalServerError);
    assert_eq!(Response::bad_gateway("x").status, StatusCode::BadGateway);
    assert_eq!(Response::gateway_timeout("x").status, StatusCode::GatewayTimeout);

    let mna = Response::method_not_allowed();
    assert_eq!(mna.status, StatusCode::MethodNotAllowed);
    assert_eq!(mna.header("Allow"), Some("GET, HEAD"));
}

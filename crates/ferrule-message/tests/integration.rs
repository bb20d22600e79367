use ferrule_log::MemoryLogger;
use ferrule_message::{
    Body, BodyState, ClientResponse, Error, Message, ReaderStream, Request,
    SimpleRequest, SimpleResponse, Uri,
};
use std::io::{Cursor, SeekFrom};
use std::sync::Arc;

fn request() -> SimpleRequest {
    SimpleRequest::new("GET", Uri::parse("https://example.com/a/b?x=1").expect("valid uri"))
}

#[test]
fn test_seekable_body_consumed_elsewhere_is_still_read_in_full() {
    let body = Body::from("TEST_BODY");
    body.seek(SeekFrom::End(0)).expect("seek");

    let response = ClientResponse::new(request(), SimpleResponse::default().with_body(body));
    assert_eq!(response.text().expect("body"), "TEST_BODY");
}

#[test]
fn test_reader_body_partly_consumed_yields_remainder_once() {
    let body = Body::new(ReaderStream::new(Cursor::new(b"TEST_BODY".to_vec())));
    body.read(5).expect("read");

    let logger = Arc::new(MemoryLogger::new());
    let response = ClientResponse::new(request(), SimpleResponse::default().with_body(body))
        .with_logger(logger.clone());

    assert_eq!(response.text().expect("body"), "BODY");
    assert_eq!(response.text().expect("cached body"), "BODY");
    assert_eq!(logger.len(), 1);
    assert_eq!(response.body_state(), BodyState::Partial("BODY".to_string()));
}

#[test]
fn test_reader_body_drained_elsewhere_is_unavailable() {
    let body = Body::new(ReaderStream::new(Cursor::new(b"TEST_BODY".to_vec())));
    body.get_contents().expect("drain");

    let response = ClientResponse::new(request(), SimpleResponse::default().with_body(body));
    let err = response.text().unwrap_err();
    assert!(matches!(err, Error::NoBodyAvailable { .. }));
    assert!(err.to_string().contains("no body available"));
}

#[test]
fn test_two_content_types_are_ambiguous() {
    let response = ClientResponse::new(
        request(),
        SimpleResponse::default()
            .with_header("Content-Type", "application/json")
            .with_added_header("content-type", "text/html"),
    );
    assert_eq!(response.bare_content_type(), None);
    assert!(!response.is_content_type("application", Some("json")));
    assert!(response.header_one_strict("Content-Type").is_err());
}

#[test]
fn test_not_modified_and_temporary_redirect() {
    let not_modified = ClientResponse::new(request(), SimpleResponse::new(304, "Not Modified"));
    assert!(!not_modified.is_redirect());
    assert!(not_modified.is_success());

    let redirect = ClientResponse::new(request(), SimpleResponse::new(307, "Temporary Redirect"));
    assert!(redirect.is_redirect());
    assert!(!redirect.is_success());
}

#[test]
fn test_too_many_slashes_after_scheme() {
    let err = Uri::parse("https:////example.com").unwrap_err();
    assert!(matches!(err, Error::MalformedUri { .. }));
}

#[test]
fn test_response_keeps_its_request() {
    let response = ClientResponse::new(request(), SimpleResponse::new(201, "Created"));
    assert_eq!(response.request().method(), "GET");
    assert_eq!(response.request().request_target(), "/a/b?x=1");
    assert_eq!(response.request().uri().host(), "example.com");

    let moved = response.with_header("Location", "/a/b/1");
    assert_eq!(moved.request().uri().host(), "example.com");
    assert_eq!(moved.header_line("location"), "/a/b/1");
    assert!(!response.has_header("location"));
}

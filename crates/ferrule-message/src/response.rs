//! Response wrapper returned by the client.
//!
//! [`ClientResponse`] decorates a response value with the request that produced
//! it, an optional [`Logger`] and a body cache. The body is read from its stream
//! at most once per wrapper; after that the cached text is returned no matter
//! what happened to the stream since.

use crate::decorator::Decorator;
use crate::error::{Error, HeaderCount, Result};
use crate::message::{Message, Response, SimpleRequest, SimpleResponse};
use crate::stream::ByteStream;
use ferrule_log::{LogContext, Logger};
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// What the wrapper has captured from the body stream so far.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BodyState {
    /// Nothing read yet.
    #[default]
    Uncached,
    /// The complete body.
    Full(String),
    /// Only what was left after someone else had read part of a forward-only
    /// stream.
    Partial(String),
}

/// A response together with the request that produced it.
pub struct ClientResponse<R = SimpleResponse, Q = SimpleRequest> {
    request: Q,
    response: R,
    logger: Option<Arc<dyn Logger>>,
    cache: Mutex<BodyState>,
}

impl<R, Q> ClientResponse<R, Q> {
    pub fn new(request: Q, response: R) -> Self {
        Self {
            request,
            response,
            logger: None,
            cache: Mutex::new(BodyState::Uncached),
        }
    }

    /// Attach the logger that receives warnings about partial bodies and
    /// ambiguous headers.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn request(&self) -> &Q {
        &self.request
    }

    pub fn response(&self) -> &R {
        &self.response
    }

    pub fn logger(&self) -> Option<&Arc<dyn Logger>> {
        self.logger.as_ref()
    }

    pub fn body_state(&self) -> BodyState {
        self.cache.lock().clone()
    }

    pub fn into_parts(self) -> (Q, R) {
        (self.request, self.response)
    }

    fn warn(&self, message: &str, context: LogContext) {
        if let Some(logger) = &self.logger {
            logger.warn(message, &context);
        }
    }
}

impl<R: Response + Clone, Q: Clone> ClientResponse<R, Q> {
    /// The body as text, read from the stream on first use.
    ///
    /// A seekable stream is rewound and read in full. A forward-only stream
    /// still at position zero is read to the end. A forward-only stream that
    /// was partly consumed elsewhere yields only the remainder, and a warning
    /// is logged. A forward-only stream that is already drained fails with
    /// [`Error::NoBodyAvailable`].
    pub fn text(&self) -> Result<String> {
        let (text, warning) = {
            let mut cache = self.cache.lock();
            if let BodyState::Full(text) | BodyState::Partial(text) = &*cache {
                return Ok(text.clone());
            }
            let (state, warning) = self.materialize()?;
            let text = match &state {
                BodyState::Full(text) | BodyState::Partial(text) => text.clone(),
                BodyState::Uncached => String::new(),
            };
            *cache = state;
            (text, warning)
        };

        // Locks are released here: the logger may render this response.
        if let Some(context) = warning {
            self.warn(
                "Retrieved body from non-seekable stream with non-zero position.",
                context,
            );
        }
        Ok(text)
    }

    fn materialize(&self) -> Result<(BodyState, Option<LogContext>)> {
        let mut stream = self.response.body().lock();
        let seekable = stream.is_seekable();
        let position = stream.tell()?;
        tracing::debug!(seekable, position, "materializing response body");

        if seekable {
            stream.rewind()?;
            Ok((BodyState::Full(lossy(&stream.get_contents()?)), None))
        } else if position == 0 {
            Ok((BodyState::Full(lossy(&stream.get_contents()?)), None))
        } else if stream.eof() {
            Err(Error::NoBodyAvailable {
                reason: "stream is not seekable and is at end of stream".to_string(),
            })
        } else {
            let mut context = LogContext::new();
            context.insert("position".to_string(), Value::from(position));
            Ok((BodyState::Partial(lossy(&stream.get_contents()?)), Some(context)))
        }
    }

    /// The single value of `name`.
    ///
    /// `None` when the header is absent or has several values; the latter
    /// also logs a warning.
    pub fn header_one(&self, name: &str) -> Option<&str> {
        match self.response.header(name) {
            [] => None,
            [value] => Some(value.as_str()),
            values => {
                let mut context = LogContext::new();
                context.insert(name.to_string(), Value::from(values.to_vec()));
                self.warn("Unexpected multiple headers found.", context);
                None
            }
        }
    }

    /// The single value of `name`, failing when there are zero or several.
    pub fn header_one_strict(&self, name: &str) -> Result<&str> {
        match self.response.header(name) {
            [value] => Ok(value.as_str()),
            [] => Err(Error::AmbiguousHeader {
                name: name.to_string(),
                found: HeaderCount::Missing,
            }),
            values => Err(Error::AmbiguousHeader {
                name: name.to_string(),
                found: HeaderCount::Multiple(values.to_vec()),
            }),
        }
    }

    /// Content-Type without parameters, e.g. `text/html` for
    /// `text/html; charset=utf-8`.
    pub fn bare_content_type(&self) -> Option<&str> {
        self.header_one("content-type")
            .and_then(|value| value.split(';').next())
            .map(str::trim)
    }

    /// Exact match on `kind/subtype`.
    ///
    /// With no subtype, `kind` may be a full `type/subtype` to match exactly, or
    /// just a primary type, in which case this is [`Self::type_is`].
    pub fn is_content_type(&self, kind: &str, subtype: Option<&str>) -> bool {
        let Some(bare) = self.bare_content_type() else {
            return false;
        };
        match subtype {
            Some(subtype) => bare == format!("{kind}/{subtype}"),
            None if kind.contains('/') => bare == kind,
            None => self.type_is(kind),
        }
    }

    /// Whether the primary type is `primary`.
    pub fn type_is(&self, primary: &str) -> bool {
        if primary.contains('/') {
            return false;
        }
        self.bare_content_type()
            .is_some_and(|bare| bare.starts_with(&format!("{primary}/")))
    }

    /// Whether `name` is the subtype or one of its `+` suffixes, so
    /// `application/vnd.api+json` matches both `vnd.api` and `json`.
    pub fn subtype_is(&self, name: &str) -> bool {
        let Some(bare) = self.bare_content_type() else {
            return false;
        };
        match bare.split('/').collect::<Vec<_>>().as_slice() {
            [_, subtype] => subtype.split('+').any(|part| part == name),
            _ => false,
        }
    }

    pub fn loose_type_is(&self, primary: &str, subtype: &str) -> bool {
        self.type_is(primary) && self.subtype_is(subtype)
    }

    /// 3xx other than 304.
    pub fn is_redirect(&self) -> bool {
        let status = self.response.status_code();
        (300..=399).contains(&status) && status != 304
    }

    /// 2xx, or 304.
    pub fn is_success(&self) -> bool {
        let status = self.response.status_code();
        (200..=299).contains(&status) || status == 304
    }

    /// 4xx or 5xx.
    pub fn is_error(&self) -> bool {
        (400..=599).contains(&self.response.status_code())
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

impl<R: Message + Clone, Q: Clone> Decorator for ClientResponse<R, Q> {
    type Inner = R;

    fn inner(&self) -> &R {
        &self.response
    }

    /// The copy keeps the cached body unless `inner` carries a different body.
    fn with_inner(&self, inner: R) -> Self {
        let cache = if inner.body().ptr_eq(self.response.body()) {
            self.cache.lock().clone()
        } else {
            BodyState::Uncached
        };
        Self {
            request: self.request.clone(),
            response: inner,
            logger: self.logger.clone(),
            cache: Mutex::new(cache),
        }
    }
}

impl<R: Clone, Q: Clone> Clone for ClientResponse<R, Q> {
    fn clone(&self) -> Self {
        Self {
            request: self.request.clone(),
            response: self.response.clone(),
            logger: self.logger.clone(),
            cache: Mutex::new(self.cache.lock().clone()),
        }
    }
}

impl<R: fmt::Debug, Q: fmt::Debug> fmt::Debug for ClientResponse<R, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientResponse")
            .field("request", &self.request)
            .field("response", &self.response)
            .field("logger", &self.logger.is_some())
            .field("cache", &*self.cache.lock())
            .finish()
    }
}

/// Diagnostic rendering: status line, headers, blank line, body.
impl<R: Response + Clone, Q: Clone> fmt::Display for ClientResponse<R, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "HTTP/{} {} {}",
            self.response.protocol_version(),
            self.response.status_code(),
            self.response.reason_phrase()
        )?;
        for (name, values) in self.response.headers().iter() {
            writeln!(f, "{}: {}", name, values.join(", "))?;
        }
        writeln!(f)?;

        match self.text() {
            Ok(text) => match self.body_state() {
                BodyState::Partial(_) => write!(f, "[...] {}", text),
                _ => f.write_str(&text),
            },
            Err(_) => f.write_str("[Body not available.]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Request;
    use crate::stream::{Body, MemoryStream, ReaderStream};
    use ferrule_log::{LogLevel, MemoryLogger};
    use std::io::{Cursor, SeekFrom};
    use test_case::test_case;

    fn wrap(response: SimpleResponse) -> ClientResponse {
        ClientResponse::new(SimpleRequest::default(), response)
    }

    fn wrap_logged(response: SimpleResponse) -> (ClientResponse, Arc<MemoryLogger>) {
        let logger = Arc::new(MemoryLogger::new());
        let wrapped = wrap(response).with_logger(logger.clone());
        (wrapped, logger)
    }

    fn with_body(stream: MemoryStream) -> SimpleResponse {
        SimpleResponse::default().with_body(Body::new(stream))
    }

    fn with_content_type(value: &str) -> ClientResponse {
        wrap(SimpleResponse::default().with_header("Content-Type", value))
    }

    #[test]
    fn test_seekable_stream_at_end_is_rewound() {
        let body = Body::from("TEST_BODY");
        body.seek(SeekFrom::End(0)).unwrap();
        let rsp = wrap(SimpleResponse::default().with_body(body));

        assert_eq!(rsp.text().unwrap(), "TEST_BODY");
        assert_eq!(rsp.body_state(), BodyState::Full("TEST_BODY".into()));
    }

    #[test]
    fn test_partly_read_forward_only_stream_yields_remainder() {
        let response = with_body(MemoryStream::forward_only("TEST_BODY"));
        response.body().read(5).unwrap();
        let (rsp, logger) = wrap_logged(response);

        assert_eq!(rsp.text().unwrap(), "BODY");
        assert_eq!(rsp.body_state(), BodyState::Partial("BODY".into()));

        let record = logger.last().unwrap();
        assert_eq!(record.level, LogLevel::Warn);
        assert_eq!(
            record.message,
            "Retrieved body from non-seekable stream with non-zero position."
        );
        assert_eq!(record.context["position"], 5);
    }

    #[test]
    fn test_drained_forward_only_stream_has_no_body() {
        let response = with_body(MemoryStream::forward_only("TEST_BODY"));
        response.body().get_contents().unwrap();
        let rsp = wrap(response);

        assert!(matches!(rsp.text(), Err(Error::NoBodyAvailable { .. })));
        assert_eq!(rsp.body_state(), BodyState::Uncached);
    }

    #[test]
    fn test_reader_stream_read_exactly_to_end_has_no_body() {
        let body = Body::new(ReaderStream::new(Cursor::new(b"TEST_BODY".to_vec())));
        assert_eq!(body.read(9).unwrap(), "TEST_BODY".as_bytes());
        let (rsp, logger) = wrap_logged(SimpleResponse::default().with_body(body));

        assert!(matches!(rsp.text(), Err(Error::NoBodyAvailable { .. })));
        assert!(logger.is_empty());
    }

    #[test]
    fn test_forward_only_stream_at_start_is_read_in_full() {
        let rsp = wrap(with_body(MemoryStream::forward_only("TEST_BODY")));
        assert_eq!(rsp.text().unwrap(), "TEST_BODY");
        assert_eq!(rsp.body_state(), BodyState::Full("TEST_BODY".into()));
    }

    #[test]
    fn test_empty_forward_only_stream_is_an_empty_body() {
        let rsp = wrap(with_body(MemoryStream::forward_only("")));
        assert_eq!(rsp.text().unwrap(), "");
    }

    #[test]
    fn test_text_is_cached_after_stream_is_drained() {
        let rsp = wrap(with_body(MemoryStream::forward_only("TEST_BODY")));
        let first = rsp.text().unwrap();
        assert!(rsp.body().eof());
        assert_eq!(rsp.text().unwrap(), first);
    }

    #[test]
    fn test_cached_text_ignores_later_stream_changes() {
        let body = Body::from("TEST_BODY");
        let rsp = wrap(SimpleResponse::default().with_body(body.clone()));
        assert_eq!(rsp.text().unwrap(), "TEST_BODY");

        body.read(3).unwrap();
        assert_eq!(rsp.text().unwrap(), "TEST_BODY");
    }

    #[test]
    fn test_new_body_starts_uncached() {
        let rsp = wrap(SimpleResponse::default().with_body(Body::from("old")));
        assert_eq!(rsp.text().unwrap(), "old");

        let changed = rsp.with_body(Body::from("new"));
        assert_eq!(changed.body_state(), BodyState::Uncached);
        assert_eq!(changed.text().unwrap(), "new");
        assert_eq!(rsp.text().unwrap(), "old");
    }

    #[test]
    fn test_header_and_status_mutations_keep_drained_body() {
        let rsp = wrap(with_body(MemoryStream::forward_only("TEST_BODY")));
        assert_eq!(rsp.text().unwrap(), "TEST_BODY");
        assert!(rsp.body().eof());

        let traced = rsp.with_header("X-Trace", "1");
        assert_eq!(traced.body_state(), BodyState::Full("TEST_BODY".into()));
        assert_eq!(traced.text().unwrap(), "TEST_BODY");

        let failed = traced.with_status(500, "Internal Server Error");
        assert_eq!(failed.text().unwrap(), "TEST_BODY");
        assert_eq!(failed.status_code(), 500);
    }

    #[test]
    fn test_same_body_handle_keeps_cache() {
        let rsp = wrap(with_body(MemoryStream::forward_only("TEST_BODY")));
        rsp.text().unwrap();
        let same = rsp.with_body(rsp.body().clone());
        assert_eq!(same.body_state(), BodyState::Full("TEST_BODY".into()));
    }

    /// Renders the response it is given from inside `log`.
    struct RenderingLogger {
        target: parking_lot::Mutex<Option<ClientResponse>>,
        rendered: parking_lot::Mutex<Vec<String>>,
    }

    impl Logger for RenderingLogger {
        fn log(&self, _level: LogLevel, _message: &str, _context: &LogContext) {
            if let Some(rsp) = self.target.lock().take() {
                self.rendered.lock().push(rsp.to_string());
            }
        }
    }

    #[test]
    fn test_logger_may_render_response_during_warning() {
        let logger = Arc::new(RenderingLogger {
            target: parking_lot::Mutex::new(None),
            rendered: parking_lot::Mutex::new(Vec::new()),
        });
        let response = with_body(MemoryStream::forward_only("TEST_BODY"));
        response.body().read(5).unwrap();
        let rsp = wrap(response).with_logger(logger.clone());
        *logger.target.lock() = Some(rsp.clone());

        assert_eq!(rsp.text().unwrap(), "BODY");
        let rendered = logger.rendered.lock();
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0].ends_with("\n\n[Body not available.]"));
    }

    #[test]
    fn test_header_one() {
        let (rsp, logger) = wrap_logged(
            SimpleResponse::default()
                .with_header("X-One", "1")
                .with_header("X-Two", ["a", "b"]),
        );

        assert_eq!(rsp.header_one("x-one"), Some("1"));
        assert_eq!(rsp.header_one("x-none"), None);
        assert!(logger.is_empty());

        assert_eq!(rsp.header_one("X-Two"), None);
        let record = logger.last().unwrap();
        assert_eq!(record.message, "Unexpected multiple headers found.");
        assert_eq!(record.context["X-Two"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_header_one_strict() {
        let rsp = wrap(
            SimpleResponse::default()
                .with_header("X-One", "1")
                .with_header("X-Two", ["a", "b"]),
        );

        assert_eq!(rsp.header_one_strict("X-One").unwrap(), "1");
        assert!(matches!(
            rsp.header_one_strict("X-None"),
            Err(Error::AmbiguousHeader { found: HeaderCount::Missing, .. })
        ));
        match rsp.header_one_strict("X-Two") {
            Err(Error::AmbiguousHeader {
                found: HeaderCount::Multiple(values),
                ..
            }) => assert_eq!(values, ["a", "b"]),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_bare_content_type() {
        assert_eq!(
            with_content_type("text/html; charset=utf-8").bare_content_type(),
            Some("text/html")
        );
        assert_eq!(with_content_type(" text/plain ").bare_content_type(), Some("text/plain"));
        assert_eq!(wrap(SimpleResponse::default()).bare_content_type(), None);
    }

    #[test]
    fn test_multiple_content_types_are_unusable() {
        let rsp = wrap(
            SimpleResponse::default()
                .with_header("Content-Type", "application/json")
                .with_added_header("Content-Type", "text/html"),
        );
        assert_eq!(rsp.bare_content_type(), None);
        assert!(!rsp.is_content_type("application", Some("json")));
        assert!(!rsp.type_is("application"));
    }

    #[test_case("text/html", "text", Some("html"), true ; "type and subtype")]
    #[test_case("text/html", "text/html", None, true ; "full type")]
    #[test_case("text/html", "text", None, true ; "primary only")]
    #[test_case("text/html", "text", Some("plain"), false ; "other subtype")]
    #[test_case("text/html", "text/plain", None, false ; "other full type")]
    #[test_case("Text/HTML", "text", Some("html"), false ; "case sensitive")]
    #[test_case("application/vnd.api+json", "application", Some("json"), false ; "suffix is not exact")]
    fn test_is_content_type(header: &str, kind: &str, subtype: Option<&str>, expected: bool) {
        assert_eq!(with_content_type(header).is_content_type(kind, subtype), expected);
    }

    #[test_case("text/html", "text", true ; "matching primary")]
    #[test_case("text/html", "application", false ; "other primary")]
    #[test_case("text/html", "tex", false ; "prefix of primary")]
    #[test_case("text/html", "text/html", false ; "slash in argument")]
    fn test_type_is(header: &str, primary: &str, expected: bool) {
        assert_eq!(with_content_type(header).type_is(primary), expected);
    }

    #[test_case("application/vnd.api+json", "json", true ; "suffix")]
    #[test_case("application/vnd.api+json", "vnd.api", true ; "base subtype")]
    #[test_case("application/json", "json", true ; "plain subtype")]
    #[test_case("application/json", "xml", false ; "other subtype")]
    #[test_case("application/json/extra", "json", false ; "three segments")]
    #[test_case("json", "json", false ; "no slash")]
    fn test_subtype_is(header: &str, name: &str, expected: bool) {
        assert_eq!(with_content_type(header).subtype_is(name), expected);
    }

    #[test]
    fn test_loose_type_is() {
        let rsp = with_content_type("application/problem+json; charset=utf-8");
        assert!(rsp.loose_type_is("application", "json"));
        assert!(rsp.loose_type_is("application", "problem"));
        assert!(!rsp.loose_type_is("text", "json"));
        assert!(!rsp.loose_type_is("application", "xml"));
    }

    #[test_case(200, false, true, false ; "ok")]
    #[test_case(299, false, true, false ; "last success")]
    #[test_case(301, true, false, false ; "moved permanently")]
    #[test_case(304, false, true, false ; "not modified")]
    #[test_case(307, true, false, false ; "temporary redirect")]
    #[test_case(404, false, false, true ; "not found")]
    #[test_case(599, false, false, true ; "last error")]
    #[test_case(600, false, false, false ; "out of range")]
    #[test_case(100, false, false, false ; "informational")]
    fn test_status_classification(code: u16, redirect: bool, success: bool, error: bool) {
        let rsp = wrap(SimpleResponse::new(code, ""));
        assert_eq!(rsp.is_redirect(), redirect);
        assert_eq!(rsp.is_success(), success);
        assert_eq!(rsp.is_error(), error);
    }

    #[test]
    fn test_display_full_body() {
        let rsp = wrap(
            SimpleResponse::new(200, "OK")
                .with_header("Content-Type", "text/plain")
                .with_header("X-Multi", ["a", "b"])
                .with_body(Body::from("hello")),
        );
        assert_eq!(
            rsp.to_string(),
            "HTTP/1.1 200 OK\nContent-Type: text/plain\nX-Multi: a, b\n\nhello"
        );
    }

    #[test]
    fn test_display_partial_body() {
        let response = with_body(MemoryStream::forward_only("TEST_BODY"));
        response.body().read(5).unwrap();
        let rsp = wrap(response.with_status(206, "Partial Content"));
        assert_eq!(rsp.to_string(), "HTTP/1.1 206 Partial Content\n\n[...] BODY");
    }

    #[test]
    fn test_display_missing_body() {
        let response = with_body(MemoryStream::forward_only("TEST_BODY"));
        response.body().get_contents().unwrap();
        let rsp = wrap(response.with_status(500, "Internal Server Error"));
        assert_eq!(
            rsp.to_string(),
            "HTTP/1.1 500 Internal Server Error\n\n[Body not available.]"
        );
    }

    #[test]
    fn test_wrapper_is_transparent_for_reads() {
        let inner = SimpleResponse::new(404, "Not Found").with_header("X", "1");
        let rsp = wrap(inner.clone());
        assert_eq!(rsp.status_code(), inner.status_code());
        assert_eq!(rsp.reason_phrase(), inner.reason_phrase());
        assert_eq!(rsp.headers(), inner.headers());
        assert_eq!(rsp.request().method(), "GET");

        let changed = rsp.with_status(410, "");
        assert_eq!(changed.reason_phrase(), "Not Found");
        assert_eq!(rsp.status_code(), 404);
    }

    #[test]
    fn test_wrapper_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClientResponse>();
    }
}

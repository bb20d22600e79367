//! The request-sending facade.

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::factory::{RequestFactory, StreamFactory, UriFactory};
use crate::provider::{Capabilities, Provider};
use crate::sender::Sender;
use ferrule_log::{LogContext, LogLevel, Logger};
use ferrule_message::{
    Body, ClientResponse, Headers, Message, Request, Response, SimpleRequest, Uri,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use url::form_urlencoded;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Anything the client accepts as a request URI.
pub trait IntoUri {
    fn into_uri(self, factory: &dyn UriFactory) -> ferrule_message::Result<Uri>;
}

impl IntoUri for Uri {
    fn into_uri(self, _factory: &dyn UriFactory) -> ferrule_message::Result<Uri> {
        Ok(self)
    }
}

impl IntoUri for &Uri {
    fn into_uri(self, _factory: &dyn UriFactory) -> ferrule_message::Result<Uri> {
        Ok(self.clone())
    }
}

impl IntoUri for &str {
    fn into_uri(self, factory: &dyn UriFactory) -> ferrule_message::Result<Uri> {
        factory.create_uri(self)
    }
}

impl IntoUri for String {
    fn into_uri(self, factory: &dyn UriFactory) -> ferrule_message::Result<Uri> {
        factory.create_uri(&self)
    }
}

impl IntoUri for &String {
    fn into_uri(self, factory: &dyn UriFactory) -> ferrule_message::Result<Uri> {
        factory.create_uri(self)
    }
}

/// Body of a POST request.
#[derive(Debug, Clone)]
pub enum PostBody {
    /// Sent as `application/x-www-form-urlencoded`; sets Content-Type.
    Form(Vec<(String, String)>),
    /// Sent as is. The caller sets Content-Type.
    Text(String),
    /// Sent as is. The caller sets Content-Type.
    Stream(Body),
}

impl Default for PostBody {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for PostBody {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for PostBody {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Body> for PostBody {
    fn from(body: Body) -> Self {
        Self::Stream(body)
    }
}

impl From<Vec<(String, String)>> for PostBody {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::Form(pairs)
    }
}

impl From<&[(&str, &str)]> for PostBody {
    fn from(pairs: &[(&str, &str)]) -> Self {
        Self::Form(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl<const N: usize> From<[(&str, &str); N]> for PostBody {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self::from(&pairs[..])
    }
}

/// Sends requests through an injected [`Sender`] and turns error statuses into
/// errors.
///
/// # Example
///
/// ```
/// use ferrule_client::{Client, Provider, SendError, SenderFn};
/// use ferrule_message::{Headers, Message, SimpleRequest, SimpleResponse};
/// use std::sync::Arc;
///
/// let sender = SenderFn::new(|_: &SimpleRequest| -> Result<SimpleResponse, SendError> {
///     Ok(SimpleResponse::new(200, "OK").with_body("hello".into()))
/// });
/// let providers: Vec<Arc<dyn Provider>> = vec![Arc::new(sender)];
/// let client = Client::new(providers).unwrap();
///
/// let response = client.get("https://example.com/", &[], &Headers::new()).unwrap();
/// assert_eq!(response.text().unwrap(), "hello");
/// ```
pub struct Client {
    sender: Arc<dyn Sender>,
    request_factory: Arc<dyn RequestFactory>,
    uri_factory: Arc<dyn UriFactory>,
    stream_factory: Arc<dyn StreamFactory>,
    logger: Arc<dyn Logger>,
    config: ClientConfig,
}

impl Client {
    /// Build from providers with the default configuration.
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> Result<Self> {
        Self::with_config(providers, ClientConfig::default())
    }

    /// Build from providers. A sender must be among them.
    pub fn with_config(providers: Vec<Arc<dyn Provider>>, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let caps = Capabilities::resolve(&providers)?;
        Ok(Self {
            sender: caps.sender,
            request_factory: caps.request_factory,
            uri_factory: caps.uri_factory,
            stream_factory: caps.stream_factory,
            logger: caps.logger,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Return error statuses as responses instead of failing.
    pub fn set_error_is_acceptable(&mut self, acceptable: bool) -> &mut Self {
        self.config.error_is_acceptable = acceptable;
        self
    }

    /// Log error statuses at error/info level; otherwise they go to debug.
    pub fn set_log_errors(&mut self, log_errors: bool) -> &mut Self {
        self.config.log_errors = log_errors;
        self
    }

    /// GET `uri`, merging `query` into its query string.
    ///
    /// Keys already in the URI are overwritten in place; new keys are
    /// appended.
    pub fn get(
        &self,
        uri: impl IntoUri,
        query: &[(&str, &str)],
        headers: &Headers,
    ) -> Result<ClientResponse> {
        let mut uri = uri.into_uri(self.uri_factory.as_ref())?;
        if !query.is_empty() {
            uri = uri.with_query(&merge_query(uri.query(), query));
        }
        let request = self.build_request("GET", uri, headers, |request| Ok(request))?;
        self.send_request(request)
    }

    /// POST `body` to `uri`.
    ///
    /// Caller headers are applied last, so they can override the
    /// Content-Type a form body sets.
    pub fn post(
        &self,
        uri: impl IntoUri,
        body: impl Into<PostBody>,
        headers: &Headers,
    ) -> Result<ClientResponse> {
        let uri = uri.into_uri(self.uri_factory.as_ref())?;
        let body = body.into();
        let request = self.build_request("POST", uri, headers, |request| {
            Ok(match body {
                PostBody::Form(pairs) => request
                    .with_body(self.stream_factory.create_stream(&encode_form(&pairs)))
                    .with_header("Content-Type", FORM_CONTENT_TYPE),
                PostBody::Text(text) => request.with_body(self.stream_factory.create_stream(&text)),
                PostBody::Stream(stream) => request.with_body(stream),
            })
        })?;
        self.send_request(request)
    }

    /// POST `value` serialized as JSON.
    pub fn post_json<T: Serialize + ?Sized>(
        &self,
        uri: impl IntoUri,
        value: &T,
        headers: &Headers,
    ) -> Result<ClientResponse> {
        let uri = uri.into_uri(self.uri_factory.as_ref())?;
        let request = self.build_request("POST", uri, headers, |request| {
            let json = serde_json::to_string(value)?;
            Ok(request
                .with_body(self.stream_factory.create_stream(&json))
                .with_header("Content-Type", JSON_CONTENT_TYPE))
        })?;
        self.send_request(request)
    }

    /// Send a prepared request.
    ///
    /// The reply is wrapped in a [`ClientResponse`] sharing this client's
    /// logger. The status is then logged, and an error status fails with
    /// [`ClientError::HttpStatus`] unless errors are acceptable.
    pub fn send_request(&self, request: SimpleRequest) -> Result<ClientResponse> {
        tracing::debug!(method = request.method(), uri = %request.uri(), "sending request");
        let response = self
            .sender
            .send_request(&request)
            .map_err(|err| ClientError::from_send(&request, err))?;

        let response = ClientResponse::new(request, response).with_logger(self.logger.clone());
        self.handle_failure(response)
    }

    fn build_request(
        &self,
        method: &str,
        uri: Uri,
        headers: &Headers,
        with_body: impl FnOnce(SimpleRequest) -> Result<SimpleRequest>,
    ) -> Result<SimpleRequest> {
        let mut request = self
            .request_factory
            .create_request(method, uri)
            .with_protocol_version(self.config.protocol_version.clone());
        for (name, values) in &self.config.default_headers {
            request = request.with_header(name, values.clone());
        }
        let mut request = with_body(request)?;
        for (name, values) in headers.iter() {
            request = request.with_header(name, values.to_vec());
        }
        Ok(request)
    }

    fn handle_failure(&self, response: ClientResponse) -> Result<ClientResponse> {
        let status = response.status_code();
        let reason = match response.reason_phrase() {
            "" => "Unknown Error".to_string(),
            reason => reason.to_string(),
        };
        let method = response.request().method().to_string();
        let uri = response.request().uri().to_string();
        let message = format!("HTTP Status {status} {reason} for: {method} {uri}");
        let is_error = response.is_error();

        let level = match (is_error && self.config.log_errors, self.config.error_is_acceptable) {
            (true, true) => LogLevel::Info,
            (true, false) => LogLevel::Error,
            (false, _) => LogLevel::Debug,
        };
        let mut context = LogContext::new();
        context.insert("status".to_string(), Value::from(status));
        context.insert("reason".to_string(), Value::from(reason));
        context.insert("method".to_string(), Value::from(method));
        context.insert("uri".to_string(), Value::from(uri));
        self.logger.log(level, &message, &context);

        if is_error && !self.config.error_is_acceptable {
            return Err(ClientError::HttpStatus {
                status,
                message,
                response: Box::new(response),
            });
        }
        Ok(response)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Merge `params` into a raw query string.
pub fn merge_query(existing: &str, params: &[(&str, &str)]) -> String {
    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(existing.as_bytes())
        .into_owned()
        .collect();
    for (key, value) in params {
        match pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value.to_string(),
            None => pairs.push((key.to_string(), value.to_string())),
        }
    }
    encode_form(&pairs)
}

fn encode_form(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SendError;
    use crate::sender::SenderFn;
    use ferrule_log::MemoryLogger;
    use ferrule_message::SimpleResponse;
    use parking_lot::Mutex;

    type Seen = Arc<Mutex<Vec<SimpleRequest>>>;

    fn echo_client(status: u16) -> (Client, Seen, Arc<MemoryLogger>) {
        let seen: Seen = Arc::default();
        let record = seen.clone();
        let sender = SenderFn::new(move |request: &SimpleRequest| -> std::result::Result<SimpleResponse, SendError> {
            record.lock().push(request.clone());
            Ok(SimpleResponse::new(status, "").with_body("TEST_CONTENT".into()))
        });
        let logger = Arc::new(MemoryLogger::new());
        let providers: Vec<Arc<dyn Provider>> = vec![Arc::new(sender), logger.clone()];
        (Client::new(providers).unwrap(), seen, logger)
    }

    #[test]
    fn test_merge_query() {
        assert_eq!(merge_query("", &[("bar", "1"), ("baz", "2")]), "bar=1&baz=2");
        assert_eq!(
            merge_query("bar=1&baz=2", &[("baz", "3"), ("qux", "4")]),
            "bar=1&baz=3&qux=4"
        );
        assert_eq!(merge_query("q=a+b", &[("r", "c d")]), "q=a+b&r=c+d");
    }

    #[test]
    fn test_encode_form_escapes() {
        let pairs = vec![("a b".to_string(), "x&y=z".to_string())];
        assert_eq!(encode_form(&pairs), "a+b=x%26y%3Dz");
    }

    #[test]
    fn test_default_headers_then_caller_headers() {
        let (mut client, seen, _) = echo_client(200);
        client
            .config
            .default_headers
            .insert("X-Default".into(), vec!["1".into()]);
        client
            .config
            .default_headers
            .insert("X-Override".into(), vec!["default".into()]);

        let headers: Headers = [("X-Override", "caller")].into_iter().collect();
        client.get("/", &[], &headers).unwrap();

        let request = seen.lock().remove(0);
        assert_eq!(request.header("x-default"), ["1"]);
        assert_eq!(request.header("x-override"), ["caller"]);
    }

    #[test]
    fn test_protocol_version_from_config() {
        let (mut client, seen, _) = echo_client(200);
        client.config.protocol_version = "1.0".into();
        client.get("/", &[], &Headers::new()).unwrap();
        assert_eq!(seen.lock()[0].protocol_version(), "1.0");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let (_, _, logger) = echo_client(200);
        let config = ClientConfig {
            protocol_version: String::new(),
            ..Default::default()
        };
        let providers: Vec<Arc<dyn Provider>> = vec![logger];
        let err = Client::with_config(providers, config).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Config(crate::config::ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_post_json() {
        let (client, seen, _) = echo_client(200);
        client
            .post_json("/items", &serde_json::json!({"name": "x"}), &Headers::new())
            .unwrap();

        let request = seen.lock().remove(0);
        assert_eq!(request.method(), "POST");
        assert_eq!(request.header_line("content-type"), JSON_CONTENT_TYPE);
        assert_eq!(request.body().contents_to_string().unwrap(), r#"{"name":"x"}"#);
    }

    #[test]
    fn test_caller_content_type_wins_over_form() {
        let (client, seen, _) = echo_client(200);
        let headers: Headers = [("Content-Type", "text/plain")].into_iter().collect();
        client.post("/", [("a", "1")], &headers).unwrap();
        assert_eq!(seen.lock()[0].header("content-type"), ["text/plain"]);
    }

    #[test]
    fn test_unknown_reason_in_status_message() {
        let (client, _, logger) = echo_client(502);
        let err = client.get("https://example.com/x", &[], &Headers::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "HTTP Status 502 Unknown Error for: GET https://example.com/x"
        );
        let record = logger.last().unwrap();
        assert_eq!(record.level, LogLevel::Error);
        assert_eq!(record.context["reason"], "Unknown Error");
    }

    #[test]
    fn test_malformed_uri_is_rejected_before_sending() {
        let (client, seen, _) = echo_client(200);
        let err = client.get("https:////example.com", &[], &Headers::new()).unwrap_err();
        assert!(matches!(err, ClientError::Message(ferrule_message::Error::MalformedUri { .. })));
        assert!(seen.lock().is_empty());
    }
}

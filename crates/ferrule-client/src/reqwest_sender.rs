//! Blocking [`Sender`] backed by reqwest.

use crate::error::SendError;
use crate::provider::Provider;
use crate::sender::Sender;
use ferrule_message::{Body, Message, ReaderStream, Request, SimpleRequest, SimpleResponse};
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::{Method, Version};
use std::io::SeekFrom;
use std::sync::Arc;
use std::time::Duration;

/// Transport settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: format!("ferrule/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 10,
        }
    }
}

/// Sends requests over the network with a blocking reqwest client.
///
/// Response bodies are streamed: the returned message holds a forward-only
/// body over the open connection.
#[derive(Debug, Clone)]
pub struct ReqwestSender {
    inner: Client,
}

impl ReqwestSender {
    pub fn new() -> Result<Self, SendError> {
        Self::with_config(HttpConfig::default())
    }

    pub fn with_config(config: HttpConfig) -> Result<Self, SendError> {
        let inner = ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .map_err(|e| SendError::other("failed to build HTTP client").with_source(e))?;
        Ok(Self { inner })
    }

    /// Use an already configured reqwest client.
    pub fn from_client(inner: Client) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Client {
        &self.inner
    }
}

impl Sender for ReqwestSender {
    fn send_request(&self, request: &SimpleRequest) -> Result<SimpleResponse, SendError> {
        let method = Method::from_bytes(request.method().as_bytes()).map_err(|e| {
            SendError::request(format!("invalid method {:?}", request.method())).with_source(e)
        })?;
        let url = request.uri().to_string();

        let mut builder = self.inner.request(method, url.as_str());
        for (name, values) in request.headers().iter() {
            for value in values {
                builder = builder.header(name, value.as_str());
            }
        }
        builder = builder.body(read_body(request.body())?);

        tracing::debug!("Sending {} {}", request.method(), url);
        let response = builder.send().map_err(classify)?;
        tracing::debug!("Received {} for {}", response.status(), url);

        let status = response.status();
        let mut message = SimpleResponse::new(status.as_u16(), status.canonical_reason().unwrap_or(""))
            .with_protocol_version(version_str(response.version()));
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            message = message.with_added_header(name.as_str(), value);
        }
        Ok(message.with_body(Body::new(ReaderStream::new(response))))
    }
}

impl Provider for ReqwestSender {
    fn sender(self: Arc<Self>) -> Option<Arc<dyn Sender>> {
        Some(self)
    }
}

fn read_body(body: &Body) -> Result<Vec<u8>, SendError> {
    let mut stream = body.lock();
    if stream.is_seekable() {
        stream
            .seek(SeekFrom::Start(0))
            .map_err(|e| SendError::request("failed to rewind request body").with_source(e))?;
    }
    let bytes = stream
        .get_contents()
        .map_err(|e| SendError::request("failed to read request body").with_source(e))?;
    Ok(bytes.to_vec())
}

fn classify(e: reqwest::Error) -> SendError {
    let message = e.to_string();
    if e.is_timeout() || e.is_connect() || e.is_request() {
        SendError::network(message).with_source(e)
    } else if e.is_builder() {
        SendError::request(message).with_source(e)
    } else {
        SendError::other(message).with_source(e)
    }
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrule_message::{MemoryStream, Uri};

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("ferrule/"));
    }

    #[test]
    fn test_version_mapping() {
        assert_eq!(version_str(Version::HTTP_10), "1.0");
        assert_eq!(version_str(Version::HTTP_11), "1.1");
        assert_eq!(version_str(Version::HTTP_2), "2");
    }

    #[test]
    fn test_invalid_method_is_a_request_error() {
        let sender = ReqwestSender::new().unwrap();
        let request = SimpleRequest::new("NOT A METHOD", Uri::parse("http://localhost/").unwrap());
        assert!(matches!(
            sender.send_request(&request),
            Err(SendError::Request { .. })
        ));
    }

    #[test]
    fn test_read_body_rewinds_seekable_streams() {
        let body = Body::new(MemoryStream::new("payload"));
        body.read(3).unwrap();
        assert_eq!(read_body(&body).unwrap(), b"payload");

        let forward = Body::new(MemoryStream::forward_only("payload"));
        forward.read(3).unwrap();
        assert_eq!(read_body(&forward).unwrap(), b"load");
    }
}

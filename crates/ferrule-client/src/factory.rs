//! Factories for requests, responses, bodies and URIs.

use crate::provider::Provider;
use ferrule_message::{Body, MemoryStream, ReaderStream, SimpleRequest, SimpleResponse, Uri};
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

pub trait RequestFactory: Send + Sync {
    fn create_request(&self, method: &str, uri: Uri) -> SimpleRequest;
}

pub trait ResponseFactory: Send + Sync {
    fn create_response(&self, code: u16, reason: &str) -> SimpleResponse;
}

pub trait StreamFactory: Send + Sync {
    /// Seekable body over `content`.
    fn create_stream(&self, content: &str) -> Body;

    /// Seekable body holding the contents of the file at `path`.
    fn create_stream_from_file(&self, path: &Path) -> io::Result<Body>;

    /// Forward-only body over `reader`.
    fn create_stream_from_reader(&self, reader: Box<dyn Read + Send>) -> Body;
}

pub trait UriFactory: Send + Sync {
    fn create_uri(&self, uri: &str) -> ferrule_message::Result<Uri>;
}

/// Built-in factory backed by the `Simple*` message values.
///
/// It supplies every factory capability, and is the fallback when no provider
/// passed to the client does.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleFactory;

impl RequestFactory for SimpleFactory {
    fn create_request(&self, method: &str, uri: Uri) -> SimpleRequest {
        SimpleRequest::new(method, uri)
    }
}

impl ResponseFactory for SimpleFactory {
    fn create_response(&self, code: u16, reason: &str) -> SimpleResponse {
        SimpleResponse::new(code, reason)
    }
}

impl StreamFactory for SimpleFactory {
    fn create_stream(&self, content: &str) -> Body {
        Body::from(content)
    }

    fn create_stream_from_file(&self, path: &Path) -> io::Result<Body> {
        let data = std::fs::read(path)?;
        Ok(Body::new(MemoryStream::new(data)))
    }

    fn create_stream_from_reader(&self, reader: Box<dyn Read + Send>) -> Body {
        Body::new(ReaderStream::new(reader))
    }
}

impl UriFactory for SimpleFactory {
    fn create_uri(&self, uri: &str) -> ferrule_message::Result<Uri> {
        Uri::parse(uri)
    }
}

impl Provider for SimpleFactory {
    fn request_factory(self: Arc<Self>) -> Option<Arc<dyn RequestFactory>> {
        Some(self)
    }

    fn response_factory(self: Arc<Self>) -> Option<Arc<dyn ResponseFactory>> {
        Some(self)
    }

    fn stream_factory(self: Arc<Self>) -> Option<Arc<dyn StreamFactory>> {
        Some(self)
    }

    fn uri_factory(self: Arc<Self>) -> Option<Arc<dyn UriFactory>> {
        Some(self)
    }
}

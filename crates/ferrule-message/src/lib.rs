//! Immutable HTTP message values for Ferrule.
//!
//! Requests, responses and the URIs and headers inside them are values: every
//! `with_*` call returns a new one and the original is left alone. Bodies are
//! byte streams behind a shared handle, read lazily by [`ClientResponse`].
//!
//! # Example
//!
//! ```
//! use ferrule_message::{ClientResponse, Message, Response, SimpleRequest, SimpleResponse, Uri};
//!
//! let request = SimpleRequest::new("GET", Uri::parse("https://example.com/").unwrap());
//! let response = SimpleResponse::new(200, "OK")
//!     .with_header("Content-Type", "application/json; charset=utf-8")
//!     .with_body("{}".into());
//!
//! let response = ClientResponse::new(request, response);
//! assert!(response.is_success());
//! assert!(response.is_content_type("application", Some("json")));
//! assert_eq!(response.text().unwrap(), "{}");
//! ```

pub mod decorator;
pub mod error;
pub mod headers;
pub mod message;
pub mod response;
pub mod stream;
pub mod uri;

pub use decorator::{Decorated, Decorator};
pub use error::{Error, HeaderCount, Result};
pub use headers::{HeaderValues, Headers};
pub use message::{
    Message, Request, RequestLine, Response, SimpleMessage, SimpleRequest, SimpleResponse,
    StatusLine,
};
pub use response::{BodyState, ClientResponse};
pub use stream::{Body, ByteStream, MemoryStream, ReaderStream};
pub use uri::{default_port, Uri, UriParts};

//! Client error hierarchy.

use crate::config::ConfigError;
use crate::provider::Capability;
use ferrule_message::{ClientResponse, SimpleRequest};
use thiserror::Error;

/// Boxed error used as an opaque source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a [`Sender`](crate::Sender).
#[derive(Error, Debug)]
pub enum SendError {
    /// The request never got an answer: connect failure, timeout, reset.
    #[error("network failure: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The request itself could not be sent as given.
    #[error("invalid request: {message}")]
    Request {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Anything else that went wrong inside the sender.
    #[error("sender failure: {message}")]
    Other {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl SendError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
            source: None,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    pub fn with_source(self, cause: impl Into<BoxError>) -> Self {
        let cause = Some(cause.into());
        match self {
            Self::Network { message, .. } => Self::Network {
                message,
                source: cause,
            },
            Self::Request { message, .. } => Self::Request {
                message,
                source: cause,
            },
            Self::Other { message, .. } => Self::Other {
                message,
                source: cause,
            },
        }
    }
}

/// Errors surfaced by [`Client`](crate::Client).
#[derive(Error, Debug)]
pub enum ClientError {
    /// The sender failed for a reason unrelated to the network or the request.
    #[error("client error: {message}")]
    Client {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The request could not reach the server.
    #[error("network error: {message}")]
    Network {
        request: Box<SimpleRequest>,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The request was rejected before it was sent.
    #[error("request error: {message}")]
    Request {
        request: Box<SimpleRequest>,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The server answered with an error status that is not acceptable.
    #[error("{message}")]
    HttpStatus {
        status: u16,
        message: String,
        response: Box<ClientResponse>,
    },

    /// No provider, and not the default factory, supplies a capability.
    #[error("no provider supplies {capability}")]
    MissingCapability { capability: Capability },

    #[error(transparent)]
    Message(#[from] ferrule_message::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Classify a sender failure for `request`.
    pub fn from_send(request: &SimpleRequest, err: SendError) -> Self {
        match err {
            SendError::Network { message, source } => Self::Network {
                request: Box::new(request.clone()),
                message,
                source,
            },
            SendError::Request { message, source } => Self::Request {
                request: Box::new(request.clone()),
                message,
                source,
            },
            SendError::Other { message, source } => Self::Client { message, source },
        }
    }

    /// The request involved, when the error carries one.
    pub fn request(&self) -> Option<&SimpleRequest> {
        match self {
            Self::Network { request, .. } | Self::Request { request, .. } => Some(&**request),
            Self::HttpStatus { response, .. } => Some(response.request()),
            _ => None,
        }
    }

    /// The response received, for status failures.
    pub fn response(&self) -> Option<&ClientResponse> {
        match self {
            Self::HttpStatus { response, .. } => Some(&**response),
            _ => None,
        }
    }

    /// HTTP status, for status failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias using ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;

//! Error types for message values.

use thiserror::Error;

/// How many values a strict single-value header lookup actually found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderCount {
    /// The header is absent.
    Missing,
    /// The header carries more than one value.
    Multiple(Vec<String>),
}

/// Errors raised by the message layer.
#[derive(Error, Debug)]
pub enum Error {
    /// The URI string could not be decomposed into valid components.
    #[error("malformed URI {uri:?}: {reason}")]
    MalformedUri {
        /// The offending input.
        uri: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The body stream cannot be materialized.
    #[error("no body available: {reason}")]
    NoBodyAvailable {
        /// Why materialization gave up.
        reason: String,
    },

    /// A strict header lookup found zero or several values.
    #[error("{}", describe_ambiguous(.name, .found))]
    AmbiguousHeader {
        /// Header name as requested.
        name: String,
        /// What was found instead of exactly one value.
        found: HeaderCount,
    },

    /// Reading from the body stream failed.
    #[error("stream error: {0}")]
    Stream(#[from] std::io::Error),
}

fn describe_ambiguous(name: &str, found: &HeaderCount) -> String {
    match found {
        HeaderCount::Missing => format!("no header found for {name}"),
        HeaderCount::Multiple(values) => {
            format!("multiple headers found for {name}: {}", values.join(", "))
        }
    }
}

impl Error {
    pub(crate) fn malformed_uri(uri: &str, reason: impl Into<String>) -> Self {
        Self::MalformedUri {
            uri: uri.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using the message layer's Error.
pub type Result<T> = std::result::Result<T, Error>;

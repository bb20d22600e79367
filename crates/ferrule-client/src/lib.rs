//! Request-sending facade for Ferrule.
//!
//! A [`Client`] is assembled from [`Provider`]s: the first one supplying each
//! capability wins, the built-in [`SimpleFactory`] covers the factories, and a
//! [`Sender`] must always be given. The client builds requests, hands them to
//! the sender and turns error statuses into [`ClientError::HttpStatus`] unless
//! told they are acceptable.
//!
//! With the `reqwest` feature, [`ReqwestSender`] sends over the network.

pub mod client;
pub mod config;
pub mod error;
pub mod factory;
pub mod provider;
#[cfg(feature = "reqwest")]
pub mod reqwest_sender;
pub mod sender;

pub use client::{merge_query, Client, IntoUri, PostBody};
pub use config::{ClientConfig, ConfigError};
pub use error::{BoxError, ClientError, Result, SendError};
pub use factory::{RequestFactory, ResponseFactory, SimpleFactory, StreamFactory, UriFactory};
pub use provider::{select, Capabilities, Capability, Provider};
#[cfg(feature = "reqwest")]
pub use reqwest_sender::{HttpConfig, ReqwestSender};
pub use sender::{Sender, SenderFn};

//! Declarative extraction engine for HTTP JSON APIs.
//!
//! A [`connector::Connector`] is built from a [`config::PipelineConfig`]
//! (typically loaded via [`config::loader`]) and drives one pipeline's
//! request/auth/pagination/extraction loop to completion, yielding a
//! sequence of [`extract::Record`]s.

pub mod auth;
pub mod boxed;
pub mod config;
pub mod connector;
pub mod environment;
pub mod error;
pub mod extract;
pub mod pagination;
pub mod registry;
pub mod request;
pub mod retry;
pub mod transport;
pub mod value;

pub use config::PipelineConfig;
pub use connector::Connector;
pub use error::SiphonError;
pub use extract::Record;

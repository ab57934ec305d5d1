//! Error types for the HTTP client pipeline.
//!
//! # Design
//! Every error renders with a `[httpclient][<component>]` prefix so a failure
//! in a test log points at the stage that produced it. Underlying causes are
//! kept as `#[source]` values and can be recovered with
//! `std::error::Error::source` or, for transport failures, with
//! [`Error::transport_source`].
//!
//! Context expiry gets its own variant. Callers routinely need to tell
//! "upstream failed" apart from "we gave up", so a cancelled or timed-out
//! request never shows up as `Transport`.

use std::io;

use bytes::Bytes;
use http::StatusCode;

/// Boxed error produced by a [`crate::Transport`] implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Reason a [`crate::Context`] is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Setup-time failures. These are never retryable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("a transport is required")]
    MissingTransport,

    #[error("invalid base URL {url:?}: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Errors returned by the client, the body interceptors and the JSON decoder.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("[httpclient][config] {0}")]
    Config(#[from] ConfigError),

    /// The per-call URL could not be parsed or resolved. No request was sent.
    #[error("[httpclient][request] invalid URL {url:?}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("[httpclient][request] invalid header {name:?}")]
    InvalidHeader { name: String },

    /// The transport failed to produce a response.
    #[error("[httpclient][transport] {0}")]
    Transport(#[source] BoxError),

    /// The request's context was cancelled or its deadline passed.
    #[error("[httpclient][context] {0}")]
    Context(#[from] ContextError),

    #[error("[httpclient][body] read failed: {0}")]
    BodyRead(#[source] io::Error),

    #[error("[httpclient][body] close failed: {0}")]
    BodyClose(#[source] io::Error),

    /// The buffered body is not valid JSON for the requested type.
    #[error("[httpclient][json] {0}")]
    Decode(#[source] serde_json::Error),

    /// The response status is one the caller designated as an error.
    #[error("[httpclient][status] response status {status}")]
    Status { status: StatusCode, body: Bytes },
}

impl Error {
    /// Wraps any transport-level failure.
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::Transport(err.into())
    }

    /// Component tag shown in the rendered message.
    pub fn component(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Url { .. } | Error::InvalidHeader { .. } => "request",
            Error::Transport(_) => "transport",
            Error::Context(_) => "context",
            Error::BodyRead(_) | Error::BodyClose(_) => "body",
            Error::Decode(_) => "json",
            Error::Status { .. } => "status",
        }
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Error::Context(ContextError::DeadlineExceeded))
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Context(ContextError::Canceled))
    }

    /// The transport's own error, if this is a transport failure.
    pub fn transport_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Error::Transport(source) => Some(source.as_ref()),
            _ => None,
        }
    }
}

//! Configurable HTTP request/response pipeline.
//!
//! # Overview
//! A [`Client`] merges its default headers with per-call [`RequestOption`]s,
//! resolves the target URL against an optional base, and hands a fresh
//! [`Request`] to a pluggable [`Transport`]. Bodies can be buffered and
//! replayed any number of times, and decoded as JSON.
//!
//! # Design
//! - `Client` is an immutable value; every `with_*` returns a new client.
//! - The transport has exactly one method, `send`. [`UreqTransport`] talks to
//!   the network; the `httptesting` crate provides a mock.
//! - Deadlines and cancellation travel with the request as a [`Context`] and
//!   surface as [`Error::Context`], never as a generic transport failure.
//! - Every dispatch is synchronous from the caller's point of view. A client
//!   may be shared across threads; each call builds its own request and
//!   response values.

pub mod body;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod json;
pub mod message;
pub mod options;
pub mod transport;

pub use ::http::{header, HeaderMap, Method, StatusCode};
pub use body::{Body, ReadClose};
pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, DEFAULT_TIMEOUT, JSON_CONTENT_TYPE};
pub use context::{CancelHandle, Context};
pub use error::{BoxError, ConfigError, ContextError, Error, Result};
pub use json::{decode_json, deserialize_json};
pub use message::{
    intercept_request_body, intercept_response_body, must_intercept_request_body,
    must_intercept_response_body, Request, RequestHead, Response,
};
pub use options::{
    with_error_codes, with_headers, with_query_parameters, RequestOption, RequestOptions,
};
pub use transport::{Transport, UreqTransport};
pub use url::Url;

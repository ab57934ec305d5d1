//! The seam between the client and the network.
//!
//! # Design
//! `Transport` has a single method. The client only ever talks to the network
//! through it, so swapping [`UreqTransport`] for a test double changes nothing
//! else about how a request is built or how its response is handled.
//!
//! `UreqTransport` returns every status as data. Deciding which statuses are
//! failures is left to the caller (see `with_error_codes`).

use std::sync::Arc;

use tracing::debug;

use crate::error::{ContextError, Error, Result};
use crate::message::{Request, Response};

/// Sends one request and returns one response.
///
/// Implementations must honour `request.context()`: a context that is already
/// done, or that expires while the call is in flight, is reported as
/// [`Error::Context`] rather than as a transport failure.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request) -> Result<Response>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: Request) -> Result<Response> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: Request) -> Result<Response> {
        (**self).send(request)
    }
}

/// Blocking network transport backed by `ureq`.
#[derive(Debug, Clone, Default)]
pub struct UreqTransport {
    _private: (),
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn agent(&self, request: &Request) -> ureq::Agent {
        ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(request.context().remaining())
            .build()
            .new_agent()
    }
}

impl Transport for UreqTransport {
    fn send(&self, mut request: Request) -> Result<Response> {
        if let Some(err) = request.context().err() {
            return Err(err.into());
        }

        let head = request.head();
        let body = request.body.intercept()?;
        // Fragments never go on the wire.
        let uri: http::Uri = request.url[..url::Position::AfterQuery]
            .parse()
            .map_err(Error::transport)?;
        let agent = self.agent(&request);

        debug!(method = %head.method, url = %head.url, bytes = body.len(), "ureq dispatch");

        let response = if body.is_empty() {
            run(&agent, &request, uri, ())?
        } else {
            run(&agent, &request, uri, body.to_vec())?
        };

        let (parts, mut wire_body) = response.into_parts();
        let bytes = wire_body.read_to_vec().map_err(map_ureq_error)?;
        // A cancel fired during the blocking call is only observable here.
        if let Some(err) = request.context().err() {
            return Err(err.into());
        }

        Ok(Response::new(parts.status)
            .with_headers(parts.headers)
            .with_body(bytes)
            .with_request(head))
    }
}

fn run<B: ureq::AsSendBody>(
    agent: &ureq::Agent,
    request: &Request,
    uri: http::Uri,
    body: B,
) -> Result<http::Response<ureq::Body>> {
    let mut wire = http::Request::new(body);
    *wire.method_mut() = request.method.clone();
    *wire.uri_mut() = uri;
    *wire.headers_mut() = request.headers.clone();
    agent.run(wire).map_err(map_ureq_error)
}

fn map_ureq_error(err: ureq::Error) -> Error {
    match err {
        ureq::Error::Timeout(_) => ContextError::DeadlineExceeded.into(),
        other => Error::transport(other),
    }
}

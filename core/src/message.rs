//! Request and response values exchanged with a [`crate::Transport`].
//!
//! # Design
//! A `Request` is built fresh for every call and handed to the transport by
//! value. A `Response` owns its body and carries a `RequestHead` snapshot of
//! the request that produced it. The snapshot is informational only and never
//! includes the request body.

use http::{HeaderMap, Method, StatusCode};
use url::Url;

use crate::body::Body;
use crate::context::Context;
use crate::error::Result;

/// Method, URL and headers of a request, without the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Body,
    context: Context,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Body::empty(),
            context: Context::background(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Deadline and cancellation state the transport must honour.
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn head(&self) -> RequestHead {
        RequestHead {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
        }
    }
}

#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
    request: Option<RequestHead>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Body::empty(),
            request: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_request(mut self, request: RequestHead) -> Self {
        self.request = Some(request);
        self
    }

    /// The request this response answers, when the transport recorded it.
    pub fn request(&self) -> Option<&RequestHead> {
        self.request.as_ref()
    }

    pub(crate) fn set_request_if_missing(&mut self, head: RequestHead) {
        if self.request.is_none() {
            self.request = Some(head);
        }
    }
}

/// Buffers the request body and restores a replayable copy. Safe to call
/// repeatedly; every call returns the same bytes.
pub fn intercept_request_body(request: &mut Request) -> Result<bytes::Bytes> {
    request.body.intercept()
}

/// Buffers the response body and restores a replayable copy. Safe to call
/// repeatedly; every call returns the same bytes.
pub fn intercept_response_body(response: &mut Response) -> Result<bytes::Bytes> {
    response.body.intercept()
}

/// Like [`intercept_request_body`], for tests.
///
/// # Panics
/// Panics if the body cannot be read or closed.
pub fn must_intercept_request_body(request: &mut Request) -> bytes::Bytes {
    match intercept_request_body(request) {
        Ok(bytes) => bytes,
        Err(err) => panic!("intercepting request body: {err}"),
    }
}

/// Like [`intercept_response_body`], for tests.
///
/// # Panics
/// Panics if the body cannot be read or closed.
pub fn must_intercept_response_body(response: &mut Response) -> bytes::Bytes {
    match intercept_response_body(response) {
        Ok(bytes) => bytes,
        Err(err) => panic!("intercepting response body: {err}"),
    }
}

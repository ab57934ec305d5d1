//! A [`Transport`] that answers from registered expectations instead of the network.
//!
//! # Design
//! Expectations live in an append-only list that is scanned in registration
//! order on every dispatch; the first one whose method, URL and predicate all
//! match produces the response. Nothing is ever removed, so a test can rely
//! on an earlier, more specific expectation shadowing a later catch-all.
//!
//! A request's URL is compared as a string against the URL given at
//! registration, so the registered URL must be written the way `url::Url`
//! serializes it (lowercase host, no default port, `/` for an empty path).
//!
//! Dispatch works on a snapshot of the registry taken when the request
//! arrives. Matchers and responders run without the lock held, so they may
//! register mocks or dispatch through the same transport.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, StatusCode};
use httpclient::{Error, Request, RequestHead, Response, Result, Transport};
use tracing::{debug, warn};

/// Extra predicate a request must satisfy on top of method and URL.
pub type Matcher = Arc<dyn Fn(&mut Request) -> bool + Send + Sync>;

type RespondFn = dyn Fn(&mut Request) -> Result<Response> + Send + Sync;

/// Produces the synthetic response for a matched request.
#[derive(Clone)]
pub struct Responder {
    respond: Arc<RespondFn>,
    headers: HeaderMap,
}

impl Responder {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&mut Request) -> Result<Response> + Send + Sync + 'static,
    {
        Self {
            respond: Arc::new(respond),
            headers: HeaderMap::new(),
        }
    }

    pub fn bytes(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self::new(move |_| Ok(Response::new(status).with_body(body.clone())))
    }

    pub fn string(status: StatusCode, body: impl Into<String>) -> Self {
        Self::bytes(status, body.into())
    }

    /// Responds with `body` verbatim and `Content-Type: application/json`.
    /// Fails if `body` is not valid JSON.
    pub fn json(status: StatusCode, body: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<serde_json::Value>(body)?;
        let mut responder = Self::bytes(status, body.to_string());
        responder
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(responder)
    }

    /// Fails every matched request with `err`, for fault injection.
    pub fn error<F>(err: F) -> Self
    where
        F: Fn() -> Error + Send + Sync + 'static,
    {
        Self::new(move |_| Err(err()))
    }

    /// Sets headers on every response, replacing existing values.
    pub fn header_set(mut self, headers: HeaderMap) -> Self {
        for (name, value) in &headers {
            self.headers.insert(name.clone(), value.clone());
        }
        self
    }

    pub fn respond(&self, request: &mut Request) -> Result<Response> {
        let mut response = (self.respond)(request)?;
        for (name, value) in &self.headers {
            response.headers.insert(name.clone(), value.clone());
        }
        Ok(response)
    }
}

impl Default for Responder {
    /// `200 OK` with body `OK`.
    fn default() -> Self {
        Self::string(StatusCode::OK, "OK")
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder")
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Returned, boxed in [`Error::Transport`], when no registered mock matches.
#[derive(Debug, Clone, thiserror::Error)]
#[error("no mock registered for {method} {url} ({registered} mocks registered)")]
pub struct NoResponderFound {
    pub method: Method,
    pub url: String,
    pub registered: usize,
}

#[derive(Clone)]
struct Entry {
    name: String,
    method: Method,
    url: String,
    matcher: Option<Matcher>,
    responder: Responder,
}

impl Entry {
    fn matches(&self, request: &mut Request) -> bool {
        request.method == self.method
            && request.url.as_str() == self.url
            && self.matcher.as_ref().map_or(true, |matcher| matcher(request))
    }
}

#[derive(Default)]
pub struct MockTransport {
    entries: Mutex<Vec<Entry>>,
    calls: Mutex<Vec<RequestHead>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an expectation for `method` on exactly `url`. `name` only
    /// shows up in logs.
    pub fn register(
        &self,
        name: impl Into<String>,
        method: Method,
        url: impl Into<String>,
        matcher: Option<Matcher>,
        responder: Responder,
    ) {
        let name = name.into();
        let url = url.into();
        debug!(%name, %method, %url, "registering mock");
        lock(&self.entries).push(Entry {
            name,
            method,
            url,
            matcher,
            responder,
        });
    }

    pub fn registered(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Every request dispatched so far, matched or not.
    pub fn calls(&self) -> Vec<RequestHead> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Number of dispatched requests with this method and exact URL.
    pub fn calls_for(&self, method: &Method, url: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|head| &head.method == method && head.url.as_str() == url)
            .count()
    }
}

impl Transport for MockTransport {
    fn send(&self, mut request: Request) -> Result<Response> {
        if let Some(err) = request.context().err() {
            return Err(err.into());
        }

        let head = request.head();
        lock(&self.calls).push(head.clone());

        let entries = lock(&self.entries).clone();
        for entry in &entries {
            if entry.matches(&mut request) {
                debug!(name = %entry.name, method = %head.method, url = %head.url, "mock matched");
                let response = entry.responder.respond(&mut request)?;
                return Ok(response.with_request(head));
            }
        }

        warn!(method = %head.method, url = %head.url, "no mock matched");
        Err(Error::transport(NoResponderFound {
            method: head.method,
            url: head.url.to_string(),
            registered: entries.len(),
        }))
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("registered", &self.registered())
            .field("calls", &self.call_count())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

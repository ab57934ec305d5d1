//! Builder for a single mock expectation.

use std::fmt;
use std::sync::Arc;

use http::{HeaderMap, Method, StatusCode};
use httpclient::{intercept_request_body, Request, RequestOption, RequestOptions};
use tracing::warn;
use url::Url;

use crate::mock::{Matcher, MockTransport, Responder};

/// One expectation: method, exact URL, an optional request predicate and the
/// response to produce. Nothing is active until [`MockRequest::register`].
///
/// Without a custom matcher, a request matches when its headers are exactly
/// equal to the headers passed at construction. Extra headers on the request
/// make it miss. When no headers were passed, headers are not checked.
pub struct MockRequest {
    transport: Arc<MockTransport>,
    name: String,
    method: Method,
    url: String,
    expected_headers: Option<HeaderMap>,
    matcher: Option<Matcher>,
    responder: Responder,
}

impl MockRequest {
    /// `url` is matched as written; see [`MockTransport::register`].
    ///
    /// # Panics
    /// Panics if `url` is not an absolute URL or the options are invalid.
    pub fn new(
        transport: Arc<MockTransport>,
        method: Method,
        url: &str,
        options: &[RequestOption],
    ) -> Self {
        if let Err(err) = Url::parse(url) {
            panic!("mock request URL {url:?}: {err}");
        }
        let options = match RequestOptions::fold(options) {
            Ok(options) => options,
            Err(err) => panic!("mock request options for {url:?}: {err}"),
        };
        let name = format!(
            "{}_{}",
            std::thread::current().name().unwrap_or("unnamed"),
            url
        );

        Self {
            transport,
            name,
            method,
            url: url.to_string(),
            expected_headers: options.headers().cloned(),
            matcher: None,
            responder: Responder::default(),
        }
    }

    /// Replaces the responder.
    pub fn responder(mut self, responder: Responder) -> Self {
        self.responder = responder;
        self
    }

    /// Responds with `body` as JSON. Replaces the current responder.
    ///
    /// # Panics
    /// Panics if `body` is not valid JSON.
    pub fn respond_with_json(mut self, status: StatusCode, body: &str) -> Self {
        self.responder = match Responder::json(status, body) {
            Ok(responder) => responder,
            Err(err) => panic!("{self}: invalid JSON response body: {err}"),
        };
        self
    }

    /// Sets response headers on the current responder. Can be called more
    /// than once; later values for the same name win.
    ///
    /// # Panics
    /// Panics if a header name or value is invalid.
    pub fn respond_with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let headers = match RequestOptions::fold(&[httpclient::with_headers(headers)]) {
            Ok(options) => options.headers().cloned().unwrap_or_default(),
            Err(err) => panic!("{self}: {err}"),
        };
        self.responder = self.responder.header_set(headers);
        self
    }

    /// Replaces the header check with `matcher`.
    pub fn matcher<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&mut Request) -> bool + Send + Sync + 'static,
    {
        self.matcher = Some(Arc::new(matcher));
        self
    }

    /// True when `request` satisfies this expectation.
    pub fn matches(&self, request: &mut Request) -> bool {
        request.method == self.method
            && request.url.as_str() == self.url
            && match (&self.matcher, &self.expected_headers) {
                (Some(matcher), _) => matcher(request),
                (None, Some(expected)) => &request.headers == expected,
                (None, None) => true,
            }
    }

    /// Adds the expectation to the transport's registry.
    pub fn register(self) {
        let predicate: Option<Matcher> = match (self.matcher, self.expected_headers) {
            (Some(matcher), _) => Some(matcher),
            (None, Some(expected)) => {
                Some(Arc::new(move |request: &mut Request| request.headers == expected))
            }
            (None, None) => None,
        };
        self.transport
            .register(self.name, self.method, self.url, predicate, self.responder);
    }
}

impl fmt::Display for MockRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MockRequest: [{}] {}", self.method, self.url)
    }
}

/// Matches requests whose body is structurally equal JSON to `body`.
/// Key order and whitespace are ignored.
///
/// The request body is replayed, so later matchers and the responder can
/// still read it.
///
/// # Panics
/// Panics if `body` is not valid JSON.
pub fn json_body_matcher(body: &str) -> impl Fn(&mut Request) -> bool + Send + Sync + 'static {
    let expected: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => panic!("expected JSON body is invalid: {err}"),
    };
    move |request: &mut Request| {
        let bytes = match intercept_request_body(request) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(%err, "reading request body for JSON match");
                return false;
            }
        };
        match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(actual) => actual == expected,
            Err(err) => {
                warn!(%err, url = %request.url, "request body is not JSON");
                false
            }
        }
    }
}

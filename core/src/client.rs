//! Client facade: default options, URL resolution and verb dispatch.
//!
//! # Design
//! `Client` is an immutable configuration value plus a shared transport. Every
//! `with_*` method returns a new client and leaves the receiver untouched, so a
//! client can be cloned into other threads while someone else derives a
//! differently configured copy. Requests already dispatched never observe a
//! later configuration change.
//!
//! For each call the default headers are folded in first and the call's
//! options second, so call-supplied values win on key collisions.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method};
use tracing::{debug, warn};
use url::{form_urlencoded, Url};

use crate::body::Body;
use crate::config::{ClientConfig, DEFAULT_TIMEOUT, JSON_CONTENT_TYPE};
use crate::context::Context;
use crate::error::{ConfigError, Error, Result};
use crate::message::{Request, Response};
use crate::options::{RequestOption, RequestOptions};
use crate::transport::{Transport, UreqTransport};

#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    timeout: Duration,
    default_headers: HeaderMap,
    base_url: Option<BaseUrl>,
}

/// The base URL as configured, next to its parsed form.
#[derive(Clone)]
struct BaseUrl {
    raw: String,
    parsed: Url,
}

impl Client {
    /// A client over `transport` with a 30 second timeout and no defaults.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            timeout: DEFAULT_TIMEOUT,
            default_headers: HeaderMap::new(),
            base_url: None,
        }
    }

    /// A client that talks to the network through [`UreqTransport`].
    pub fn new_default() -> Self {
        Self::new(Self::default_transport())
    }

    /// The network transport used by [`Client::new_default`].
    pub fn default_transport() -> Arc<dyn Transport> {
        Arc::new(UreqTransport::new())
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &ClientConfig) -> Result<Self> {
        Self::builder()
            .transport(transport)
            .config(config.clone())
            .build()
    }

    /// Returns a client with the given per-request timeout.
    /// `Duration::ZERO` disables the client-imposed deadline.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    /// Returns a client whose default headers also contain `headers`.
    /// Existing defaults with the same name are replaced.
    pub fn with_default_headers<I, K, V>(&self, headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let merged = RequestOptions::fold(&[
            RequestOption::HeaderMap(self.default_headers.clone()),
            crate::options::with_headers(headers),
        ])?;
        Ok(Self {
            default_headers: merged.into_headers(),
            ..self.clone()
        })
    }

    /// Returns a client that resolves request URLs against `base_url`.
    pub fn with_base_url(&self, base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|source| ConfigError::BaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self {
            base_url: Some(BaseUrl {
                raw: base_url.to_string(),
                parsed,
            }),
            ..self.clone()
        })
    }

    /// Returns a client that sends `Content-Type: application/json; charset=utf-8`.
    pub fn with_json_content_type(&self) -> Self {
        let mut default_headers = self.default_headers.clone();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        Self {
            default_headers,
            ..self.clone()
        }
    }

    /// Returns a client that dispatches through `transport` instead.
    pub fn with_transport(&self, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            ..self.clone()
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// The base URL exactly as it was passed to [`Client::with_base_url`].
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_ref().map(|base| base.raw.as_str())
    }

    pub fn get(&self, ctx: &Context, url: &str, options: &[RequestOption]) -> Result<Response> {
        self.execute(ctx, Method::GET, url, Body::empty(), options)
    }

    pub fn head(&self, ctx: &Context, url: &str, options: &[RequestOption]) -> Result<Response> {
        self.execute(ctx, Method::HEAD, url, Body::empty(), options)
    }

    pub fn post(
        &self,
        ctx: &Context,
        url: &str,
        body: impl Into<Body>,
        options: &[RequestOption],
    ) -> Result<Response> {
        self.execute(ctx, Method::POST, url, body.into(), options)
    }

    pub fn patch(
        &self,
        ctx: &Context,
        url: &str,
        body: impl Into<Body>,
        options: &[RequestOption],
    ) -> Result<Response> {
        self.execute(ctx, Method::PATCH, url, body.into(), options)
    }

    pub fn delete(&self, ctx: &Context, url: &str, options: &[RequestOption]) -> Result<Response> {
        self.execute(ctx, Method::DELETE, url, Body::empty(), options)
    }

    /// Builds the request for `method` and `url` and sends it.
    ///
    /// When the context is done by the time the transport returns, the
    /// context's own error is reported instead of the transport's result, so
    /// callers can test for cancellation and deadlines specifically. A
    /// response that arrives too late is closed and discarded.
    pub fn execute(
        &self,
        ctx: &Context,
        method: Method,
        url: &str,
        body: Body,
        options: &[RequestOption],
    ) -> Result<Response> {
        let (request, opts) = self.prepare_request(method, url, body, options)?;

        let ctx = if self.timeout.is_zero() {
            ctx.clone()
        } else {
            ctx.with_timeout(self.timeout)
        };
        if let Some(err) = ctx.err() {
            debug!(method = %request.method, url = %request.url, %err, "context done before dispatch");
            return Err(err.into());
        }

        let head = request.head();
        debug!(method = %head.method, url = %head.url, "dispatching request");

        let mut response = match self.transport.send(request.with_context(ctx.clone())) {
            Ok(response) => response,
            Err(err) => {
                let err = match ctx.err() {
                    Some(ctx_err) if !matches!(err, Error::Context(_)) => {
                        debug!(%err, "transport failed after context ended");
                        Error::Context(ctx_err)
                    }
                    _ => err,
                };
                warn!(method = %head.method, url = %head.url, %err, "request failed");
                return Err(err);
            }
        };
        if let Some(err) = ctx.err() {
            // Expired or canceled while in flight: the response is dropped.
            if let Err(close_err) = response.body.close() {
                debug!(%close_err, "closing abandoned response body");
            }
            warn!(method = %head.method, url = %head.url, %err, "context ended during request");
            return Err(err.into());
        }
        response.set_request_if_missing(head);

        if opts.is_error_code(response.status.as_u16()) {
            let body = response.body.intercept()?;
            return Err(Error::Status {
                status: response.status,
                body,
            });
        }

        debug!(status = %response.status, "response received");
        Ok(response)
    }

    /// Folds the options, resolves the URL and builds a fresh `Request`.
    pub fn prepare_request(
        &self,
        method: Method,
        url: &str,
        body: Body,
        options: &[RequestOption],
    ) -> Result<(Request, RequestOptions)> {
        let defaults = RequestOption::HeaderMap(self.default_headers.clone());
        let opts = RequestOptions::fold(std::iter::once(&defaults).chain(options))?;

        let mut target = self.resolve_url(url)?;
        if let Some(params) = opts.query_parameters() {
            merge_query(&mut target, params);
        }

        let request = Request::new(method, target)
            .with_headers(opts.headers().cloned().unwrap_or_default())
            .with_body(body);
        Ok((request, opts))
    }

    fn resolve_url(&self, raw: &str) -> Result<Url> {
        let resolved = match &self.base_url {
            Some(base) => base.parsed.join(raw),
            None => Url::parse(raw),
        };
        resolved.map_err(|source| Error::Url {
            url: raw.to_string(),
            source,
        })
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("timeout", &self.timeout)
            .field("default_headers", &self.default_headers)
            .field("base_url", &self.base_url())
            .finish_non_exhaustive()
    }
}

/// Appends `params` to the query of `url`. Existing pairs whose key is in
/// `params` are dropped; all other existing pairs keep their original encoding.
fn merge_query(url: &mut Url, params: &BTreeMap<String, String>) {
    if params.is_empty() {
        return;
    }

    let mut segments: Vec<String> = url
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|segment| !segment.is_empty())
        .filter(|segment| {
            let key = form_urlencoded::parse(segment.as_bytes())
                .next()
                .map(|(key, _)| key.into_owned())
                .unwrap_or_default();
            !params.contains_key(&key)
        })
        .map(str::to_owned)
        .collect();

    segments.push(
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish(),
    );
    url.set_query(Some(&segments.join("&")));
}

/// Builder that validates a complete configuration before producing a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn json_content_type(mut self) -> Self {
        self.config.json_content_type = true;
        self
    }

    /// Fails with [`ConfigError::MissingTransport`] when no transport was set.
    pub fn build(self) -> Result<Client> {
        let transport = self.transport.ok_or(ConfigError::MissingTransport)?;
        let config = self.config;

        let mut client = Client::new(transport)
            .with_timeout(config.timeout)
            .with_default_headers(config.default_headers)?;
        if config.json_content_type {
            client = client.with_json_content_type();
        }
        if let Some(base_url) = &config.base_url {
            client = client.with_base_url(base_url)?;
        }
        Ok(client)
    }
}

//! `httpclient::Client` wired to a [`MockTransport`].

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use http::Method;
use httpclient::{RequestOption, Result};

use crate::mock::MockTransport;
use crate::request::MockRequest;

/// A client whose requests never leave the process.
///
/// Dereferences to the inner [`httpclient::Client`], so every verb is
/// available directly. Derived clients (`with_*`) share the same mock
/// registry.
#[derive(Debug, Clone)]
pub struct Client {
    inner: httpclient::Client,
    mock: Arc<MockTransport>,
}

impl Client {
    pub fn new() -> Self {
        let mock = Arc::new(MockTransport::new());
        Self {
            inner: httpclient::Client::new(mock.clone()),
            mock,
        }
    }

    pub fn with_base_url(&self, base_url: &str) -> Result<Self> {
        Ok(self.derive(self.inner.with_base_url(base_url)?))
    }

    pub fn with_default_headers<I, K, V>(&self, headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Ok(self.derive(self.inner.with_default_headers(headers)?))
    }

    pub fn with_json_content_type(&self) -> Self {
        self.derive(self.inner.with_json_content_type())
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.derive(self.inner.with_timeout(timeout))
    }

    /// Starts an expectation for `method` and the absolute `url`. Headers
    /// among `options` become an exact-match requirement.
    ///
    /// # Panics
    /// Panics if `url` is not absolute or the options are invalid.
    pub fn new_mock_request(
        &self,
        method: Method,
        url: &str,
        options: &[RequestOption],
    ) -> MockRequest {
        MockRequest::new(Arc::clone(&self.mock), method, url, options)
    }

    /// The underlying mock transport, for direct registration and inspection.
    pub fn mock(&self) -> &Arc<MockTransport> {
        &self.mock
    }

    pub fn client(&self) -> &httpclient::Client {
        &self.inner
    }

    fn derive(&self, inner: httpclient::Client) -> Self {
        Self {
            inner,
            mock: Arc::clone(&self.mock),
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Client {
    type Target = httpclient::Client;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

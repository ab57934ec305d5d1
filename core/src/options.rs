//! Per-request options: headers, query parameters and error status codes.
//!
//! Options are plain values folded left to right into a [`RequestOptions`].
//! Later options overwrite earlier ones key by key; nothing is appended.

use std::collections::{BTreeMap, BTreeSet};

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOption {
    /// Sets each header, replacing any earlier value for the same name.
    Headers(Vec<(String, String)>),
    /// Pre-validated variant of `Headers`.
    HeaderMap(HeaderMap),
    /// Sets each query parameter, replacing any earlier value for the same key.
    QueryParameters(Vec<(String, String)>),
    /// Adds status codes that turn a response into [`Error::Status`].
    ErrorCodes(Vec<u16>),
}

pub fn with_headers<I, K, V>(headers: I) -> RequestOption
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    RequestOption::Headers(
        headers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    )
}

pub fn with_query_parameters<I, K, V>(params: I) -> RequestOption
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    RequestOption::QueryParameters(
        params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    )
}

pub fn with_error_codes<I>(codes: I) -> RequestOption
where
    I: IntoIterator<Item = u16>,
{
    RequestOption::ErrorCodes(codes.into_iter().collect())
}

/// The result of folding a sequence of [`RequestOption`]s.
///
/// Each mapping is `None` until some option touches it, so "never set" and
/// "set to nothing" stay distinguishable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    headers: Option<HeaderMap>,
    query: Option<BTreeMap<String, String>>,
    error_codes: Option<BTreeSet<u16>>,
}

impl RequestOptions {
    /// Applies `options` in order to an empty record.
    pub fn fold<'a, I>(options: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a RequestOption>,
    {
        options
            .into_iter()
            .try_fold(Self::default(), |acc, option| acc.apply(option))
    }

    pub fn apply(mut self, option: &RequestOption) -> Result<Self> {
        match option {
            RequestOption::Headers(pairs) => {
                let headers = self.headers.get_or_insert_with(HeaderMap::new);
                for (name, value) in pairs {
                    let header_name = HeaderName::from_bytes(name.as_bytes())
                        .map_err(|_| Error::InvalidHeader { name: name.clone() })?;
                    let header_value = HeaderValue::from_str(value)
                        .map_err(|_| Error::InvalidHeader { name: name.clone() })?;
                    headers.insert(header_name, header_value);
                }
            }
            RequestOption::HeaderMap(map) => {
                let headers = self.headers.get_or_insert_with(HeaderMap::new);
                for (name, value) in map {
                    headers.insert(name.clone(), value.clone());
                }
            }
            RequestOption::QueryParameters(pairs) => {
                let query = self.query.get_or_insert_with(BTreeMap::new);
                for (key, value) in pairs {
                    query.insert(key.clone(), value.clone());
                }
            }
            RequestOption::ErrorCodes(codes) => {
                self.error_codes
                    .get_or_insert_with(BTreeSet::new)
                    .extend(codes.iter().copied());
            }
        }
        Ok(self)
    }

    pub fn headers(&self) -> Option<&HeaderMap> {
        self.headers.as_ref()
    }

    pub fn query_parameters(&self) -> Option<&BTreeMap<String, String>> {
        self.query.as_ref()
    }

    pub fn error_codes(&self) -> Option<&BTreeSet<u16>> {
        self.error_codes.as_ref()
    }

    pub fn is_error_code(&self, status: u16) -> bool {
        self.error_codes
            .as_ref()
            .is_some_and(|codes| codes.contains(&status))
    }

    pub(crate) fn into_headers(self) -> HeaderMap {
        self.headers.unwrap_or_default()
    }
}

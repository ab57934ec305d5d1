//! Assertions over responses, for use in tests.
//!
//! Every helper panics with a descriptive message on mismatch and leaves the
//! response body replayable, so several assertions can run on one response.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use httpclient::{intercept_response_body, RequestHead, Response};
use serde::Serialize;
use url::Url;

/// The parts of a response to compare. Unset fields are not compared.
#[derive(Debug, Clone)]
pub struct ExpectedResponse {
    pub status: StatusCode,
    pub headers: Option<HeaderMap>,
    pub body: Option<Bytes>,
    pub request: Option<RequestHead>,
}

impl ExpectedResponse {
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            headers: None,
            body: None,
            request: None,
        }
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn request(mut self, request: RequestHead) -> Self {
        self.request = Some(request);
        self
    }
}

/// Compares `actual` against `expected`. Bodies of `application/json`
/// responses are compared as JSON values, others byte for byte.
///
/// # Panics
/// Panics on the first mismatch.
pub fn response_equal(actual: &mut Response, expected: &ExpectedResponse) {
    assert_eq!(actual.status, expected.status, "status code");

    if let Some(headers) = &expected.headers {
        assert_eq!(&actual.headers, headers, "response headers");
    }

    if let Some(body) = &expected.body {
        let actual_body = body_of(actual);
        if is_json(&actual.headers) {
            json_eq(&actual_body, body);
        } else {
            assert_eq!(
                String::from_utf8_lossy(&actual_body),
                String::from_utf8_lossy(body),
                "response body"
            );
        }
    }

    if let Some(request) = &expected.request {
        let Some(actual_request) = actual.request() else {
            panic!("response carries no request, expected {} {}", request.method, request.url);
        };
        assert_eq!(actual_request.method, request.method, "request method");
        assert_eq!(actual_request.url, request.url, "request URL");
        assert_eq!(actual_request.headers, request.headers, "request headers");
    }
}

/// Asserts a `200 OK` whose body is JSON equal to `body`.
///
/// # Panics
/// Panics on a different status or body.
pub fn successful_json_response_equal(actual: &mut Response, body: &[u8]) {
    assert_eq!(actual.status, StatusCode::OK, "status code");
    json_eq(&body_of(actual), body);
}

/// # Panics
/// Panics if `url` does not parse.
pub fn url_from_string(url: &str) -> Url {
    match Url::parse(url) {
        Ok(url) => url,
        Err(err) => panic!("invalid URL {url:?}: {err}"),
    }
}

/// Pretty-prints `value` as JSON to stdout. Debugging aid.
///
/// # Panics
/// Panics if `value` cannot be serialized.
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => panic!("value is not JSON-serializable: {err}"),
    }
}

fn body_of(response: &mut Response) -> Bytes {
    match intercept_response_body(response) {
        Ok(bytes) => bytes,
        Err(err) => panic!("reading response body: {err}"),
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case("application/json"))
}

fn json_eq(actual: &[u8], expected: &[u8]) {
    let parse = |bytes: &[u8], which: &str| -> serde_json::Value {
        match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(err) => panic!(
                "{which} body is not JSON ({err}): {}",
                String::from_utf8_lossy(bytes)
            ),
        }
    };
    assert_eq!(parse(actual, "actual"), parse(expected, "expected"), "JSON body");
}

#[cfg(test)]
mod tests {
    use http::header::HeaderValue;
    use http::Method;

    use super::*;

    fn json_response(status: StatusCode, body: &'static str) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Response::new(status).with_headers(headers).with_body(body)
    }

    #[test]
    fn matching_json_bodies_ignore_formatting() {
        let mut resp = json_response(StatusCode::OK, r#"{"hello": "world", "n": 1}"#);
        response_equal(
            &mut resp,
            &ExpectedResponse::status(StatusCode::OK).body(r#"{"n":1,"hello":"world"}"#),
        );
        // The body is still there for a second assertion.
        successful_json_response_equal(&mut resp, br#"{"hello":"world","n":1}"#);
    }

    #[test]
    #[should_panic(expected = "status code")]
    fn status_mismatch_panics() {
        let mut resp = Response::new(StatusCode::BAD_REQUEST);
        response_equal(&mut resp, &ExpectedResponse::status(StatusCode::OK));
    }

    #[test]
    #[should_panic(expected = "JSON body")]
    fn json_body_mismatch_panics() {
        let mut resp = json_response(StatusCode::OK, r#"{"hello": "worl"}"#);
        response_equal(
            &mut resp,
            &ExpectedResponse::status(StatusCode::OK).body(r#"{"hello": "world"}"#),
        );
    }

    #[test]
    fn non_json_bodies_compare_bytes() {
        let mut resp = Response::new(StatusCode::OK).with_body("plain text");
        response_equal(
            &mut resp,
            &ExpectedResponse::status(StatusCode::OK).body("plain text"),
        );
    }

    #[test]
    fn request_snapshot_is_compared() {
        let head = RequestHead {
            method: Method::GET,
            url: url_from_string("http://localhost/p123?test=1"),
            headers: HeaderMap::new(),
        };
        let mut resp = Response::new(StatusCode::OK).with_request(head.clone());
        response_equal(&mut resp, &ExpectedResponse::status(StatusCode::OK).request(head));
    }

    #[test]
    fn content_type_parameters_still_count_as_json() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("Application/JSON; charset=utf-8"),
        );
        assert!(is_json(&headers));
        assert!(!is_json(&HeaderMap::new()));
    }

    #[test]
    #[should_panic(expected = "not JSON-serializable")]
    fn print_json_rejects_unserializable_values() {
        let mut map = std::collections::HashMap::new();
        map.insert(vec![1u8], "non-string keys are not valid JSON");
        print_json(&map);
    }

    #[test]
    #[should_panic(expected = "invalid URL")]
    fn url_from_string_panics_on_garbage() {
        url_from_string("not a url");
    }
}

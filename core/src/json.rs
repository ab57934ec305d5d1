//! JSON decoding of response bodies.

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::message::{intercept_response_body, Response};

/// Decodes the response body as JSON into `target`.
///
/// The body is buffered first and restored as a replayable copy, so the
/// response can still be inspected afterwards. Memory for the full body is
/// held for as long as the response lives.
///
/// The target must be a mutable reference; anything else is rejected at
/// compile time, and the error names the type that was passed:
///
/// ```compile_fail
/// # use httpclient::{deserialize_json, Response, StatusCode};
/// let mut response = Response::new(StatusCode::OK).with_body("{}");
/// let target = std::collections::HashMap::<String, u32>::new();
/// deserialize_json(&mut response, target).unwrap();
/// ```
pub fn deserialize_json<T>(response: &mut Response, target: &mut T) -> Result<()>
where
    T: DeserializeOwned,
{
    *target = decode_json(response)?;
    Ok(())
}

/// Decodes the response body as JSON into a new value.
pub fn decode_json<T>(response: &mut Response) -> Result<T>
where
    T: DeserializeOwned,
{
    let bytes = intercept_response_body(response)?;
    serde_json::from_slice(&bytes).map_err(Error::Decode)
}

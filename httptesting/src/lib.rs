//! Test doubles for `httpclient`.
//!
//! # Overview
//! [`MockTransport`] implements `httpclient::Transport` without touching the
//! network. Tests register expectations (method, exact URL, optional request
//! predicate, responder) and dispatch through an ordinary client; the first
//! matching expectation answers. [`Client`] bundles a client with its mock.
//!
//! ```
//! use httptesting::{Client, Method, StatusCode};
//! use httpclient::{decode_json, Context};
//!
//! let client = Client::new().with_base_url("https://api.example.com").unwrap();
//! client
//!     .new_mock_request(Method::GET, "https://api.example.com/users/alice", &[])
//!     .respond_with_json(StatusCode::OK, r#"{"id":1,"login":"alice"}"#)
//!     .register();
//!
//! let mut resp = client.get(&Context::background(), "/users/alice", &[]).unwrap();
//! let user: serde_json::Value = decode_json(&mut resp).unwrap();
//! assert_eq!(user["login"], "alice");
//! ```

pub mod assert;
pub mod client;
pub mod mock;
pub mod request;

pub use ::http::{Method, StatusCode};
pub use client::Client;
pub use mock::{Matcher, MockTransport, NoResponderFound, Responder};
pub use request::{json_body_matcher, MockRequest};

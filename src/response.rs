// Copyright (C) 2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use http::header::CONTENT_TYPE;
use http::HeaderMap;
use http::StatusCode;

use serde_json::from_slice as from_json;
use serde_json::Value;

use tracing::debug;

/// The header carrying the ID the service assigned to a request.
pub(crate) const HDR_REQUEST_ID: &str = "x-request-id";
const HDR_RATE_LIMIT: &str = "x-ratelimit-limit";
const HDR_RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const HDR_RATE_LIMIT_RESET: &str = "x-ratelimit-reset";


/// The decoded body of a successful response.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
  /// The response did not carry a body.
  Empty,
  /// A JSON document (typically an object or an array), as received.
  Json(Value),
  /// A body that is not JSON.
  Text(String),
}

impl Body {
  /// Decode a body based on the content type it was announced with.
  pub(crate) fn decode(content_type: Option<&str>, bytes: &[u8]) -> Self {
    if bytes.iter().all(u8::is_ascii_whitespace) {
      return Self::Empty
    }

    let is_json = content_type
      .map(|content_type| content_type.contains("json"))
      .unwrap_or(false);
    if is_json {
      match from_json::<Value>(bytes) {
        Ok(value) => return Self::Json(value),
        Err(err) => debug!("response announced as JSON failed to parse: {err}"),
      }
    }
    Self::Text(String::from_utf8_lossy(bytes).into_owned())
  }

  /// Retrieve the JSON value, if the body is one.
  #[inline]
  pub fn as_json(&self) -> Option<&Value> {
    match self {
      Self::Json(value) => Some(value),
      Self::Empty | Self::Text(..) => None,
    }
  }

  /// Convert the body into a JSON value, mapping an empty body to
  /// `null` and text to a JSON string.
  pub fn into_json(self) -> Value {
    match self {
      Self::Empty => Value::Null,
      Self::Json(value) => value,
      Self::Text(text) => Value::String(text),
    }
  }
}


/// The rate limit information reported along with a response.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RateLimit {
  /// The number of requests allowed per minute.
  pub limit: u64,
  /// The number of requests left in the current window.
  pub remaining: u64,
  /// The UNIX epoch (in seconds) at which the window resets.
  pub reset: u64,
}

impl RateLimit {
  fn from_headers(headers: &HeaderMap) -> Option<Self> {
    let number = |name: &str| {
      headers
        .get(name)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
    };

    Some(Self {
      limit: number(HDR_RATE_LIMIT)?,
      remaining: number(HDR_RATE_LIMIT_REMAINING)?,
      reset: number(HDR_RATE_LIMIT_RESET)?,
    })
  }
}


/// A successful response.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
  /// The HTTP status (always in the 2xx range).
  pub status: StatusCode,
  /// The decoded body.
  pub body: Body,
  /// The request ID the service assigned, if reported.
  pub request_id: Option<String>,
  /// The rate limit information, if reported.
  pub rate_limit: Option<RateLimit>,
}

impl Response {
  pub(crate) fn new(status: StatusCode, headers: &HeaderMap, bytes: &[u8]) -> Self {
    let content_type = headers
      .get(CONTENT_TYPE)
      .and_then(|value| value.to_str().ok());

    Self {
      status,
      body: Body::decode(content_type, bytes),
      request_id: request_id(headers),
      rate_limit: RateLimit::from_headers(headers),
    }
  }
}


/// Extract the request ID from a set of response headers.
pub(crate) fn request_id(headers: &HeaderMap) -> Option<String> {
  headers
    .get(HDR_REQUEST_ID)
    .and_then(|value| value.to_str().ok())
    .map(str::to_owned)
}


#[cfg(test)]
mod tests {
  use super::*;

  use http::HeaderValue;

  use serde_json::json;

  use test_log::test;


  /// Check that bodies are decoded based on their content type.
  #[test]
  fn decode_body() {
    let body = Body::decode(Some("application/json; charset=utf-8"), br#"[{"id":"abc"}]"#);
    assert_eq!(body, Body::Json(json!([{"id": "abc"}])));

    let body = Body::decode(Some("text/plain"), b"{}");
    assert_eq!(body, Body::Text("{}".to_string()));

    let body = Body::decode(Some("application/json"), b"not json");
    assert_eq!(body, Body::Text("not json".to_string()));

    let body = Body::decode(Some("application/json"), b"");
    assert_eq!(body, Body::Empty);
    assert_eq!(body.into_json(), Value::Null);
  }

  /// Check that we pick up the headers of interest.
  #[test]
  fn response_headers() {
    let mut headers = HeaderMap::new();
    let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let _ = headers.insert(HDR_REQUEST_ID, HeaderValue::from_static("0d29ba8d9a51ee0eb4"));
    let _ = headers.insert(HDR_RATE_LIMIT, HeaderValue::from_static("200"));
    let _ = headers.insert(HDR_RATE_LIMIT_REMAINING, HeaderValue::from_static("199"));
    let _ = headers.insert(HDR_RATE_LIMIT_RESET, HeaderValue::from_static("1700000000"));

    let response = Response::new(StatusCode::OK, &headers, br#"{"id":"abc123"}"#);
    assert_eq!(response.body.as_json(), Some(&json!({"id": "abc123"})));
    assert_eq!(response.request_id.as_deref(), Some("0d29ba8d9a51ee0eb4"));
    assert_eq!(
      response.rate_limit,
      Some(RateLimit {
        limit: 200,
        remaining: 199,
        reset: 1700000000,
      })
    );

    let _ = headers.remove(HDR_RATE_LIMIT_RESET);
    let response = Response::new(StatusCode::OK, &headers, b"");
    assert_eq!(response.rate_limit, None);
    assert_eq!(response.body, Body::Empty);
  }
}

// Copyright (C) 2019-2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::str::from_utf8;
use std::time::Duration;

use http::StatusCode;
use hyper::Error as HyperError;
use hyper_util::client::legacy::Error as ClientError;
use serde::Deserialize;
use serde_json::from_slice as from_json;
use thiserror::Error;

use crate::Str;


/// An error object as reported by the Alpaca API.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct ApiError {
  /// An error code as provided by Alpaca.
  #[serde(rename = "code", default)]
  pub code: Option<u64>,
  /// A message as provided by Alpaca.
  #[serde(rename = "message")]
  pub message: String,
}


/// The raw body of an HTTP response.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HttpBody(pub(crate) Vec<u8>);

impl HttpBody {
  /// Retrieve the raw bytes making up the body.
  #[inline]
  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }

  /// Check whether the body is empty.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl Display for HttpBody {
  fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
    match from_utf8(&self.0) {
      Ok(s) => fmt.write_str(s)?,
      Err(b) => write!(fmt, "{:?}", b)?,
    }
    Ok(())
  }
}

impl From<Vec<u8>> for HttpBody {
  fn from(bytes: Vec<u8>) -> Self {
    Self(bytes)
  }
}


/// The details of a request that was answered with a non-success
/// HTTP status.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HttpFailure {
  /// The HTTP status the service responded with.
  pub status: StatusCode,
  /// The endpoint attempted, as `<METHOD> <path>`.
  pub endpoint: String,
  /// The raw response body.
  pub body: HttpBody,
  /// The request ID the service assigned, if reported.
  pub request_id: Option<String>,
}

impl HttpFailure {
  /// Decode the body as an Alpaca error object, if possible.
  pub fn api_error(&self) -> Option<ApiError> {
    from_json::<ApiError>(self.body.as_bytes()).ok()
  }

  /// Retrieve the most descriptive message available: the message
  /// reported by the service or, failing that, the raw body.
  pub fn message(&self) -> String {
    match self.api_error() {
      Some(ApiError {
        code: Some(code),
        message,
      }) => format!("{message} ({code})"),
      Some(ApiError {
        code: None,
        message,
      }) => message,
      None => self.body.to_string(),
    }
  }
}

impl Display for HttpFailure {
  fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
    write!(fmt, "{}: HTTP status {}", self.endpoint, self.status)?;
    if !self.body.is_empty() {
      write!(fmt, ": {}", self.message())?;
    }
    Ok(())
  }
}


/// The ways in which exchanging data with the service can fail.
#[derive(Debug, Error)]
pub enum TransportError {
  /// The request did not complete in time.
  #[error("the request timed out after {0:?}")]
  Timeout(Duration),
  /// The request could not be sent or no response was received.
  #[error("failed to send the request")]
  Send(#[source] ClientError),
  /// The response body could not be received.
  #[error("failed to receive the response body")]
  Receive(#[source] HyperError),
  /// The response body could not be decompressed.
  #[error("failed to decompress the response body")]
  Decompress(#[source] std::io::Error),
}


/// The error type as used by this crate.
#[derive(Debug, Error)]
pub enum Error {
  /// The key ID or secret is missing or invalid.
  #[error("{0}")]
  Credential(Str),
  /// The configuration, for example the base URL, is invalid.
  #[error("{0}")]
  Config(Str),
  /// The request could not be constructed.
  #[error("failed to build request: {0}")]
  RequestBuild(Str),
  /// The request could not be delivered or the response not received.
  #[error("request to {endpoint} failed")]
  Transport {
    /// The endpoint attempted, as `<METHOD> <path>`.
    endpoint: String,
    /// The underlying cause.
    #[source]
    source: TransportError,
  },
  /// The request was malformed or semantically rejected (HTTP 400 or
  /// 422).
  #[error("the request was rejected: {0}")]
  Validation(HttpFailure),
  /// The credentials were rejected or are insufficient (HTTP 401 or
  /// 403).
  #[error("authentication failed: {0}")]
  Auth(HttpFailure),
  /// The resource was not found (HTTP 404).
  #[error("the resource was not found: {0}")]
  NotFound(HttpFailure),
  /// The rate limit was exceeded (HTTP 429).
  #[error("the rate limit was exceeded: {0}")]
  RateLimit(HttpFailure),
  /// The service failed to handle the request (HTTP 5xx).
  #[error("the service reported an error: {0}")]
  Service(HttpFailure),
  /// An HTTP status outside of the above categories was encountered.
  #[error("encountered an unexpected HTTP status: {0}")]
  UnexpectedStatus(HttpFailure),
}

impl Error {
  /// Classify an unsuccessful response by its HTTP status.
  pub(crate) fn from_failure(failure: HttpFailure) -> Self {
    match failure.status {
      StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Self::Validation(failure),
      StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth(failure),
      StatusCode::NOT_FOUND => Self::NotFound(failure),
      StatusCode::TOO_MANY_REQUESTS => Self::RateLimit(failure),
      status if status.is_server_error() => Self::Service(failure),
      _ => Self::UnexpectedStatus(failure),
    }
  }

  /// Retrieve the kind of this error.
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Credential(..) => ErrorKind::Credential,
      Self::Config(..) => ErrorKind::Config,
      Self::RequestBuild(..) => ErrorKind::RequestBuild,
      Self::Transport { .. } => ErrorKind::Transport,
      Self::Validation(..) => ErrorKind::Validation,
      Self::Auth(..) => ErrorKind::Auth,
      Self::NotFound(..) => ErrorKind::NotFound,
      Self::RateLimit(..) => ErrorKind::RateLimit,
      Self::Service(..) => ErrorKind::Service,
      Self::UnexpectedStatus(..) => ErrorKind::UnexpectedStatus,
    }
  }

  /// Retrieve the details of the unsuccessful response, if the error
  /// was caused by one.
  pub fn http_failure(&self) -> Option<&HttpFailure> {
    match self {
      Self::Validation(failure) |
      Self::Auth(failure) |
      Self::NotFound(failure) |
      Self::RateLimit(failure) |
      Self::Service(failure) |
      Self::UnexpectedStatus(failure) => Some(failure),
      Self::Credential(..) | Self::Config(..) | Self::RequestBuild(..) | Self::Transport { .. } => {
        None
      },
    }
  }

  /// Retrieve the HTTP status the service responded with, if any.
  #[inline]
  pub fn status(&self) -> Option<StatusCode> {
    self.http_failure().map(|failure| failure.status)
  }

  /// Retrieve the raw response body, if any.
  #[inline]
  pub fn body(&self) -> Option<&HttpBody> {
    self.http_failure().map(|failure| &failure.body)
  }

  /// Retrieve the endpoint that was attempted, if the error occurred
  /// after the request was sent.
  pub fn endpoint(&self) -> Option<&str> {
    match self {
      Self::Transport { endpoint, .. } => Some(endpoint),
      _ => self.http_failure().map(|failure| failure.endpoint.as_str()),
    }
  }
}


/// A classification of [`Error`] values.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
  /// See [`Error::Credential`].
  Credential,
  /// See [`Error::Config`].
  Config,
  /// See [`Error::RequestBuild`].
  RequestBuild,
  /// See [`Error::Transport`].
  Transport,
  /// See [`Error::Validation`].
  Validation,
  /// See [`Error::Auth`].
  Auth,
  /// See [`Error::NotFound`].
  NotFound,
  /// See [`Error::RateLimit`].
  RateLimit,
  /// See [`Error::Service`].
  Service,
  /// See [`Error::UnexpectedStatus`].
  UnexpectedStatus,
}

impl ErrorKind {
  /// All error kinds.
  pub const ALL: [ErrorKind; 10] = [
    Self::Credential,
    Self::Config,
    Self::RequestBuild,
    Self::Transport,
    Self::Validation,
    Self::Auth,
    Self::NotFound,
    Self::RateLimit,
    Self::Service,
    Self::UnexpectedStatus,
  ];

  /// The process exit code reserved for this kind of error.
  ///
  /// Codes 0 through 2 are taken by success, internal failures, and
  /// command line usage errors, respectively.
  pub const fn exit_code(self) -> u8 {
    match self {
      Self::Credential => 3,
      Self::Config => 4,
      Self::RequestBuild => 5,
      Self::Transport => 6,
      Self::Validation => 7,
      Self::Auth => 8,
      Self::NotFound => 9,
      Self::RateLimit => 10,
      Self::Service => 11,
      Self::UnexpectedStatus => 12,
    }
  }

  /// The name of this kind of error.
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Credential => "CredentialError",
      Self::Config => "ConfigError",
      Self::RequestBuild => "RequestBuildError",
      Self::Transport => "TransportError",
      Self::Validation => "ValidationError",
      Self::Auth => "AuthError",
      Self::NotFound => "NotFoundError",
      Self::RateLimit => "RateLimitError",
      Self::Service => "ServiceError",
      Self::UnexpectedStatus => "UnexpectedStatusError",
    }
  }

  /// Check whether a request failing with this kind of error may
  /// succeed when issued again unchanged.
  pub const fn is_retryable(self) -> bool {
    matches!(self, Self::Transport | Self::RateLimit | Self::Service)
  }
}

impl Display for ErrorKind {
  fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
    fmt.write_str(self.as_str())
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  use std::collections::HashSet;

  use test_log::test;


  fn http_failure(status: u16, body: &str) -> HttpFailure {
    HttpFailure {
      status: StatusCode::from_u16(status).unwrap(),
      endpoint: "GET /v2/account".to_string(),
      body: HttpBody(body.as_bytes().to_vec()),
      request_id: None,
    }
  }

  /// Check that HTTP statuses are mapped onto the expected error
  /// kinds.
  #[test]
  fn status_classification() {
    let cases = [
      (400, ErrorKind::Validation),
      (422, ErrorKind::Validation),
      (401, ErrorKind::Auth),
      (403, ErrorKind::Auth),
      (404, ErrorKind::NotFound),
      (429, ErrorKind::RateLimit),
      (500, ErrorKind::Service),
      (503, ErrorKind::Service),
      (302, ErrorKind::UnexpectedStatus),
      (409, ErrorKind::UnexpectedStatus),
    ];

    for (status, kind) in cases {
      let error = Error::from_failure(http_failure(status, ""));
      assert_eq!(error.kind(), kind, "{status}");
      assert_eq!(error.status(), Some(StatusCode::from_u16(status).unwrap()));
    }
  }

  /// Make sure that every error kind has its own exit code and that
  /// none of them clashes with the generic ones.
  #[test]
  fn distinct_exit_codes() {
    let codes = ErrorKind::ALL
      .iter()
      .map(|kind| kind.exit_code())
      .collect::<HashSet<_>>();
    assert_eq!(codes.len(), ErrorKind::ALL.len());
    assert!(codes.iter().all(|code| *code > 2));
  }

  /// Check that we surface the message reported by Alpaca.
  #[test]
  fn failure_message() {
    let failure = http_failure(422, r#"{"code":40010001,"message":"qty must be > 0"}"#);
    assert_eq!(failure.message(), "qty must be > 0 (40010001)");
    assert_eq!(
      failure.to_string(),
      "GET /v2/account: HTTP status 422 Unprocessable Entity: qty must be > 0 (40010001)"
    );

    let failure = http_failure(404, r#"{"message":"order not found"}"#);
    assert_eq!(failure.message(), "order not found");

    let failure = http_failure(502, "<html>bad gateway</html>");
    assert_eq!(failure.api_error(), None);
    assert_eq!(failure.message(), "<html>bad gateway</html>");
  }

  /// Check that local errors carry no HTTP context.
  #[test]
  fn local_error_context() {
    let error = Error::RequestBuild("missing value".into());
    assert_eq!(error.kind(), ErrorKind::RequestBuild);
    assert_eq!(error.status(), None);
    assert_eq!(error.body(), None);
    assert_eq!(error.endpoint(), None);
    assert!(!error.kind().is_retryable());

    let error = Error::Transport {
      endpoint: "GET /v2/account".to_string(),
      source: TransportError::Timeout(Duration::from_secs(1)),
    };
    assert_eq!(error.endpoint(), Some("GET /v2/account"));
    assert!(error.kind().is_retryable());
  }
}

// Copyright (C) 2019-2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::str::from_utf8;
use std::time::Duration;

use http::header::CONTENT_TYPE;
use http::request::Builder as HttpRequestBuilder;
use http::HeaderMap;
use http::HeaderValue;
use http::Request as HttpRequest;
use http::Response as HttpResponse;
use http_body_util::BodyExt;
use http_body_util::Full;

use hyper::body::Bytes;
use hyper::body::Incoming;
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Builder as HttpClientBuilder;
use hyper_util::client::legacy::Client as HttpClient;
use hyper_util::rt::TokioExecutor;

use serde_json::Value;

use tokio::time::timeout;

use tracing::debug;
use tracing::field::debug;
use tracing::field::DebugValue;
use tracing::span;
use tracing::trace;
use tracing::Level;
use tracing_futures::Instrument;

use crate::api::HDR_KEY_ID;
use crate::api::HDR_SECRET;
use crate::api_info::ApiInfo;
use crate::endpoint::Method;
use crate::error::HttpFailure;
use crate::error::TransportError;
use crate::request::Request;
use crate::response::request_id;
use crate::response::Response;
use crate::Error;


/// A type providing a debug representation of HTTP headers, with
/// sensitive data being masked out.
struct DebugHeaders<'h> {
  headers: &'h HeaderMap<HeaderValue>,
}

impl Debug for DebugHeaders<'_> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    static MASKED: HeaderValue = HeaderValue::from_static("<masked>");

    f.debug_map()
      .entries(self.headers.iter().map(|(k, v)| {
        if k == HDR_KEY_ID || k == HDR_SECRET {
          (k, &MASKED)
        } else {
          (k, v)
        }
      }))
      .finish()
  }
}


/// A type providing a debug representation of an HTTP request, with
/// sensitive data being masked out.
struct DebugRequest<'r> {
  request: &'r HttpRequest<Full<Bytes>>,
}

impl Debug for DebugRequest<'_> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    // Note that we do not print URL and method, because we assume they
    // are already included as identifiers in the span of the usage
    // site.
    f.debug_struct("Request")
      .field("version", &self.request.version())
      .field(
        "headers",
        &DebugHeaders {
          headers: self.request.headers(),
        },
      )
      .field("body", self.request.body())
      .finish()
  }
}


/// Emit a debug representation of an HTTP request.
fn debug_request(request: &HttpRequest<Full<Bytes>>) -> DebugValue<DebugRequest<'_>> {
  debug(DebugRequest { request })
}


/// A builder for creating customized `Client` objects.
#[derive(Debug)]
pub struct Builder {
  builder: HttpClientBuilder,
  timeout: Option<Duration>,
}

impl Builder {
  /// Set the time after which an outstanding request is abandoned.
  ///
  /// The timeout covers sending the request as well as receiving the
  /// complete response. By default requests do not time out.
  #[inline]
  pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
    self.timeout = Some(timeout);
    self
  }

  /// Build the final `Client` object.
  pub fn build(&self, api_info: ApiInfo) -> Client {
    let https = HttpsConnector::new();
    let client = self.builder.build(https);

    Client {
      api_info,
      client,
      timeout: self.timeout,
    }
  }
}

impl Default for Builder {
  #[cfg(test)]
  fn default() -> Self {
    // Idle connections are kept alive by tasks spawned on the runtime
    // that created them. Every test uses its own runtime (and mock
    // server), so there is nothing to gain from pooling and we disable
    // it.
    let mut builder = HttpClient::builder(TokioExecutor::new());
    let _ = builder.pool_max_idle_per_host(0);

    Self {
      builder,
      timeout: None,
    }
  }

  #[cfg(not(test))]
  #[inline]
  fn default() -> Self {
    Self {
      builder: HttpClient::builder(TokioExecutor::new()),
      timeout: None,
    }
  }
}


/// A `Client` is the entity used by clients of this module for
/// interacting with the Alpaca API.
///
/// Every call results in a single HTTP request. The client does not
/// retry failed requests; whether and when to do so is up to the
/// caller, as, for example, re-submitting an order is not idempotent.
#[derive(Debug)]
pub struct Client {
  api_info: ApiInfo,
  client: HttpClient<HttpsConnector<HttpConnector>, Full<Bytes>>,
  timeout: Option<Duration>,
}

impl Client {
  /// Instantiate a new `Builder` which allows for creating a customized `Client`.
  #[inline]
  pub fn builder() -> Builder {
    Builder::default()
  }

  /// Create a new `Client` using the given API information for
  /// connecting to the API.
  #[inline]
  pub fn new(api_info: ApiInfo) -> Self {
    Builder::default().build(api_info)
  }

  /// Add "gzip" as an accepted encoding to the request.
  #[cfg(feature = "gzip")]
  fn maybe_add_gzip_header(request: &mut HttpRequest<Full<Bytes>>) {
    use http::header::ACCEPT_ENCODING;

    let _ = request
      .headers_mut()
      .insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
  }

  /// An implementation stub not actually doing anything.
  #[cfg(not(feature = "gzip"))]
  fn maybe_add_gzip_header(_request: &mut HttpRequest<Full<Bytes>>) {}

  /// Create an HTTP request from a `Request`.
  fn request(&self, input: &Request) -> Result<HttpRequest<Full<Bytes>>, Error> {
    let url = input.url(&self.api_info)?;
    let body = input.json_body()?;

    let mut builder = HttpRequestBuilder::new()
      .method(http::Method::from(input.method()))
      .uri(url.as_str())
      // Add required authentication information.
      .header(HDR_KEY_ID, self.api_info.key_id.as_str())
      .header(HDR_SECRET, self.api_info.secret.as_str());

    if body.is_some() {
      builder = builder.header(CONTENT_TYPE, "application/json");
    }

    let body = body.map(Bytes::from).unwrap_or_default();
    let mut request = builder
      .body(Full::new(body))
      .map_err(|err| Error::RequestBuild(format!("invalid request: {err}").into()))?;

    Self::maybe_add_gzip_header(&mut request);
    Ok(request)
  }

  async fn retrieve_raw_body(response: Incoming) -> Result<Bytes, TransportError> {
    // We unconditionally wait for the full body to be received before
    // evaluating it. Responses are consumed in their entirety by the
    // caller anyway.
    let bytes = BodyExt::collect(response)
      .await
      .map_err(TransportError::Receive)?
      .to_bytes();
    Ok(bytes)
  }

  /// Retrieve the HTTP body, possible uncompressing it if it was gzip
  /// encoded.
  #[cfg(feature = "gzip")]
  async fn retrieve_body(body: Incoming, headers: &HeaderMap) -> Result<Bytes, TransportError> {
    use async_compression::futures::bufread::GzipDecoder;
    use futures::AsyncReadExt as _;
    use http::header::CONTENT_ENCODING;

    let encoding = headers.get(CONTENT_ENCODING);
    let bytes = Self::retrieve_raw_body(body).await?;
    let bytes = match encoding {
      Some(value) if value == HeaderValue::from_static("gzip") => {
        let mut buffer = Vec::new();
        let _count = GzipDecoder::new(&*bytes)
          .read_to_end(&mut buffer)
          .await
          .map_err(TransportError::Decompress)?;
        buffer.into()
      },
      _ => bytes,
    };

    Ok(bytes)
  }

  /// Retrieve the HTTP body.
  #[cfg(not(feature = "gzip"))]
  async fn retrieve_body(body: Incoming, _headers: &HeaderMap) -> Result<Bytes, TransportError> {
    Self::retrieve_raw_body(body).await
  }

  /// Issue a request and decode the response.
  ///
  /// Local problems, such as a missing path parameter, are reported
  /// before anything is sent. Otherwise exactly one HTTP request is
  /// issued. A 2xx response is returned with its body decoded but
  /// otherwise unchanged; any other status is mapped onto an [`Error`]
  /// that carries the status, the raw body, and the endpoint.
  pub async fn issue(&self, input: &Request) -> Result<Response, Error> {
    let request = self.request(input)?;
    let endpoint = input.describe();
    let span = span!(
      Level::INFO,
      "issue",
      method = display(request.method()),
      uri = display(request.uri())
    );

    let result = match self.timeout {
      Some(duration) => timeout(duration, self.issue_(request).instrument(span))
        .await
        .unwrap_or(Err(TransportError::Timeout(duration))),
      None => self.issue_(request).instrument(span).await,
    };

    let (status, headers, bytes) =
      result.map_err(|source| Error::Transport {
        endpoint: endpoint.clone(),
        source,
      })?;

    if status.is_success() {
      Ok(Response::new(status, &headers, &bytes))
    } else {
      let failure = HttpFailure {
        status,
        endpoint,
        body: bytes.to_vec().into(),
        request_id: request_id(&headers),
      };
      Err(Error::from_failure(failure))
    }
  }

  /// Send a request and receive the response.
  #[allow(clippy::cognitive_complexity)]
  async fn issue_(
    &self,
    request: HttpRequest<Full<Bytes>>,
  ) -> Result<(http::StatusCode, HeaderMap, Bytes), TransportError> {
    debug!("requesting");
    trace!(request = debug_request(&request));

    let result = self
      .client
      .request(request)
      .await
      .map_err(TransportError::Send)?;
    let status = result.status();
    debug!(status = debug(&status));
    trace!(response = debug(&result));

    let (parts, body): (_, Incoming) = HttpResponse::into_parts(result);
    let bytes = Self::retrieve_body(body, &parts.headers).await?;
    match from_utf8(&bytes) {
      Ok(s) => trace!(body = display(&s)),
      Err(b) => trace!(body = display(&b)),
    }

    Ok((status, parts.headers, bytes))
  }

  /// Issue a request for the given method and path template.
  ///
  /// `path_params` has to provide a value for every `{name}`
  /// placeholder in `path`. `query` parameters are percent-encoded and
  /// `body` is sent as JSON for POST and PATCH requests. See
  /// [`Client::issue`] for how the outcome is reported.
  pub async fn call(
    &self,
    method: Method,
    path: &str,
    path_params: &[(&str, &str)],
    query: Option<&serde_json::Map<String, Value>>,
    body: Option<Value>,
  ) -> Result<Response, Error> {
    let mut request = path_params
      .iter()
      .fold(Request::new(method, path.to_string()), |request, (name, value)| {
        request.param(*name, *value)
      });

    if let Some(query) = query {
      request = query
        .iter()
        .fold(request, |request, (name, value)| request.query(name.clone(), value.clone()));
    }
    if let Some(body) = body {
      request = request.body(body);
    }

    self.issue(&request).await
  }

  /// Retrieve the `ApiInfo` object used by this `Client` instance.
  #[inline]
  pub fn api_info(&self) -> &ApiInfo {
    &self.api_info
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  use http::StatusCode;

  use serde_json::json;

  use test_log::test;

  use wiremock::matchers::body_json;
  use wiremock::matchers::header;
  use wiremock::matchers::method;
  use wiremock::matchers::path;
  use wiremock::matchers::query_param;
  use wiremock::Mock;
  use wiremock::MockServer;
  use wiremock::ResponseTemplate;

  use crate::api::v2::orders;
  use crate::api::v2::positions;
  use crate::data::v1beta3::crypto;
  use crate::Body;
  use crate::ErrorKind;


  fn client(server: &MockServer) -> Client {
    let api_info = ApiInfo::from_parts(server.uri(), "key-id", "secret").unwrap();
    Client::new(api_info)
  }

  /// Check that we can retrieve the `ApiInfo` object used by a client.
  #[test]
  fn client_api_info() {
    let api_info = ApiInfo::from_parts("http://localhost:1", "key", "secret").unwrap();
    let client = Client::builder().build(api_info.clone());
    assert_eq!(&api_info, client.api_info());
  }

  /// Check that formatting a [`DebugRequest`] masks secret values.
  #[test]
  fn request_debugging() {
    let api_info = ApiInfo::from_parts("http://localhost:1", "key", "top-secret").unwrap();
    let client = Client::builder().build(api_info);

    let request = client.request(&Request::endpoint(&orders::LIST)).unwrap();
    let value = debug_request(&request);
    let string = format!("{value:?}");
    assert!(string.contains("<masked>"), "{string}");
    assert!(!string.contains("top-secret"), "{string}");
  }

  /// Make sure that the authentication headers and the content type are
  /// set as expected.
  #[test]
  fn request_headers() {
    let api_info = ApiInfo::from_parts("http://localhost:1", "key", "secret").unwrap();
    let client = Client::new(api_info);

    let request = Request::endpoint(&orders::SUBMIT).body(json!({"symbol": "AAPL"}));
    let request = client.request(&request).unwrap();
    let headers = request.headers();
    assert_eq!(headers.get(HDR_KEY_ID).unwrap(), "key");
    assert_eq!(headers.get(HDR_SECRET).unwrap(), "secret");
    assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");

    let request = client.request(&Request::endpoint(&orders::LIST)).unwrap();
    assert_eq!(request.headers().get(CONTENT_TYPE), None);
  }

  /// Check that a successful response body is handed through
  /// unchanged.
  #[test(tokio::test)]
  async fn submit_order() {
    let server = MockServer::start().await;
    let order = json!({
      "symbol": "AAPL",
      "qty": "10",
      "side": "buy",
      "type": "market",
      "time_in_force": "gtc",
    });
    let accepted = json!({"id": "abc123", "status": "accepted"});

    Mock::given(method("POST"))
      .and(path("/v2/orders"))
      .and(header(HDR_KEY_ID, "key-id"))
      .and(header(HDR_SECRET, "secret"))
      .and(header("content-type", "application/json"))
      .and(body_json(&order))
      .respond_with(ResponseTemplate::new(200).set_body_json(&accepted))
      .expect(1)
      .mount(&server)
      .await;

    let client = client(&server);
    let response = client
      .call(Method::Post, "/v2/orders", &[], None, Some(order))
      .await
      .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Body::Json(accepted));
  }

  /// Check that a 404 response is reported as such, with the body
  /// retained.
  #[test(tokio::test)]
  async fn cancel_non_existent_order() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/v2/orders/zzz"))
      .respond_with(
        ResponseTemplate::new(404)
          .set_body_json(json!({"message": "order not found"}))
          .insert_header("x-request-id", "req-1"),
      )
      .expect(1)
      .mount(&server)
      .await;

    let client = client(&server);
    let request = Request::endpoint(&orders::CANCEL).param("order_id", "zzz");
    let err = client.issue(&request).await.unwrap_err();

    match &err {
      Error::NotFound(failure) => {
        assert_eq!(failure.status, StatusCode::NOT_FOUND);
        assert_eq!(failure.endpoint, "DELETE /v2/orders/zzz");
        assert_eq!(failure.body.to_string(), r#"{"message":"order not found"}"#);
        assert_eq!(failure.message(), "order not found");
        assert_eq!(failure.request_id.as_deref(), Some("req-1"));
      },
      _ => panic!("Received unexpected error: {err:?}"),
    }
    assert_eq!(err.kind().exit_code(), 9);
  }

  /// Check the mapping of HTTP status codes onto errors.
  #[test(tokio::test)]
  async fn status_mapping() {
    let cases = [
      (401, ErrorKind::Auth),
      (403, ErrorKind::Auth),
      (404, ErrorKind::NotFound),
      (422, ErrorKind::Validation),
      (429, ErrorKind::RateLimit),
      (500, ErrorKind::Service),
      (418, ErrorKind::UnexpectedStatus),
    ];

    for (status, kind) in cases {
      let server = MockServer::start().await;
      Mock::given(method("GET"))
        .and(path("/v2/positions/AAPL"))
        .respond_with(ResponseTemplate::new(status).set_body_string("failure"))
        .expect(1)
        .mount(&server)
        .await;

      let client = client(&server);
      let request = Request::endpoint(&positions::GET).param("symbol", "AAPL");
      let err = client.issue(&request).await.unwrap_err();
      assert_eq!(err.kind(), kind, "{status}");
      assert_eq!(err.status().map(|status| status.as_u16()), Some(status));
      assert_eq!(err.body().unwrap().to_string(), "failure");
      assert_eq!(err.endpoint(), Some("GET /v2/positions/AAPL"));
    }
  }

  /// Make sure that no request is sent if a path parameter is missing.
  #[test(tokio::test)]
  async fn missing_path_parameter() {
    let server = MockServer::start().await;
    let client = client(&server);

    let err = client
      .call(Method::Get, "/v2/orders/{order_id}", &[], None, None)
      .await
      .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestBuild);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 0);
  }

  /// Make sure that cancelling an order with ID `..` is rejected before
  /// anything is sent.
  #[test(tokio::test)]
  async fn cancel_dot_segment_order() {
    let server = MockServer::start().await;
    let client = client(&server);

    let err = client.issue(&orders::cancel("..")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestBuild);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 0);
  }

  /// Check that query parameters arrive as expected.
  #[test(tokio::test)]
  async fn list_orders() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/v2/orders"))
      .and(query_param("status", "all"))
      .and(query_param("limit", "5"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .expect(1)
      .mount(&server)
      .await;

    let client = client(&server);
    let query = json!({"status": "all", "limit": 5});
    let response = client
      .call(Method::Get, "/v2/orders", &[], query.as_object(), None)
      .await
      .unwrap();
    assert_eq!(response.body, Body::Json(json!([])));
  }

  /// Make sure that market data requests go to the market data host.
  #[test(tokio::test)]
  async fn market_data_host() {
    let trading = MockServer::start().await;
    let data = MockServer::start().await;
    let quotes = json!({"quotes": {"BTC/USD": {"ap": 64000.5, "bp": 63999.5}}});

    Mock::given(method("GET"))
      .and(path("/v1beta3/crypto/us/latest/quotes"))
      .and(query_param("symbols", "BTC/USD,ETH/USD"))
      .respond_with(ResponseTemplate::new(200).set_body_json(&quotes))
      .expect(1)
      .mount(&data)
      .await;

    let api_info = ApiInfo::from_parts(trading.uri(), "key-id", "secret")
      .unwrap()
      .with_data_base_url(data.uri())
      .unwrap();
    let client = Client::new(api_info);
    let request = crypto::QuotesReq::new(["BTC/USD", "ETH/USD"]).request().unwrap();
    let response = client.issue(&request).await.unwrap();
    assert_eq!(response.body, Body::Json(quotes));

    let requests = trading.received_requests().await.unwrap();
    assert_eq!(requests.len(), 0);
  }

  /// Check that an empty response body is reported as such.
  #[test(tokio::test)]
  async fn empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/v2/orders/abc"))
      .respond_with(ResponseTemplate::new(204))
      .expect(1)
      .mount(&server)
      .await;

    let client = client(&server);
    let request = Request::endpoint(&orders::CANCEL).param("order_id", "abc");
    let response = client.issue(&request).await.unwrap();
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(response.body, Body::Empty);
  }

  /// Check that a request exceeding the timeout is abandoned.
  #[test(tokio::test)]
  async fn request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/v2/account"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!({}))
          .set_delay(Duration::from_secs(5)),
      )
      .mount(&server)
      .await;

    let api_info = ApiInfo::from_parts(server.uri(), "key-id", "secret").unwrap();
    let client = Client::builder()
      .timeout(Duration::from_millis(100))
      .build(api_info);
    let err = client
      .call(Method::Get, "/v2/account", &[], None, None)
      .await
      .unwrap_err();

    match err {
      Error::Transport {
        endpoint,
        source: TransportError::Timeout(duration),
      } => {
        assert_eq!(endpoint, "GET /v2/account");
        assert_eq!(duration, Duration::from_millis(100));
      },
      _ => panic!("Received unexpected error: {err:?}"),
    }
  }

  /// Check that a connection failure is reported as a transport error.
  #[test(tokio::test)]
  async fn connection_failure() {
    // Bind to an ephemeral port and release it again, so that nobody is
    // listening on it.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
      .unwrap()
      .local_addr()
      .unwrap()
      .port();
    let api_info = ApiInfo::from_parts(format!("http://127.0.0.1:{port}"), "key-id", "secret").unwrap();
    let client = Client::new(api_info);
    let err = client
      .call(Method::Get, "/v2/account", &[], None, None)
      .await
      .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.kind().is_retryable());
  }
}

// Copyright (C) 2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::to_value;
use serde_json::Value;
use serde_urlencoded::to_string as to_query;

use tracing::warn;

use url::Url;

use crate::api_info::ApiInfo;
use crate::endpoint::Endpoint;
use crate::endpoint::Host;
use crate::endpoint::Method;
use crate::Error;
use crate::Str;


/// A request to be issued by a [`Client`][crate::Client].
///
/// A request is created for a single invocation: it combines the
/// method and path template of an operation with the values for the
/// template's placeholders, optional query parameters, and an optional
/// JSON body. Validation happens when the request is resolved into a
/// URL, right before it is sent.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
  method: Method,
  host: Host,
  path: Str,
  path_params: BTreeMap<String, String>,
  query: Vec<(String, Value)>,
  body: Option<Value>,
}

impl Request {
  /// Create a request for a path (template) on the trading API.
  pub fn new(method: Method, path: impl Into<Str>) -> Self {
    Self {
      method,
      host: Host::Trading,
      path: path.into(),
      path_params: BTreeMap::new(),
      query: Vec::new(),
      body: None,
    }
  }

  /// Create a request for a static endpoint definition.
  pub fn endpoint(endpoint: &Endpoint) -> Self {
    Self::new(endpoint.method, endpoint.path).host(endpoint.host)
  }

  /// Direct the request at the given host.
  #[inline]
  pub fn host(mut self, host: Host) -> Self {
    self.host = host;
    self
  }

  /// Supply the value for the path placeholder `{name}`.
  pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    let _prev = self.path_params.insert(name.into(), value.into());
    self
  }

  /// Add a query parameter.
  ///
  /// Strings are used verbatim, numbers and booleans in their JSON
  /// representation, arrays of those are joined with commas, and
  /// `null` values are omitted. Objects cannot be represented and will
  /// cause the request to fail to build.
  pub fn query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
    self.query.push((name.into(), value.into()));
    self
  }

  /// Add all fields of a serializable object as query parameters.
  ///
  /// The object has to serialize into a map, e.g., a struct.
  pub fn query_from<T>(mut self, query: &T) -> Result<Self, Error>
  where
    T: Serialize,
  {
    match to_value(query) {
      Ok(Value::Object(map)) => {
        self.query.extend(map);
        Ok(self)
      },
      Ok(value) => Err(Error::RequestBuild(
        format!("query parameters must form an object, not `{value}`").into(),
      )),
      Err(err) => Err(Error::RequestBuild(
        format!("failed to serialize query parameters: {err}").into(),
      )),
    }
  }

  /// Attach a JSON body.
  ///
  /// The body is only transmitted for POST and PATCH requests.
  #[inline]
  pub fn body(mut self, body: impl Into<Value>) -> Self {
    self.body = Some(body.into());
    self
  }

  /// Attach a serializable object as JSON body.
  pub fn body_from<T>(self, body: &T) -> Result<Self, Error>
  where
    T: Serialize,
  {
    let body = to_value(body).map_err(|err| {
      Error::RequestBuild(format!("failed to serialize request body: {err}").into())
    })?;
    Ok(self.body(body))
  }

  /// Retrieve the request's method.
  #[inline]
  pub fn method(&self) -> Method {
    self.method
  }

  /// Retrieve the path template.
  #[inline]
  pub fn path(&self) -> &str {
    &self.path
  }

  /// A textual representation of the endpoint in the form `<METHOD>
  /// <path>`, with placeholders substituted where possible.
  pub(crate) fn describe(&self) -> String {
    let path = resolve_path(&self.path, &self.path_params)
      .map(|segments| format!("/{}", segments.join("/")))
      .unwrap_or_else(|_| self.path.to_string());
    format!("{} {}", self.method, path)
  }

  /// Resolve the request into the full URL to send it to.
  pub fn url(&self, api_info: &ApiInfo) -> Result<Url, Error> {
    let mut url = match self.host {
      Host::Trading => api_info.base_url.clone(),
      Host::Data => api_info.data_base_url.clone(),
    };

    let segments = resolve_path(&self.path, &self.path_params)?;
    {
      let mut path = url.path_segments_mut().map_err(|()| {
        Error::Config(format!("base URL {} cannot be extended with a path", api_info.base_url).into())
      })?;
      let _ = path.pop_if_empty();
      let _ = path.extend(segments.iter());
    }

    let query = encode_query(&self.query)?;
    url.set_query(query.as_deref());
    url.set_fragment(None);
    Ok(url)
  }

  /// Retrieve the body to send, serialized as JSON.
  pub(crate) fn json_body(&self) -> Result<Option<Vec<u8>>, Error> {
    match &self.body {
      Some(body) if self.method.has_body() => serde_json::to_vec(body).map(Some).map_err(|err| {
        Error::RequestBuild(format!("failed to serialize request body: {err}").into())
      }),
      Some(..) => {
        warn!(
          method = display(self.method),
          "ignoring request body; it is only sent with POST and PATCH requests"
        );
        Ok(None)
      },
      None => Ok(None),
    }
  }
}


/// Substitute the placeholders in a path template, returning the
/// (unencoded) path segments.
fn resolve_path(template: &str, params: &BTreeMap<String, String>) -> Result<Vec<String>, Error> {
  let relative = template.strip_prefix('/').ok_or_else(|| {
    Error::RequestBuild(format!("path `{template}` must start with '/' (example: /v2/account)").into())
  })?;

  if let Some(c) = relative.chars().find(|c| matches!(c, '?' | '#')) {
    return Err(Error::RequestBuild(
      format!("path `{template}` must not contain '{c}'; supply query parameters separately")
        .into(),
    ))
  }

  let mut used = BTreeSet::new();
  let segments = relative
    .split('/')
    .map(|segment| substitute(template, segment, params, &mut used))
    .collect::<Result<Vec<_>, _>>()?;

  if let Some(unused) = params.keys().find(|name| !used.contains(name.as_str())) {
    return Err(Error::RequestBuild(
      format!("path `{template}` has no placeholder `{{{unused}}}`").into(),
    ))
  }
  Ok(segments)
}


/// Substitute all placeholders in a single path segment.
fn substitute<'p>(
  template: &str,
  segment: &str,
  params: &'p BTreeMap<String, String>,
  used: &mut BTreeSet<&'p str>,
) -> Result<String, Error> {
  let mut resolved = String::with_capacity(segment.len());
  let mut rest = segment;

  while let Some(start) = rest.find('{') {
    resolved.push_str(&rest[..start]);

    let after = &rest[start + 1..];
    let end = after.find('}').ok_or_else(|| {
      Error::RequestBuild(format!("path `{template}` contains an unterminated placeholder").into())
    })?;
    let name = &after[..end];
    let (key, value) = params.get_key_value(name).ok_or_else(|| {
      Error::RequestBuild(format!("no value supplied for path parameter `{name}`").into())
    })?;
    if value.is_empty() {
      return Err(Error::RequestBuild(
        format!("value for path parameter `{name}` must not be empty").into(),
      ))
    }

    let _ = used.insert(key.as_str());
    resolved.push_str(value);
    rest = &after[end + 1..];
  }

  if rest.contains('}') {
    return Err(Error::RequestBuild(
      format!("path `{template}` contains an unmatched '}}'").into(),
    ))
  }
  resolved.push_str(rest);

  // The URL would silently drop such a segment, changing the resource
  // the request refers to.
  if resolved == "." || resolved == ".." {
    return Err(Error::RequestBuild(
      format!("path `{template}` must not contain a `{resolved}` segment").into(),
    ))
  }
  Ok(resolved)
}


/// Convert a single query value into its textual representation.
fn query_value(name: &str, value: &Value) -> Result<Option<String>, Error> {
  fn scalar(name: &str, value: &Value) -> Result<Option<String>, Error> {
    match value {
      Value::Null => Ok(None),
      Value::String(s) => Ok(Some(s.clone())),
      Value::Bool(b) => Ok(Some(b.to_string())),
      Value::Number(n) => Ok(Some(n.to_string())),
      Value::Array(..) | Value::Object(..) => Err(Error::RequestBuild(
        format!("query parameter `{name}` must be a string, number, or boolean").into(),
      )),
    }
  }

  match value {
    // `serde_urlencoded` has no notion of sequences. Alpaca expects
    // lists (e.g., of symbols) to be comma separated instead.
    Value::Array(values) => {
      let values = values
        .iter()
        .map(|value| scalar(name, value))
        .filter_map(Result::transpose)
        .collect::<Result<Vec<_>, _>>()?;

      if values.is_empty() {
        Ok(None)
      } else {
        Ok(Some(values.join(",")))
      }
    },
    value => scalar(name, value),
  }
}


/// Percent-encode query parameters, preserving their order.
fn encode_query(query: &[(String, Value)]) -> Result<Option<String>, Error> {
  let mut pairs = Vec::with_capacity(query.len());
  for (name, value) in query {
    if let Some(value) = query_value(name, value)? {
      pairs.push((name.as_str(), value));
    }
  }

  if pairs.is_empty() {
    return Ok(None)
  }

  let query = to_query(&pairs)
    .map_err(|err| Error::RequestBuild(format!("failed to encode query: {err}").into()))?;
  Ok(Some(query))
}

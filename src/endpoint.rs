// Copyright (C) 2019-2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::str::FromStr;

use crate::Error;


/// The HTTP methods used by the Alpaca API.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
  /// A GET request.
  Get,
  /// A POST request.
  Post,
  /// A PATCH request.
  Patch,
  /// A DELETE request.
  Delete,
}

impl Method {
  /// Check whether a request using this method may carry a body.
  #[inline]
  pub const fn has_body(self) -> bool {
    matches!(self, Self::Post | Self::Patch)
  }

  /// The canonical (upper case) name of the method.
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Get => "GET",
      Self::Post => "POST",
      Self::Patch => "PATCH",
      Self::Delete => "DELETE",
    }
  }
}

impl Display for Method {
  fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
    fmt.write_str(self.as_str())
  }
}

impl FromStr for Method {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_uppercase().as_str() {
      "GET" => Ok(Self::Get),
      "POST" => Ok(Self::Post),
      "PATCH" => Ok(Self::Patch),
      "DELETE" => Ok(Self::Delete),
      _ => Err(Error::RequestBuild(
        format!("unsupported method `{s}`; supported: DELETE, GET, PATCH, POST").into(),
      )),
    }
  }
}

impl From<Method> for http::Method {
  fn from(method: Method) -> Self {
    match method {
      Method::Get => http::Method::GET,
      Method::Post => http::Method::POST,
      Method::Patch => http::Method::PATCH,
      Method::Delete => http::Method::DELETE,
    }
  }
}


/// The host a request is directed at.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Host {
  /// The configured trading API base URL (paper, live, or an
  /// override).
  #[default]
  Trading,
  /// The market data API, irrespective of the trading mode.
  Data,
}


/// A static description of an operation offered by the API.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Endpoint {
  /// The HTTP method to use.
  pub method: Method,
  /// The path, possibly containing `{name}` placeholders.
  pub path: &'static str,
  /// The host to direct requests at.
  pub host: Host,
}

impl Endpoint {
  /// Create an endpoint served by the trading API.
  pub const fn trading(method: Method, path: &'static str) -> Self {
    Self {
      method,
      path,
      host: Host::Trading,
    }
  }

  /// Create an endpoint served by the market data API.
  pub const fn data(method: Method, path: &'static str) -> Self {
    Self {
      method,
      path,
      host: Host::Data,
    }
  }

  /// Retrieve the names of the placeholders in the endpoint's path, in
  /// order of appearance.
  ///
  /// Malformed placeholders are skipped; they are reported once a
  /// request is built.
  pub fn placeholders(&self) -> impl Iterator<Item = &'static str> {
    placeholders(self.path)
  }
}

impl Display for Endpoint {
  fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
    write!(fmt, "{} {}", self.method, self.path)
  }
}


/// Iterate over the `{name}` placeholders in a path template.
pub(crate) fn placeholders(template: &str) -> impl Iterator<Item = &str> {
  template.split('/').flat_map(|segment| {
    let mut rest = segment;
    std::iter::from_fn(move || {
      let start = rest.find('{')?;
      let after = &rest[start + 1..];
      let end = after.find('}')?;
      let name = &after[..end];
      rest = &after[end + 1..];
      Some(name)
    })
  })
}

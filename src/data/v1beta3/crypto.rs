// Copyright (C) 2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use chrono::DateTime;
use chrono::Utc;

use serde::Deserialize;
use serde::Serialize;

use crate::Endpoint;
use crate::Error;
use crate::Method;
use crate::Request;


/// The GET request to the /v1beta3/crypto/us/latest/quotes endpoint,
/// retrieving the latest quotes for a set of crypto currency pairs.
pub const LATEST_QUOTES: Endpoint = Endpoint::data(Method::Get, "/v1beta3/crypto/us/latest/quotes");
/// The GET request to the /v1beta3/crypto/us/bars endpoint, retrieving
/// historic bars for a set of crypto currency pairs.
pub const BARS: Endpoint = Endpoint::data(Method::Get, "/v1beta3/crypto/us/bars");


/// The order in which bars are listed.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Sort {
  /// Oldest first.
  #[serde(rename = "asc")]
  Ascending,
  /// Newest first.
  #[serde(rename = "desc")]
  Descending,
}

impl_variant_str!(Sort);


fn check_symbols(symbols: &[String]) -> Result<(), Error> {
  if symbols.is_empty() {
    return Err(Error::RequestBuild(
      "at least one symbol (e.g., BTC/USD) is required".into(),
    ))
  }
  Ok(())
}


/// The query parameters of a GET request to the
/// /v1beta3/crypto/us/latest/quotes endpoint.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct QuotesReq {
  /// The currency pairs to retrieve quotes for, e.g., `BTC/USD`.
  #[serde(rename = "symbols")]
  pub symbols: Vec<String>,
}

impl QuotesReq {
  /// Create a `QuotesReq` for the provided symbols.
  pub fn new<I, S>(symbols: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      symbols: symbols.into_iter().map(S::into).collect(),
    }
  }

  /// Create a request retrieving the latest quotes.
  pub fn request(&self) -> Result<Request, Error> {
    let () = check_symbols(&self.symbols)?;
    Request::endpoint(&LATEST_QUOTES).query_from(self)
  }
}


/// The query parameters of a GET request to the
/// /v1beta3/crypto/us/bars endpoint.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct BarsReq {
  /// The currency pairs to retrieve bars for.
  #[serde(rename = "symbols")]
  pub symbols: Vec<String>,
  /// The time frame of a bar, e.g., `1Min`, `15Min`, `1Hour`, `1Day`.
  #[serde(rename = "timeframe")]
  pub timeframe: String,
  /// Only retrieve bars beginning at or after this time.
  #[serde(rename = "start", skip_serializing_if = "Option::is_none")]
  pub start: Option<DateTime<Utc>>,
  /// Only retrieve bars beginning up to this time.
  #[serde(rename = "end", skip_serializing_if = "Option::is_none")]
  pub end: Option<DateTime<Utc>>,
  /// The maximum number of bars to retrieve.
  #[serde(rename = "limit", skip_serializing_if = "Option::is_none")]
  pub limit: Option<usize>,
  /// The order of the result.
  #[serde(rename = "sort", skip_serializing_if = "Option::is_none")]
  pub sort: Option<Sort>,
  /// The page token from a previous response, to continue where it
  /// left off.
  #[serde(rename = "page_token", skip_serializing_if = "Option::is_none")]
  pub page_token: Option<String>,
}

impl BarsReq {
  /// Create a `BarsReq` for the provided symbols and time frame.
  pub fn new<I, S>(symbols: I, timeframe: impl Into<String>) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      symbols: symbols.into_iter().map(S::into).collect(),
      timeframe: timeframe.into(),
      ..Default::default()
    }
  }

  /// Create a request retrieving the bars.
  pub fn request(&self) -> Result<Request, Error> {
    let () = check_symbols(&self.symbols)?;
    if self.timeframe.is_empty() {
      return Err(Error::RequestBuild("a bar time frame (e.g., 1Min) is required".into()))
    }
    Request::endpoint(&BARS).query_from(self)
  }
}

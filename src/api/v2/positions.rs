// Copyright (C) 2019-2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use num_decimal::Num;

use serde::Serialize;

use crate::util::is_false;
use crate::Endpoint;
use crate::Error;
use crate::Method;
use crate::Request;


/// The GET request to the /v2/positions endpoint, listing all open
/// positions.
pub const LIST: Endpoint = Endpoint::trading(Method::Get, "/v2/positions");
/// The GET request to the /v2/positions/{symbol} endpoint, retrieving
/// the open position in a single asset.
pub const GET: Endpoint = Endpoint::trading(Method::Get, "/v2/positions/{symbol}");
/// The DELETE request to the /v2/positions/{symbol} endpoint,
/// liquidating (parts of) a position.
pub const CLOSE: Endpoint = Endpoint::trading(Method::Delete, "/v2/positions/{symbol}");
/// The DELETE request to the /v2/positions endpoint, liquidating all
/// open positions.
pub const CLOSE_ALL: Endpoint = Endpoint::trading(Method::Delete, "/v2/positions");

/// The name of the path parameter identifying a position.
const SYMBOL: &str = "symbol";


/// Create a request listing all open positions.
#[inline]
pub fn list() -> Request {
  Request::endpoint(&LIST)
}


/// Create a request retrieving the position in the asset with the
/// given symbol (or asset ID).
pub fn get(symbol: impl Into<String>) -> Request {
  Request::endpoint(&GET).param(SYMBOL, symbol)
}


/// The query parameters of a DELETE request to the
/// /v2/positions/{symbol} endpoint.
///
/// At most one of the two may be set. If neither is, the position is
/// closed completely.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CloseReq {
  /// The number of shares to liquidate.
  #[serde(rename = "qty", skip_serializing_if = "Option::is_none")]
  pub quantity: Option<Num>,
  /// The percentage of the position to liquidate.
  #[serde(rename = "percentage", skip_serializing_if = "Option::is_none")]
  pub percentage: Option<Num>,
}

impl CloseReq {
  /// Create a request closing the position in the asset with the given
  /// symbol.
  pub fn request(&self, symbol: impl Into<String>) -> Result<Request, Error> {
    if self.quantity.is_some() && self.percentage.is_some() {
      return Err(Error::RequestBuild(
        "only one of quantity and percentage may be provided".into(),
      ))
    }

    Request::endpoint(&CLOSE)
      .param(SYMBOL, symbol)
      .query_from(self)
  }
}


/// The query parameters of a DELETE request to the /v2/positions
/// endpoint.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CloseAllReq {
  /// Whether to cancel all open orders before liquidating.
  #[serde(rename = "cancel_orders", skip_serializing_if = "is_false")]
  pub cancel_orders: bool,
}

impl CloseAllReq {
  /// Create a request closing all open positions.
  pub fn request(&self) -> Result<Request, Error> {
    Request::endpoint(&CLOSE_ALL).query_from(self)
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  use std::str::FromStr as _;

  use test_log::test;

  use crate::ApiInfo;


  fn api_info() -> ApiInfo {
    ApiInfo::from_parts("https://paper-api.alpaca.markets", "key", "secret").unwrap()
  }

  /// Check that partially closing a position adds the amount to the
  /// query.
  #[test]
  fn close_position() {
    let url = CloseReq::default()
      .request("AAPL")
      .unwrap()
      .url(&api_info())
      .unwrap();
    assert_eq!(url.as_str(), "https://paper-api.alpaca.markets/v2/positions/AAPL");

    let request = CloseReq {
      percentage: Some(Num::from_str("12.5").unwrap()),
      ..Default::default()
    };
    let url = request.request("AAPL").unwrap().url(&api_info()).unwrap();
    assert_eq!(url.query(), Some("percentage=12.5"));
  }

  /// Make sure that quantity and percentage are mutually exclusive.
  #[test]
  fn close_position_conflicting_amounts() {
    let request = CloseReq {
      quantity: Some(Num::from(1)),
      percentage: Some(Num::from(50)),
    };
    let err = request.request("AAPL").unwrap_err();
    assert!(matches!(err, Error::RequestBuild(..)), "{err:?}");
  }

  /// Check that the request to close all positions optionally cancels
  /// orders.
  #[test]
  fn close_all_positions() {
    let request = CloseAllReq::default().request().unwrap();
    assert_eq!(request.method(), Method::Delete);
    assert_eq!(request.url(&api_info()).unwrap().query(), None);

    let request = CloseAllReq {
      cancel_orders: true,
    };
    let url = request.request().unwrap().url(&api_info()).unwrap();
    assert_eq!(url.query(), Some("cancel_orders=true"));
  }

  /// Check that symbols are used as path parameter.
  #[test]
  fn get_position() {
    let url = get("BTC/USD").url(&api_info()).unwrap();
    assert_eq!(url.path(), "/v2/positions/BTC%2FUSD");
    assert_eq!(list().url(&api_info()).unwrap().path(), "/v2/positions");
  }
}

// Copyright (C) 2019-2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use serde::Deserialize;
use serde::Serialize;

use crate::Endpoint;
use crate::Error;
use crate::Method;
use crate::Request;


/// The GET request to the /v2/assets endpoint, listing assets.
pub const LIST: Endpoint = Endpoint::trading(Method::Get, "/v2/assets");
/// The GET request to the /v2/assets/{symbol} endpoint, retrieving a
/// single asset by symbol or asset ID.
pub const GET: Endpoint = Endpoint::trading(Method::Get, "/v2/assets/{symbol}");


/// The status an asset can have.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Status {
  /// The asset is active.
  #[serde(rename = "active")]
  Active,
  /// The asset is inactive.
  #[serde(rename = "inactive")]
  Inactive,
}

impl_variant_str!(Status);


/// An enumeration of the various supported asset classes.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Class {
  /// US equities.
  #[serde(rename = "us_equity")]
  UsEquity,
  /// US options.
  #[serde(rename = "us_option")]
  UsOption,
  /// Crypto currencies.
  #[serde(rename = "crypto")]
  Crypto,
}

impl_variant_str!(Class);


/// The query parameters of a GET request to the /v2/assets endpoint.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ListReq {
  /// The status of the assets to list.
  #[serde(rename = "status", skip_serializing_if = "Option::is_none")]
  pub status: Option<Status>,
  /// The class of the assets to list. Alpaca defaults to US equities.
  #[serde(rename = "asset_class", skip_serializing_if = "Option::is_none")]
  pub class: Option<Class>,
  /// The exchange the assets to list are traded on, e.g., `NASDAQ`.
  #[serde(rename = "exchange", skip_serializing_if = "Option::is_none")]
  pub exchange: Option<String>,
}

impl ListReq {
  /// Create a request listing the assets matching the criteria.
  pub fn request(&self) -> Result<Request, Error> {
    Request::endpoint(&LIST).query_from(self)
  }
}


/// Create a request retrieving the asset with the given symbol (or
/// asset ID).
pub fn get(symbol: impl Into<String>) -> Request {
  Request::endpoint(&GET).param("symbol", symbol)
}

// Copyright (C) 2019-2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use chrono::NaiveDate;

use serde::Serialize;

use crate::Endpoint;
use crate::Error;
use crate::Method;
use crate::Request;


/// The GET request to the /v2/account endpoint, retrieving the account
/// information.
pub const GET: Endpoint = Endpoint::trading(Method::Get, "/v2/account");

/// The GET request to the /v2/account/portfolio/history endpoint,
/// retrieving the timeseries of the account's equity and profit/loss.
pub const PORTFOLIO_HISTORY: Endpoint =
  Endpoint::trading(Method::Get, "/v2/account/portfolio/history");


/// Create a request for retrieving the account information.
#[inline]
pub fn get() -> Request {
  Request::endpoint(&GET)
}


/// The query parameters of a GET request to the
/// /v2/account/portfolio/history endpoint.
///
/// All parameters are optional; Alpaca picks defaults (e.g., a period
/// of one month) for the ones not provided.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PortfolioHistoryReq {
  /// The duration of the data, as a number followed by a unit: `D`
  /// (day), `W` (week), `M` (month), or `A` (year), e.g., `1M`.
  #[serde(rename = "period", skip_serializing_if = "Option::is_none")]
  pub period: Option<String>,
  /// The resolution of the time window, e.g., `1Min`, `15Min`, `1H`,
  /// or `1D`.
  #[serde(rename = "timeframe", skip_serializing_if = "Option::is_none")]
  pub timeframe: Option<String>,
  /// The date the data is returned up to.
  #[serde(rename = "date_end", skip_serializing_if = "Option::is_none")]
  pub date_end: Option<NaiveDate>,
  /// Whether to include extended hours in the result. Only effective
  /// for timeframes less than `1D`.
  #[serde(rename = "extended_hours", skip_serializing_if = "Option::is_none")]
  pub extended_hours: Option<bool>,
}

impl PortfolioHistoryReq {
  /// Create a request for retrieving the portfolio history.
  pub fn request(&self) -> Result<Request, Error> {
    Request::endpoint(&PORTFOLIO_HISTORY).query_from(self)
  }
}

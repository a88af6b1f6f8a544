// Copyright (C) 2019-2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use chrono::DateTime;
use chrono::Utc;

use num_decimal::Num;

use serde::Deserialize;
use serde::Serialize;

use crate::util::is_false;
use crate::Endpoint;
use crate::Error;
use crate::Method;
use crate::Request;


/// The GET request to the /v2/orders endpoint, listing orders.
pub const LIST: Endpoint = Endpoint::trading(Method::Get, "/v2/orders");
/// The POST request to the /v2/orders endpoint, submitting an order.
pub const SUBMIT: Endpoint = Endpoint::trading(Method::Post, "/v2/orders");
/// The GET request to the /v2/orders/{order_id} endpoint, retrieving a
/// single order.
pub const GET: Endpoint = Endpoint::trading(Method::Get, "/v2/orders/{order_id}");
/// The PATCH request to the /v2/orders/{order_id} endpoint, replacing
/// an open order.
pub const REPLACE: Endpoint = Endpoint::trading(Method::Patch, "/v2/orders/{order_id}");
/// The DELETE request to the /v2/orders/{order_id} endpoint, canceling
/// an open order.
pub const CANCEL: Endpoint = Endpoint::trading(Method::Delete, "/v2/orders/{order_id}");
/// The DELETE request to the /v2/orders endpoint, canceling all open
/// orders.
pub const CANCEL_ALL: Endpoint = Endpoint::trading(Method::Delete, "/v2/orders");

/// The name of the path parameter identifying an order.
const ORDER_ID: &str = "order_id";


/// The status of the orders to list.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Status {
  /// List open orders only.
  #[serde(rename = "open")]
  Open,
  /// List closed orders only.
  #[serde(rename = "closed")]
  Closed,
  /// List all orders.
  #[serde(rename = "all")]
  All,
}

impl_variant_str!(Status);


/// The chronological order in which to list orders.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Direction {
  /// Oldest first.
  #[serde(rename = "asc")]
  Ascending,
  /// Newest first.
  #[serde(rename = "desc")]
  Descending,
}

impl_variant_str!(Direction);


/// The side an order is on.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Side {
  /// Buy an asset.
  #[serde(rename = "buy")]
  Buy,
  /// Sell an asset.
  #[serde(rename = "sell")]
  Sell,
}

impl_variant_str!(Side);


/// The type of an order.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Type {
  /// A market order.
  #[default]
  #[serde(rename = "market")]
  Market,
  /// A limit order.
  #[serde(rename = "limit")]
  Limit,
  /// A stop on quote order.
  #[serde(rename = "stop")]
  Stop,
  /// A stop limit order.
  #[serde(rename = "stop_limit")]
  StopLimit,
  /// A trailing stop order.
  #[serde(rename = "trailing_stop")]
  TrailingStop,
}

impl_variant_str!(Type);


/// A description of the time for which an order is valid.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum TimeInForce {
  /// The order is good for the day, and it will be canceled
  /// automatically at the end of Regular Trading Hours if unfilled.
  #[default]
  #[serde(rename = "day")]
  Day,
  /// The order is good until canceled.
  #[serde(rename = "gtc")]
  UntilCanceled,
  /// This order is eligible to execute only in the market opening
  /// auction.
  #[serde(rename = "opg")]
  UntilMarketOpen,
  /// This order is eligible to execute only in the market closing
  /// auction.
  #[serde(rename = "cls")]
  UntilMarketClose,
  /// The order has to be filled immediately, either fully or in part.
  /// The unfilled remainder is canceled.
  #[serde(rename = "ioc")]
  ImmediateOrCancel,
  /// The order has to be filled immediately and completely, or it is
  /// canceled.
  #[serde(rename = "fok")]
  FillOrKill,
}

impl_variant_str!(TimeInForce);


/// The amount of an asset to trade.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Amount {
  /// A number of shares (or units, for fractional or crypto trading).
  Quantity {
    /// The quantity.
    #[serde(rename = "qty")]
    quantity: Num,
  },
  /// A dollar amount to trade.
  Notional {
    /// The dollar amount.
    #[serde(rename = "notional")]
    notional: Num,
  },
}

impl Amount {
  /// Create an `Amount` representing a quantity.
  #[inline]
  pub fn quantity(amount: impl Into<Num>) -> Self {
    Self::Quantity {
      quantity: amount.into(),
    }
  }

  /// Create an `Amount` representing a dollar value.
  #[inline]
  pub fn notional(amount: impl Into<Num>) -> Self {
    Self::Notional {
      notional: amount.into(),
    }
  }
}


/// The body of a POST request to the /v2/orders endpoint.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct OrderReq {
  /// The symbol of the asset to trade.
  #[serde(rename = "symbol")]
  pub symbol: String,
  /// The amount to trade.
  #[serde(flatten)]
  pub amount: Amount,
  /// The side the order is on.
  #[serde(rename = "side")]
  pub side: Side,
  /// The type of the order.
  #[serde(rename = "type")]
  pub type_: Type,
  /// How long the order will be valid.
  #[serde(rename = "time_in_force")]
  pub time_in_force: TimeInForce,
  /// The limit price.
  #[serde(rename = "limit_price", skip_serializing_if = "Option::is_none")]
  pub limit_price: Option<Num>,
  /// The stop price.
  #[serde(rename = "stop_price", skip_serializing_if = "Option::is_none")]
  pub stop_price: Option<Num>,
  /// The dollar value away from the high water mark for trailing stop
  /// orders.
  #[serde(rename = "trail_price", skip_serializing_if = "Option::is_none")]
  pub trail_price: Option<Num>,
  /// The percent value away from the high water mark for trailing stop
  /// orders.
  #[serde(rename = "trail_percent", skip_serializing_if = "Option::is_none")]
  pub trail_percent: Option<Num>,
  /// Whether or not the order is eligible to execute during
  /// pre-market/after hours. Note that a value of `true` can only be
  /// combined with limit orders that are good for the day (i.e.,
  /// `TimeInForce::Day`).
  #[serde(rename = "extended_hours", default, skip_serializing_if = "is_false")]
  pub extended_hours: bool,
  /// A client specified ID for the order.
  #[serde(rename = "client_order_id", skip_serializing_if = "Option::is_none")]
  pub client_order_id: Option<String>,
}

impl OrderReq {
  /// Create a request for submitting the order.
  pub fn request(&self) -> Result<Request, Error> {
    Request::endpoint(&SUBMIT).body_from(self)
  }
}


/// A helper for initializing [`OrderReq`] objects.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderReqInit {
  /// See `OrderReq::type_`.
  pub type_: Type,
  /// See `OrderReq::time_in_force`.
  pub time_in_force: TimeInForce,
  /// See `OrderReq::limit_price`.
  pub limit_price: Option<Num>,
  /// See `OrderReq::stop_price`.
  pub stop_price: Option<Num>,
  /// See `OrderReq::trail_price`.
  pub trail_price: Option<Num>,
  /// See `OrderReq::trail_percent`.
  pub trail_percent: Option<Num>,
  /// See `OrderReq::extended_hours`.
  pub extended_hours: bool,
  /// See `OrderReq::client_order_id`.
  pub client_order_id: Option<String>,
}

impl OrderReqInit {
  /// Create an [`OrderReq`] from an `OrderReqInit`.
  pub fn init<S>(self, symbol: S, side: Side, amount: Amount) -> OrderReq
  where
    S: Into<String>,
  {
    OrderReq {
      symbol: symbol.into(),
      amount,
      side,
      type_: self.type_,
      time_in_force: self.time_in_force,
      limit_price: self.limit_price,
      stop_price: self.stop_price,
      trail_price: self.trail_price,
      trail_percent: self.trail_percent,
      extended_hours: self.extended_hours,
      client_order_id: self.client_order_id,
    }
  }
}


/// The body of a PATCH request to the /v2/orders/{order_id} endpoint.
///
/// Fields that are not set are left unchanged.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ReplaceReq {
  /// The new quantity.
  #[serde(rename = "qty", skip_serializing_if = "Option::is_none")]
  pub quantity: Option<Num>,
  /// How long the order will be valid.
  #[serde(rename = "time_in_force", skip_serializing_if = "Option::is_none")]
  pub time_in_force: Option<TimeInForce>,
  /// The new limit price.
  #[serde(rename = "limit_price", skip_serializing_if = "Option::is_none")]
  pub limit_price: Option<Num>,
  /// The new stop price.
  #[serde(rename = "stop_price", skip_serializing_if = "Option::is_none")]
  pub stop_price: Option<Num>,
  /// The new trail value of a trailing stop order.
  #[serde(rename = "trail", skip_serializing_if = "Option::is_none")]
  pub trail: Option<Num>,
  /// A new client specified ID for the order.
  #[serde(rename = "client_order_id", skip_serializing_if = "Option::is_none")]
  pub client_order_id: Option<String>,
}

impl ReplaceReq {
  /// Create a request replacing the order with the given ID.
  pub fn request(&self, order_id: impl Into<String>) -> Result<Request, Error> {
    Request::endpoint(&REPLACE)
      .param(ORDER_ID, order_id)
      .body_from(self)
  }
}


/// The query parameters of a GET request to the /v2/orders endpoint.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ListReq {
  /// The status of the orders to list. Alpaca defaults to open orders.
  #[serde(rename = "status", skip_serializing_if = "Option::is_none")]
  pub status: Option<Status>,
  /// Only list orders submitted after this time.
  #[serde(rename = "after", skip_serializing_if = "Option::is_none")]
  pub after: Option<DateTime<Utc>>,
  /// Only list orders submitted until this time.
  #[serde(rename = "until", skip_serializing_if = "Option::is_none")]
  pub until: Option<DateTime<Utc>>,
  /// The maximum number of orders to list.
  #[serde(rename = "limit", skip_serializing_if = "Option::is_none")]
  pub limit: Option<usize>,
  /// Whether to roll up multi-leg orders under the `legs` field of
  /// the primary order.
  #[serde(rename = "nested", default, skip_serializing_if = "is_false")]
  pub nested: bool,
  /// Only list orders for the given symbols.
  #[serde(rename = "symbols", skip_serializing_if = "Vec::is_empty")]
  pub symbols: Vec<String>,
  /// The chronological order of the result.
  #[serde(rename = "direction", skip_serializing_if = "Option::is_none")]
  pub direction: Option<Direction>,
}

impl ListReq {
  /// Create a request listing the orders matching the criteria.
  pub fn request(&self) -> Result<Request, Error> {
    Request::endpoint(&LIST).query_from(self)
  }
}


/// Create a request retrieving the order with the given ID.
pub fn get(order_id: impl Into<String>) -> Request {
  Request::endpoint(&GET).param(ORDER_ID, order_id)
}


/// Create a request canceling the order with the given ID.
pub fn cancel(order_id: impl Into<String>) -> Request {
  Request::endpoint(&CANCEL).param(ORDER_ID, order_id)
}


/// Create a request canceling all open orders.
#[inline]
pub fn cancel_all() -> Request {
  Request::endpoint(&CANCEL_ALL)
}

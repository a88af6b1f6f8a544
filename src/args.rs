// Copyright (C) 2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::str::FromStr;
use std::time::Duration;

use apca_cli::api::v2::account;
use apca_cli::api::v2::assets;
use apca_cli::api::v2::orders;
use apca_cli::api::v2::positions;
use apca_cli::data::v1beta3::crypto;
use apca_cli::Error;
use apca_cli::Host;
use apca_cli::Method;
use apca_cli::Request;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::TimeZone as _;
use chrono::Utc;

use clap::ArgAction;
use clap::Args as Arguments;
use clap::Parser;
use clap::Subcommand;

use num_decimal::Num;

use serde_json::Map;
use serde_json::Value;


/// A command line client for the Alpaca trading and market data APIs.
///
/// Credentials are read from the ALPACA_API_KEY and ALPACA_API_SECRET
/// environment variables (or a .env file). Requests go to the paper
/// trading API unless ALPACA_BASE_URL, --base-url, or --live say
/// otherwise.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
  /// Trade against the live API, using real funds.
  #[arg(long, global = true, conflicts_with = "base_url")]
  pub live: bool,
  /// The base URL of the trading API, overriding ALPACA_BASE_URL.
  #[arg(long, global = true, value_name = "URL")]
  pub base_url: Option<String>,
  /// The time to wait for the request to complete, in seconds.
  #[arg(long, global = true, value_name = "SECS", default_value = "15", value_parser = parse_timeout)]
  pub timeout: Duration,
  /// Increase verbosity (can be supplied multiple times).
  #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
  pub verbosity: u8,
  #[command(subcommand)]
  pub command: Command,
}


#[derive(Debug, Subcommand)]
pub enum Command {
  /// Retrieve the account information.
  Account,
  /// Retrieve the history of the account's equity and profit/loss.
  PortfolioHistory(PortfolioHistory),
  /// Submit, list, and manage orders.
  #[command(subcommand)]
  Order(Order),
  /// List and close open positions.
  #[command(subcommand)]
  Position(Position),
  /// List and inspect assets.
  #[command(subcommand)]
  Asset(Asset),
  /// Retrieve crypto currency market data.
  #[command(subcommand)]
  Crypto(Crypto),
  /// Issue a request against an arbitrary endpoint.
  Call(Call),
}

impl Command {
  /// Create the request representing the command.
  pub fn request(self) -> Result<Request, Error> {
    match self {
      Self::Account => Ok(account::get()),
      Self::PortfolioHistory(history) => history.request(),
      Self::Order(order) => order.request(),
      Self::Position(position) => position.request(),
      Self::Asset(asset) => asset.request(),
      Self::Crypto(crypto) => crypto.request(),
      Self::Call(call) => call.request(),
    }
  }
}


#[derive(Debug, Arguments)]
pub struct PortfolioHistory {
  /// The duration of the data (e.g., 1D, 1W, 1M, 1A).
  #[arg(long)]
  period: Option<String>,
  /// The resolution of the data (e.g., 1Min, 15Min, 1H, 1D).
  #[arg(long)]
  timeframe: Option<String>,
  /// The date the data is returned up to (YYYY-MM-DD).
  #[arg(long, value_parser = parse_date)]
  date_end: Option<NaiveDate>,
  /// Include extended hours in the result.
  #[arg(long)]
  extended_hours: bool,
}

impl PortfolioHistory {
  fn request(self) -> Result<Request, Error> {
    let request = account::PortfolioHistoryReq {
      period: self.period,
      timeframe: self.timeframe,
      date_end: self.date_end,
      extended_hours: self.extended_hours.then_some(true),
    };
    request.request()
  }
}


#[derive(Debug, Subcommand)]
pub enum Order {
  /// List orders.
  List(OrderList),
  /// Submit an order.
  Submit(OrderSubmit),
  /// Retrieve an order.
  Get {
    /// The ID of the order.
    order_id: String,
  },
  /// Replace an open order.
  Replace(OrderReplace),
  /// Cancel an open order.
  Cancel {
    /// The ID of the order.
    order_id: String,
  },
  /// Cancel all open orders.
  CancelAll,
}

impl Order {
  fn request(self) -> Result<Request, Error> {
    match self {
      Self::List(list) => list.request(),
      Self::Submit(submit) => submit.request(),
      Self::Get { order_id } => Ok(orders::get(order_id)),
      Self::Replace(replace) => replace.request(),
      Self::Cancel { order_id } => Ok(orders::cancel(order_id)),
      Self::CancelAll => Ok(orders::cancel_all()),
    }
  }
}


#[derive(Debug, Arguments)]
pub struct OrderList {
  /// The status of the orders to list (open, closed, all).
  #[arg(long, value_parser = parse_variant::<orders::Status>)]
  status: Option<orders::Status>,
  /// Only list orders submitted after this time (RFC 3339 or
  /// YYYY-MM-DD).
  #[arg(long, value_parser = parse_time)]
  after: Option<DateTime<Utc>>,
  /// Only list orders submitted until this time (RFC 3339 or
  /// YYYY-MM-DD).
  #[arg(long, value_parser = parse_time)]
  until: Option<DateTime<Utc>>,
  /// The maximum number of orders to list.
  #[arg(long)]
  limit: Option<usize>,
  /// Roll up multi-leg orders under their primary order.
  #[arg(long)]
  nested: bool,
  /// Only list orders for these (comma separated) symbols.
  #[arg(long, value_delimiter = ',')]
  symbols: Vec<String>,
  /// The chronological order of the result (asc, desc).
  #[arg(long, value_parser = parse_variant::<orders::Direction>)]
  direction: Option<orders::Direction>,
}

impl OrderList {
  fn request(self) -> Result<Request, Error> {
    let request = orders::ListReq {
      status: self.status,
      after: self.after,
      until: self.until,
      limit: self.limit,
      nested: self.nested,
      symbols: self.symbols,
      direction: self.direction,
    };
    request.request()
  }
}


#[derive(Debug, Arguments)]
pub struct OrderSubmit {
  /// The order as JSON object, sent as is.
  #[arg(long, value_name = "JSON", value_parser = parse_object, conflicts_with_all = [
    "symbol", "qty", "notional", "side", "type_", "time_in_force", "limit_price",
    "stop_price", "trail_price", "trail_percent", "extended_hours", "client_order_id",
  ])]
  data: Option<Map<String, Value>>,
  /// The symbol of the asset to trade.
  #[arg(long, required_unless_present = "data")]
  symbol: Option<String>,
  /// The quantity to trade.
  #[arg(long, value_parser = parse_num, conflicts_with = "notional",
        required_unless_present_any = ["notional", "data"])]
  qty: Option<Num>,
  /// The dollar amount to trade.
  #[arg(long, value_parser = parse_num)]
  notional: Option<Num>,
  /// The side of the order (buy, sell).
  #[arg(long, value_parser = parse_variant::<orders::Side>, required_unless_present = "data")]
  side: Option<orders::Side>,
  /// The type of the order (market, limit, stop, stop_limit,
  /// trailing_stop).
  #[arg(long = "type", value_parser = parse_variant::<orders::Type>, default_value = "market")]
  type_: orders::Type,
  /// How long the order is valid (day, gtc, opg, cls, ioc, fok).
  #[arg(long, value_parser = parse_variant::<orders::TimeInForce>, default_value = "day")]
  time_in_force: orders::TimeInForce,
  /// The limit price.
  #[arg(long, value_parser = parse_num)]
  limit_price: Option<Num>,
  /// The stop price.
  #[arg(long, value_parser = parse_num)]
  stop_price: Option<Num>,
  /// The trail of a trailing stop order, in dollars.
  #[arg(long, value_parser = parse_num, conflicts_with = "trail_percent")]
  trail_price: Option<Num>,
  /// The trail of a trailing stop order, in percent.
  #[arg(long, value_parser = parse_num)]
  trail_percent: Option<Num>,
  /// Allow the order to execute during pre-market and after hours.
  #[arg(long)]
  extended_hours: bool,
  /// A client specified ID for the order.
  #[arg(long)]
  client_order_id: Option<String>,
}

impl OrderSubmit {
  fn request(self) -> Result<Request, Error> {
    if let Some(data) = self.data {
      return Ok(Request::endpoint(&orders::SUBMIT).body(data))
    }

    let amount = match (self.qty, self.notional) {
      (Some(qty), None) => orders::Amount::quantity(qty),
      (None, Some(notional)) => orders::Amount::notional(notional),
      _ => {
        return Err(Error::RequestBuild(
          "exactly one of --qty and --notional is required".into(),
        ))
      },
    };
    let symbol = self
      .symbol
      .ok_or_else(|| Error::RequestBuild("--symbol is required".into()))?;
    let side = self
      .side
      .ok_or_else(|| Error::RequestBuild("--side is required".into()))?;

    let request = orders::OrderReqInit {
      type_: self.type_,
      time_in_force: self.time_in_force,
      limit_price: self.limit_price,
      stop_price: self.stop_price,
      trail_price: self.trail_price,
      trail_percent: self.trail_percent,
      extended_hours: self.extended_hours,
      client_order_id: self.client_order_id,
    }
    .init(symbol, side, amount);
    request.request()
  }
}


#[derive(Debug, Arguments)]
pub struct OrderReplace {
  /// The ID of the order.
  order_id: String,
  /// The changes as JSON object, sent as is.
  #[arg(long, value_name = "JSON", value_parser = parse_object, conflicts_with_all = [
    "qty", "time_in_force", "limit_price", "stop_price", "trail", "client_order_id",
  ])]
  data: Option<Map<String, Value>>,
  /// The new quantity.
  #[arg(long, value_parser = parse_num)]
  qty: Option<Num>,
  /// How long the order is valid (day, gtc, opg, cls, ioc, fok).
  #[arg(long, value_parser = parse_variant::<orders::TimeInForce>)]
  time_in_force: Option<orders::TimeInForce>,
  /// The new limit price.
  #[arg(long, value_parser = parse_num)]
  limit_price: Option<Num>,
  /// The new stop price.
  #[arg(long, value_parser = parse_num)]
  stop_price: Option<Num>,
  /// The new trail of a trailing stop order.
  #[arg(long, value_parser = parse_num)]
  trail: Option<Num>,
  /// A new client specified ID for the order.
  #[arg(long)]
  client_order_id: Option<String>,
}

impl OrderReplace {
  fn request(self) -> Result<Request, Error> {
    if let Some(data) = self.data {
      return Ok(
        Request::endpoint(&orders::REPLACE)
          .param("order_id", self.order_id)
          .body(data),
      )
    }

    let request = orders::ReplaceReq {
      quantity: self.qty,
      time_in_force: self.time_in_force,
      limit_price: self.limit_price,
      stop_price: self.stop_price,
      trail: self.trail,
      client_order_id: self.client_order_id,
    };
    request.request(self.order_id)
  }
}


#[derive(Debug, Subcommand)]
pub enum Position {
  /// List all open positions.
  List,
  /// Retrieve the open position in an asset.
  Get {
    /// The symbol or asset ID.
    symbol: String,
  },
  /// Close (parts of) an open position.
  Close {
    /// The symbol or asset ID.
    symbol: String,
    /// The number of shares to liquidate.
    #[arg(long, value_parser = parse_num, conflicts_with = "percentage")]
    qty: Option<Num>,
    /// The percentage of the position to liquidate.
    #[arg(long, value_parser = parse_num)]
    percentage: Option<Num>,
  },
  /// Close all open positions.
  CloseAll {
    /// Cancel all open orders first.
    #[arg(long)]
    cancel_orders: bool,
  },
}

impl Position {
  fn request(self) -> Result<Request, Error> {
    match self {
      Self::List => Ok(positions::list()),
      Self::Get { symbol } => Ok(positions::get(symbol)),
      Self::Close {
        symbol,
        qty,
        percentage,
      } => {
        let request = positions::CloseReq {
          quantity: qty,
          percentage,
        };
        request.request(symbol)
      },
      Self::CloseAll { cancel_orders } => positions::CloseAllReq { cancel_orders }.request(),
    }
  }
}


#[derive(Debug, Subcommand)]
pub enum Asset {
  /// List assets.
  List {
    /// The status of the assets to list (active, inactive).
    #[arg(long, value_parser = parse_variant::<assets::Status>)]
    status: Option<assets::Status>,
    /// The class of the assets to list (us_equity, us_option, crypto).
    #[arg(long, value_parser = parse_variant::<assets::Class>)]
    asset_class: Option<assets::Class>,
    /// The exchange the assets are traded on.
    #[arg(long)]
    exchange: Option<String>,
  },
  /// Retrieve an asset.
  Get {
    /// The symbol or asset ID.
    symbol: String,
  },
}

impl Asset {
  fn request(self) -> Result<Request, Error> {
    match self {
      Self::List {
        status,
        asset_class,
        exchange,
      } => {
        let request = assets::ListReq {
          status,
          class: asset_class,
          exchange,
        };
        request.request()
      },
      Self::Get { symbol } => Ok(assets::get(symbol)),
    }
  }
}


#[derive(Debug, Subcommand)]
pub enum Crypto {
  /// Retrieve the latest quotes for currency pairs.
  Quotes {
    /// The currency pairs (e.g., BTC/USD).
    #[arg(required = true)]
    symbols: Vec<String>,
  },
  /// Retrieve historic bars for currency pairs.
  Bars {
    /// The currency pairs (e.g., BTC/USD).
    #[arg(required = true)]
    symbols: Vec<String>,
    /// The time frame of a bar (e.g., 1Min, 1Hour, 1Day).
    #[arg(long)]
    timeframe: String,
    /// Only retrieve bars from this time on (RFC 3339 or YYYY-MM-DD).
    #[arg(long, value_parser = parse_time)]
    start: Option<DateTime<Utc>>,
    /// Only retrieve bars up to this time (RFC 3339 or YYYY-MM-DD).
    #[arg(long, value_parser = parse_time)]
    end: Option<DateTime<Utc>>,
    /// The maximum number of bars to retrieve.
    #[arg(long)]
    limit: Option<usize>,
    /// The order of the result (asc, desc).
    #[arg(long, value_parser = parse_variant::<crypto::Sort>)]
    sort: Option<crypto::Sort>,
    /// The page token of a previous response.
    #[arg(long)]
    page_token: Option<String>,
  },
}

impl Crypto {
  fn request(self) -> Result<Request, Error> {
    match self {
      Self::Quotes { symbols } => crypto::QuotesReq::new(symbols).request(),
      Self::Bars {
        symbols,
        timeframe,
        start,
        end,
        limit,
        sort,
        page_token,
      } => {
        let request = crypto::BarsReq {
          start,
          end,
          limit,
          sort,
          page_token,
          ..crypto::BarsReq::new(symbols, timeframe)
        };
        request.request()
      },
    }
  }
}


#[derive(Debug, Arguments)]
pub struct Call {
  /// The HTTP method (GET, POST, PATCH, DELETE).
  #[arg(value_parser = parse_variant::<Method>)]
  method: Method,
  /// The path of the endpoint, e.g., /v2/account or
  /// /v2/orders/{order_id}.
  path: String,
  /// A value for a path placeholder.
  #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_key_value)]
  params: Vec<(String, String)>,
  /// The query parameters as JSON object.
  #[arg(long = "params", value_name = "JSON", value_parser = parse_object)]
  query: Option<Map<String, Value>>,
  /// The request body as JSON object.
  #[arg(long, value_name = "JSON", value_parser = parse_object)]
  data: Option<Map<String, Value>>,
  /// Direct the request at the market data API.
  #[arg(long)]
  data_api: bool,
}

impl Call {
  fn request(self) -> Result<Request, Error> {
    let host = if self.data_api {
      Host::Data
    } else {
      Host::Trading
    };

    let request = Request::new(self.method, self.path).host(host);
    let request = self
      .params
      .into_iter()
      .fold(request, |request, (name, value)| request.param(name, value));
    let request = self
      .query
      .into_iter()
      .flatten()
      .fold(request, |request, (name, value)| request.query(name, value));
    let request = match self.data {
      Some(data) => request.body(data),
      None => request,
    };
    Ok(request)
  }
}


fn parse_timeout(s: &str) -> Result<Duration, String> {
  let secs = f64::from_str(s).map_err(|err| format!("invalid number of seconds: {err}"))?;
  Duration::try_from_secs_f64(secs).map_err(|err| format!("invalid timeout: {err}"))
}


fn parse_num(s: &str) -> Result<Num, String> {
  Num::from_str(s).map_err(|err| format!("`{s}` is not a decimal number: {err}"))
}


fn parse_date(s: &str) -> Result<NaiveDate, String> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|err| format!("`{s}` is not a date: {err}"))
}


/// Parse a time stamp in RFC 3339 format or a date, which is
/// interpreted as midnight UTC.
fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
  if let Ok(time) = DateTime::parse_from_rfc3339(s) {
    return Ok(time.with_timezone(&Utc))
  }

  let date = parse_date(s)
    .map_err(|_| format!("`{s}` is neither an RFC 3339 time stamp nor a YYYY-MM-DD date"))?;
  let time = date.and_hms_opt(0, 0, 0).ok_or_else(|| format!("`{s}` is out of range"))?;
  Ok(Utc.from_utc_datetime(&time))
}


fn parse_object(s: &str) -> Result<Map<String, Value>, String> {
  match serde_json::from_str::<Value>(s) {
    Ok(Value::Object(object)) => Ok(object),
    Ok(..) => Err("value must be a JSON object".to_string()),
    Err(err) => Err(format!("invalid JSON: {err}")),
  }
}


/// Parse a value using its `FromStr` implementation, reporting errors
/// the way `clap` expects them.
fn parse_variant<T>(s: &str) -> Result<T, String>
where
  T: FromStr<Err = Error>,
{
  T::from_str(s).map_err(|err| err.to_string())
}


fn parse_key_value(s: &str) -> Result<(String, String), String> {
  s.split_once('=')
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .ok_or_else(|| format!("`{s}` is not of the form NAME=VALUE"))
}

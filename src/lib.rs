// Copyright (C) 2019-2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

#![allow(clippy::unreadable_literal)]
#![warn(
  bad_style,
  dead_code,
  future_incompatible,
  improper_ctypes,
  missing_copy_implementations,
  missing_debug_implementations,
  missing_docs,
  no_mangle_generic_items,
  non_shorthand_field_patterns,
  nonstandard_style,
  overflowing_literals,
  path_statements,
  patterns_in_fns_without_body,
  renamed_and_removed_lints,
  rust_2018_compatibility,
  rust_2018_idioms,
  stable_features,
  trivial_bounds,
  trivial_numeric_casts,
  type_alias_bounds,
  unconditional_recursion,
  unreachable_code,
  unreachable_patterns,
  unstable_features,
  unstable_name_collisions,
  unused,
  unused_comparisons,
  unused_import_braces,
  unused_lifetimes,
  unused_qualifications,
  unused_results,
  while_true,
)]

//! A crate for issuing requests against the Alpaca REST API.
//!
//! Requests are described by a [`Request`], usually created from one
//! of the static [`Endpoint`] descriptors found in the [`api`] and
//! [`data`] modules, and are issued by a [`Client`]. Every request
//! results in exactly one HTTP exchange whose outcome is either a
//! [`Response`] or an [`Error`] from a small, closed taxonomy.

#[macro_use]
mod util;

/// A module comprising the trading API operations.
pub mod api;

/// A module comprising the market data operations.
pub mod data;

mod api_info;
mod client;
mod endpoint;
mod error;
mod request;
mod response;

use std::borrow::Cow;

pub use crate::api_info::ApiInfo;
pub use crate::api_info::ENV_BASE_URL;
pub use crate::api_info::ENV_KEY_ID;
pub use crate::api_info::ENV_SECRET;
pub use crate::client::Builder;
pub use crate::client::Client;
pub use crate::endpoint::Endpoint;
pub use crate::endpoint::Host;
pub use crate::endpoint::Method;
pub use crate::error::ApiError;
pub use crate::error::Error;
pub use crate::error::ErrorKind;
pub use crate::error::HttpBody;
pub use crate::error::HttpFailure;
pub use crate::error::TransportError;
pub use crate::request::Request;
pub use crate::response::Body;
pub use crate::response::RateLimit;
pub use crate::response::Response;

type Str = Cow<'static, str>;

// Copyright (C) 2019-2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::env::var_os;
use std::ffi::OsString;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use url::Url;

use crate::api::PAPER_BASE_URL;
use crate::data::DATA_BASE_URL;
use crate::Error;

/// The environment variable overriding the trading API base URL.
pub const ENV_BASE_URL: &str = "ALPACA_BASE_URL";
/// The environment variable representing the key ID.
pub const ENV_KEY_ID: &str = "ALPACA_API_KEY";
/// The environment variable representing the secret key.
pub const ENV_SECRET: &str = "ALPACA_API_SECRET";


/// An object encapsulating the information used for working with the
/// Alpaca API.
///
/// An `ApiInfo` can only be created with a non-empty key ID and secret
/// as well as a valid base URL, so that any request issued using it is
/// guaranteed to carry authentication information.
#[derive(Clone, PartialEq)]
pub struct ApiInfo {
  /// The base URL for the trading API.
  pub(crate) base_url: Url,
  /// The base URL for the market data API.
  pub(crate) data_base_url: Url,
  /// The key ID to use for authentication.
  pub(crate) key_id: String,
  /// The secret to use for authentication.
  pub(crate) secret: String,
}

impl ApiInfo {
  /// Create an `ApiInfo` from the required data.
  ///
  /// # Errors
  /// - [`Error::Config`] if `base_url` is not an absolute HTTP(S) URL
  /// - [`Error::Credential`] if `key_id` or `secret` is empty
  pub fn from_parts(
    base_url: impl AsRef<str>,
    key_id: impl ToString,
    secret: impl ToString,
  ) -> Result<Self, Error> {
    let base_url = parse_base_url(base_url.as_ref(), "base URL")?;
    Self::with_base_url(base_url, key_id.to_string(), secret.to_string())
  }

  /// Create an `ApiInfo`, resolving the base URL from the provided one,
  /// the `ALPACA_BASE_URL` environment variable, and the paper trading
  /// endpoint, in that order of precedence.
  ///
  /// No network access is performed.
  pub fn configure(
    base_url: Option<&str>,
    key_id: impl ToString,
    secret: impl ToString,
  ) -> Result<Self, Error> {
    let key_id = key_id.to_string();
    let secret = secret.to_string();
    // Credentials are checked first, so that missing ones are reported
    // irrespective of the URL configuration.
    let () = check_credentials(&key_id, &secret)?;
    let base_url = resolve_base_url(base_url, var_os(ENV_BASE_URL))?;
    Self::with_base_url(base_url, key_id, secret)
  }

  /// Create an `ApiInfo` object with information from the environment.
  ///
  /// This constructor retrieves API related information from the
  /// environment and performs some preliminary validation on it. The
  /// following information is used:
  /// - the Alpaca account key ID is retrieved from the ALPACA_API_KEY
  ///   variable
  /// - the Alpaca account secret is retrieved from the
  ///   ALPACA_API_SECRET variable
  /// - the trading API base URL is retrieved from the ALPACA_BASE_URL
  ///   variable, falling back to the paper trading endpoint
  pub fn from_env() -> Result<Self, Error> {
    Self::from_env_with(None)
  }

  /// Create an `ApiInfo` object with credentials from the environment
  /// and an optional explicit base URL taking precedence over the one
  /// from the environment.
  pub fn from_env_with(base_url: Option<&str>) -> Result<Self, Error> {
    let key_id = credential_from_env(ENV_KEY_ID)?;
    let secret = credential_from_env(ENV_SECRET)?;
    Self::configure(base_url, key_id, secret)
  }

  /// Replace the base URL used for market data requests.
  ///
  /// By default market data is always retrieved from
  /// `https://data.alpaca.markets`, irrespective of the trading base
  /// URL.
  pub fn with_data_base_url(mut self, data_base_url: impl AsRef<str>) -> Result<Self, Error> {
    self.data_base_url = parse_base_url(data_base_url.as_ref(), "market data base URL")?;
    Ok(self)
  }

  fn with_base_url(base_url: Url, key_id: String, secret: String) -> Result<Self, Error> {
    let () = check_credentials(&key_id, &secret)?;
    // SANITY: The URL is a compile time constant known to be valid.
    let data_base_url = Url::parse(DATA_BASE_URL).unwrap();

    Ok(Self {
      base_url,
      data_base_url,
      key_id,
      secret,
    })
  }

  /// Retrieve the base URL of the trading API.
  #[inline]
  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// Retrieve the base URL of the market data API.
  #[inline]
  pub fn data_base_url(&self) -> &Url {
    &self.data_base_url
  }

  /// Retrieve the key ID.
  #[inline]
  pub fn key_id(&self) -> &str {
    &self.key_id
  }
}

impl Debug for ApiInfo {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("ApiInfo")
      .field("base_url", &self.base_url.as_str())
      .field("data_base_url", &self.data_base_url.as_str())
      .field("key_id", &"<masked>")
      .field("secret", &"<masked>")
      .finish()
  }
}


fn check_credentials(key_id: &str, secret: &str) -> Result<(), Error> {
  if key_id.trim().is_empty() {
    return Err(Error::Credential(
      format!("the API key ID is empty; set {ENV_KEY_ID}").into(),
    ))
  }
  if secret.trim().is_empty() {
    return Err(Error::Credential(
      format!("the API secret is empty; set {ENV_SECRET}").into(),
    ))
  }
  Ok(())
}


fn credential_from_env(name: &str) -> Result<String, Error> {
  var_os(name)
    .ok_or_else(|| Error::Credential(format!("{name} environment variable not found").into()))?
    .into_string()
    .map_err(|_| Error::Credential(format!("{name} environment variable is not a valid string").into()))
}


/// Determine the trading API base URL from an explicitly provided
/// value and the value of the override variable.
fn resolve_base_url(explicit: Option<&str>, env: Option<OsString>) -> Result<Url, Error> {
  if let Some(base_url) = explicit {
    return parse_base_url(base_url, "base URL")
  }

  match env {
    Some(base_url) if !base_url.is_empty() => {
      let base_url = base_url.into_string().map_err(|_| {
        Error::Config(format!("{ENV_BASE_URL} environment variable is not a valid string").into())
      })?;
      parse_base_url(&base_url, ENV_BASE_URL)
    },
    _ => parse_base_url(PAPER_BASE_URL, "base URL"),
  }
}


fn parse_base_url(base_url: &str, what: &str) -> Result<Url, Error> {
  let url = Url::parse(base_url)
    .map_err(|err| Error::Config(format!("{what} `{base_url}` is invalid: {err}").into()))?;

  if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() || !url.has_host() {
    return Err(Error::Config(
      format!("{what} `{base_url}` is not an absolute HTTP(S) URL").into(),
    ))
  }
  Ok(url)
}

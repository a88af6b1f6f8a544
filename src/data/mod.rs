// Copyright (C) 2020-2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

/// Definitions for the v1beta3 version of the Alpaca Data API.
pub mod v1beta3;

/// The API base URL used for retrieving market data.
pub const DATA_BASE_URL: &str = "https://data.alpaca.markets";

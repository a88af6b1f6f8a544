// Copyright (C) 2019-2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

/// Definitions pertaining the user's account and its portfolio.
pub mod account;
/// Functionality for listing and inspecting assets.
pub mod assets;
/// Functionality for submitting, listing, and managing orders.
pub mod orders;
/// Functionality for listing and closing open positions.
pub mod positions;

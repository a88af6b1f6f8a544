// Copyright (C) 2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

/// Definitions for retrieval of crypto currency market data.
pub mod crypto;

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod catalog;
pub mod leaderboard;
pub mod mint;
pub mod pipeline;
pub mod recharge;

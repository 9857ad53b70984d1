// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod chain;
pub mod explorer;
pub mod factory_api;
pub mod gas;
pub mod pricing;
pub use pricing::price_feed;

pub mod provider;

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, address};

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

pub const CHAIN_BSC: u64 = 56;
pub const DEFAULT_RPC_URL: &str = "https://bsc-dataseed.binance.org/";

// =============================================================================
// CONTRACTS (BSC mainnet)
// =============================================================================

/// `batchRecycle(uint256[][],uint256[])`
pub const RECYCLE_CONTRACT: Address = address!("b0952610D1a7A46793f1595a04A4BF077962DD80");
/// `batchCreationBySingleGene(uint256[][],uint256)`
pub const MINT_CONTRACT: Address = address!("E62871d9AEa78A2BeD31d985135aC454037b8B2c");
/// `getLifePrice(uint256[])`
pub const PRICE_ORACLE_CONTRACT: Address = address!("a258107Cb9dCD325a37c7d65A7f4850bb9986BC6");
/// Canonical Multicall3 deployment (same address on every EVM chain).
pub const MULTICALL3: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");
/// Token whose holders make up the energy leaderboard.
pub const ENERGY_TOKEN_CONTRACT: Address = address!("abd1780208a62b9cbf9d3b7a1617918d42493933");

// =============================================================================
// EXTERNAL APIS
// =============================================================================

pub const DEFAULT_FACTORY_API_URL: &str = "https://factoryapi.cellula.life";
pub const DEFAULT_EXPLORER_API_URL: &str =
    "https://www.oklink.com/api/v5/explorer/token/position-list";
pub const EXPLORER_CHAIN_SHORT_NAME: &str = "BSC";
pub const INVENTORY_PAGE_SIZE: u64 = 100_000;
pub const CATALOG_PAGE_SIZE: u64 = 10_000;

// =============================================================================
// RECHARGE PLANNING
// =============================================================================

pub const DEFAULT_DESTROY_CEILING: f64 = 100.0;
pub const DEFAULT_CHARGE_FLOOR: f64 = 1_000.0;
pub const MIN_CHARGE_RATIO: u8 = 1;
pub const MAX_CHARGE_RATIO: u8 = 7;
pub const DEFAULT_CHARGE_RATIO: u8 = 7;
/// Charge targets per `batchRecycle` call. Larger payloads get stuck in the mempool.
pub const DEFAULT_MAX_BATCH: usize = 100;

// =============================================================================
// GAS & VALUE POLICY
// =============================================================================

pub const BPS_DENOMINATOR: u64 = 10_000;
/// Wallets tend to default to 3 gwei on BSC; 1 gwei is enough.
pub const DEFAULT_GAS_PRICE_GWEI: u64 = 1;
/// +10% on top of `eth_estimateGas`.
pub const DEFAULT_GAS_LIMIT_MULTIPLIER_BPS: u64 = 11_000;
/// Mint value is `price * quantity * 1.42`; the contract refunds the excess.
pub const DEFAULT_MINT_VALUE_MULTIPLIER_BPS: u64 = 14_200;
pub const DEFAULT_MINT_QUANTITY: u64 = 100;

// =============================================================================
// CATALOG & LEADERBOARD
// =============================================================================

pub const DEFAULT_CATALOG_PREVIEW: usize = 10;
/// Sub-calls per `aggregate3`; public BSC nodes cap `eth_call` gas and size.
pub const MULTICALL_CHUNK_SIZE: usize = 500;
pub const LEADERBOARD_MAX_HOLDERS: usize = 400;
pub const LEADERBOARD_PAGE_SIZE: usize = 100;
pub const LEADERBOARD_TOP: usize = 50;

// =============================================================================
// RECEIPTS
// =============================================================================

pub const DEFAULT_RECEIPT_POLL_MS: u64 = 1_000;
pub const DEFAULT_RECEIPT_TIMEOUT_MS: u64 = 120_000;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

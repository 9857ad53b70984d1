// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants;
use crate::domain::error::AppError;
use crate::domain::types::{ChargeRatio, Thresholds};
use crate::network::gas::GasPolicy;
use crate::network::price_feed::PriceStrategyKind;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // Chain
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    // Identity. Only the write paths need a key.
    pub wallet_key: Option<String>,
    pub wallet_address: Option<Address>,

    // Contracts
    #[serde(default = "default_recycle_contract")]
    pub recycle_contract: Address,
    #[serde(default = "default_mint_contract")]
    pub mint_contract: Address,
    #[serde(default = "default_price_oracle")]
    pub price_oracle: Address,
    #[serde(default = "default_multicall")]
    pub multicall_address: Address,
    #[serde(default = "default_energy_token")]
    pub energy_token: Address,

    // External APIs
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    pub quote_url: Option<String>,
    #[serde(default = "default_explorer_api_url")]
    pub explorer_api_url: String,
    pub explorer_api_key: Option<String>,
    /// Defaults to `api_base_url`.
    pub energy_api_url: Option<String>,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    // Recharge planning
    #[serde(default = "default_destroy_ceiling")]
    pub destroy_ceiling: f64,
    #[serde(default = "default_charge_floor")]
    pub charge_floor: f64,
    #[serde(default = "default_charge_ratio")]
    pub charge_ratio: u64,
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,

    // Transaction policy
    #[serde(default = "default_gas_price_gwei")]
    pub gas_price_gwei: u64,
    #[serde(default = "default_gas_limit_multiplier_bps")]
    pub gas_limit_multiplier_bps: u64,
    #[serde(default = "default_mint_value_multiplier_bps")]
    pub mint_value_multiplier_bps: u64,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,

    // Pricing
    #[serde(default = "default_price_strategy")]
    pub price_strategy: String,
    #[serde(default = "default_catalog_preview")]
    pub catalog_preview: usize,
}

fn default_rpc_url() -> String {
    constants::DEFAULT_RPC_URL.to_string()
}
fn default_chain_id() -> u64 {
    constants::CHAIN_BSC
}
fn default_recycle_contract() -> Address {
    constants::RECYCLE_CONTRACT
}
fn default_mint_contract() -> Address {
    constants::MINT_CONTRACT
}
fn default_price_oracle() -> Address {
    constants::PRICE_ORACLE_CONTRACT
}
fn default_multicall() -> Address {
    constants::MULTICALL3
}
fn default_energy_token() -> Address {
    constants::ENERGY_TOKEN_CONTRACT
}
fn default_api_base_url() -> String {
    constants::DEFAULT_FACTORY_API_URL.to_string()
}
fn default_explorer_api_url() -> String {
    constants::DEFAULT_EXPLORER_API_URL.to_string()
}
fn default_http_timeout_secs() -> u64 {
    constants::DEFAULT_HTTP_TIMEOUT_SECS
}
fn default_destroy_ceiling() -> f64 {
    constants::DEFAULT_DESTROY_CEILING
}
fn default_charge_floor() -> f64 {
    constants::DEFAULT_CHARGE_FLOOR
}
fn default_charge_ratio() -> u64 {
    constants::DEFAULT_CHARGE_RATIO as u64
}
fn default_max_batch() -> usize {
    constants::DEFAULT_MAX_BATCH
}
fn default_gas_price_gwei() -> u64 {
    constants::DEFAULT_GAS_PRICE_GWEI
}
fn default_gas_limit_multiplier_bps() -> u64 {
    constants::DEFAULT_GAS_LIMIT_MULTIPLIER_BPS
}
fn default_mint_value_multiplier_bps() -> u64 {
    constants::DEFAULT_MINT_VALUE_MULTIPLIER_BPS
}
fn default_receipt_poll_ms() -> u64 {
    constants::DEFAULT_RECEIPT_POLL_MS
}
fn default_receipt_timeout_ms() -> u64 {
    constants::DEFAULT_RECEIPT_TIMEOUT_MS
}
fn default_price_strategy() -> String {
    PriceStrategyKind::default().to_string()
}
fn default_catalog_preview() -> usize {
    constants::DEFAULT_CATALOG_PREVIEW
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected_path) = resolve_config_path(path) {
            builder = builder.add_source(File::from(Path::new(&selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // CLI (in main) > env/.env > file.
        builder = builder.add_source(Environment::default());

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        tracing::debug!(
            target: "config",
            rpc = %settings.rpc_url,
            chain_id = settings.chain_id,
            strategy = %settings.price_strategy,
            "Settings loaded"
        );
        Ok(settings)
    }

    /// Cheap checks that do not touch the network. Re-run after CLI overrides.
    pub fn validate(&self) -> Result<(), AppError> {
        for (field, raw) in [
            ("rpc_url", Some(self.rpc_url.as_str())),
            ("api_base_url", Some(self.api_base_url.as_str())),
            ("explorer_api_url", Some(self.explorer_api_url.as_str())),
            ("quote_url", self.quote_url.as_deref()),
            ("energy_api_url", self.energy_api_url.as_deref()),
        ] {
            if let Some(raw) = raw {
                Url::parse(raw).map_err(|e| AppError::Validation {
                    field: field.into(),
                    message: format!("{raw:?} is not a valid url: {e}"),
                })?;
            }
        }
        if self.max_batch == 0 {
            return Err(AppError::Validation {
                field: "max_batch".into(),
                message: "must be at least 1".into(),
            });
        }
        self.thresholds()?;
        self.charge_ratio()?;
        let strategy = self.price_strategy_kind()?;
        if strategy == PriceStrategyKind::Quote && self.quote_url.is_none() {
            return Err(AppError::Config(
                "price_strategy = quote requires QUOTE_URL".to_string(),
            ));
        }
        Ok(())
    }

    pub fn thresholds(&self) -> Result<Thresholds, AppError> {
        Thresholds::new(self.destroy_ceiling, self.charge_floor)
    }

    pub fn charge_ratio(&self) -> Result<ChargeRatio, AppError> {
        ChargeRatio::try_from(self.charge_ratio)
    }

    pub fn price_strategy_kind(&self) -> Result<PriceStrategyKind, AppError> {
        PriceStrategyKind::from_str(&self.price_strategy)
    }

    pub fn gas_policy(&self) -> GasPolicy {
        GasPolicy::new(self.gas_price_gwei, self.gas_limit_multiplier_bps)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    pub fn energy_api_url(&self) -> String {
        self.energy_api_url
            .clone()
            .unwrap_or_else(|| self.api_base_url.clone())
    }

    pub fn explorer_api_key(&self) -> Result<String, AppError> {
        self.explorer_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(ToString::to_string)
            .ok_or_else(|| AppError::Config("EXPLORER_API_KEY is missing".to_string()))
    }

    /// Signer for write paths. When `wallet_address` is also set it must match the key.
    pub fn wallet_signer(&self) -> Result<PrivateKeySigner, AppError> {
        let key = self
            .wallet_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::Config("WALLET_KEY is missing".to_string()))?;
        let signer = PrivateKeySigner::from_str(key)
            .map_err(|e| AppError::Config(format!("WALLET_KEY is not a valid key: {e}")))?;
        if let Some(expected) = self.wallet_address
            && expected != signer.address()
        {
            return Err(AppError::Validation {
                field: "wallet_address".into(),
                message: format!(
                    "{expected:#x} does not match the address of WALLET_KEY ({:#x})",
                    signer.address()
                ),
            });
        }
        Ok(signer)
    }

    /// Account to plan for: the configured address, else the key's address.
    pub fn account(&self) -> Result<Address, AppError> {
        if let Some(addr) = self.wallet_address {
            return Ok(addr);
        }
        if self.wallet_key.is_some() {
            return Ok(self.wallet_signer()?.address());
        }
        Err(AppError::Config(
            "WALLET_ADDRESS or WALLET_KEY is required".to_string(),
        ))
    }
}

fn resolve_config_path(path: Option<&str>) -> Option<String> {
    if let Some(path) = path {
        return Some(path.to_string());
    }
    std::env::var("CELLULA_CONFIG")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    // Well-known development key; never funded on mainnet.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn base_settings() -> GlobalSettings {
        GlobalSettings {
            rpc_url: default_rpc_url(),
            chain_id: default_chain_id(),
            wallet_key: None,
            wallet_address: None,
            recycle_contract: default_recycle_contract(),
            mint_contract: default_mint_contract(),
            price_oracle: default_price_oracle(),
            multicall_address: default_multicall(),
            energy_token: default_energy_token(),
            api_base_url: default_api_base_url(),
            quote_url: None,
            explorer_api_url: default_explorer_api_url(),
            explorer_api_key: None,
            energy_api_url: None,
            http_timeout_secs: default_http_timeout_secs(),
            destroy_ceiling: default_destroy_ceiling(),
            charge_floor: default_charge_floor(),
            charge_ratio: default_charge_ratio(),
            max_batch: default_max_batch(),
            gas_price_gwei: default_gas_price_gwei(),
            gas_limit_multiplier_bps: default_gas_limit_multiplier_bps(),
            mint_value_multiplier_bps: default_mint_value_multiplier_bps(),
            receipt_poll_ms: default_receipt_poll_ms(),
            receipt_timeout_ms: default_receipt_timeout_ms(),
            price_strategy: default_price_strategy(),
            catalog_preview: default_catalog_preview(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let settings = base_settings();
        settings.validate().unwrap();
        assert_eq!(settings.charge_ratio().unwrap().get(), 7);
        assert_eq!(settings.gas_policy().gas_limit(100_000), 110_000);
        assert_eq!(settings.price_strategy_kind().unwrap(), PriceStrategyKind::Multicall);
        assert_eq!(settings.energy_api_url(), constants::DEFAULT_FACTORY_API_URL);
    }

    #[test]
    fn out_of_range_ratio_is_rejected() {
        let mut settings = base_settings();
        settings.charge_ratio = 9;
        assert!(matches!(
            settings.validate(),
            Err(AppError::Validation { ref field, .. }) if field == "charge_ratio"
        ));
    }

    #[test]
    fn quote_strategy_needs_an_endpoint() {
        let mut settings = base_settings();
        settings.price_strategy = "quote".into();
        assert!(matches!(settings.validate(), Err(AppError::Config(_))));
        settings.quote_url = Some("https://quote.example/price".into());
        settings.validate().unwrap();
    }

    #[test]
    fn wallet_address_must_match_key() {
        let mut settings = base_settings();
        settings.wallet_key = Some(DEV_KEY.into());
        assert_eq!(
            settings.account().unwrap(),
            Address::from_str(DEV_ADDRESS).unwrap()
        );

        settings.wallet_address = Some(Address::repeat_byte(0x01));
        assert!(matches!(
            settings.wallet_signer(),
            Err(AppError::Validation { ref field, .. }) if field == "wallet_address"
        ));
    }

    #[test]
    fn read_only_account_needs_no_key() {
        let mut settings = base_settings();
        assert!(settings.account().is_err());
        settings.wallet_address = Some(Address::repeat_byte(0x02));
        assert_eq!(settings.account().unwrap(), Address::repeat_byte(0x02));
        assert!(settings.wallet_signer().is_err());
    }

    #[test]
    fn loads_from_explicit_toml_file() {
        let _env_lock = env_lock_guard();
        let path = std::env::temp_dir().join(format!("cellula-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "charge_ratio = 3\ndestroy_ceiling = 80.5\nprice_strategy = \"sequential\"\nmax_batch = 25\n",
        )
        .unwrap();

        let settings = GlobalSettings::load_with_path(path.to_str()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.charge_ratio, 3);
        assert_eq!(settings.destroy_ceiling, 80.5);
        assert_eq!(settings.max_batch, 25);
        assert_eq!(settings.price_strategy_kind().unwrap(), PriceStrategyKind::Sequential);
        assert_eq!(settings.recycle_contract, constants::RECYCLE_CONTRACT);
    }
}

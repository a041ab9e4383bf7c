// SPDX-License-Identifier: MIT

use crate::domain::error::AppError;
use crate::services::redeemer::engine::SharePolicy;
use alloy::primitives::{Address, U256};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Immutable process-wide configuration, loaded once at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_debug")]
    pub debug: bool,
    /// Emit JSON log lines instead of the compact console format.
    #[serde(default = "default_log_json")]
    pub log_json: bool,

    // Identity + contracts
    pub rpc_url: String,
    pub wallet_key: String,
    pub wallet_address: Address,
    pub vault_address: Address,
    pub share_token_address: Address,
    pub asset_token_address: Address,

    // Trigger policy
    /// Decimal threshold in settlement-asset units (scaled with the asset's
    /// on-chain precision at startup).
    #[serde(default = "default_threshold")]
    pub min_redeem_threshold: String,
    /// `ALL` or an integer amount of share base units.
    #[serde(default = "default_shares_to_redeem")]
    pub shares_to_redeem: String,
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,

    // Fee policy
    #[serde(default = "default_priority_gwei")]
    pub max_priority_fee_gwei: f64,
    #[serde(default = "default_fee_cap_gwei")]
    pub max_fee_gwei: f64,
    #[serde(default = "default_gas_limit_redeem")]
    pub gas_limit_redeem: u64,
    #[serde(default = "default_gas_limit_approve")]
    pub gas_limit_approve: u64,

    // Allowance policy: base-unit ceiling requested when raising an
    // allowance. Unset means the maximum representable value, matching the
    // one-approval-forever pattern; operators who dislike unlimited spend
    // approvals can bound it here.
    pub approval_ceiling: Option<String>,

    // Confirmation waits
    #[serde(default = "default_approve_confirm_secs")]
    pub approve_confirm_secs: u64,
    #[serde(default = "default_redeem_confirm_secs")]
    pub redeem_confirm_secs: u64,
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
}

fn default_debug() -> bool {
    false
}
fn default_log_json() -> bool {
    false
}
fn default_threshold() -> String {
    "10".to_string()
}
fn default_shares_to_redeem() -> String {
    "ALL".to_string()
}
fn default_poll_ms() -> u64 {
    200
}
fn default_priority_gwei() -> f64 {
    2.0
}
fn default_fee_cap_gwei() -> f64 {
    40.0
}
fn default_gas_limit_redeem() -> u64 {
    300_000
}
fn default_gas_limit_approve() -> u64 {
    70_000
}
fn default_approve_confirm_secs() -> u64 {
    120
}
fn default_redeem_confirm_secs() -> u64 {
    45
}
fn default_error_backoff_ms() -> u64 {
    500
}

const WEI_PER_GWEI: f64 = 1e9;

impl Settings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected) = path {
            builder = builder.add_source(File::from(Path::new(selected)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Precedence: env/.env > profile file.
        builder = builder.add_source(Environment::default());

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.wallet_key.trim().is_empty() {
            return Err(AppError::Config("WALLET_KEY is missing".to_string()));
        }
        if self.rpc_url.trim().is_empty() {
            return Err(AppError::Config("RPC_URL is missing".to_string()));
        }
        if self.poll_ms == 0 {
            return Err(AppError::Config("POLL_MS must be positive".to_string()));
        }
        // Fail fast on malformed policy values instead of mid-loop.
        self.share_policy()?;
        self.approval_ceiling_value()?;
        Ok(())
    }

    pub fn share_policy(&self) -> Result<SharePolicy, AppError> {
        let raw = self.shares_to_redeem.trim();
        if raw.eq_ignore_ascii_case("ALL") {
            return Ok(SharePolicy::All);
        }
        U256::from_str_radix(raw, 10)
            .map(SharePolicy::Fixed)
            .map_err(|_| {
                AppError::Config(format!(
                    "SHARES_TO_REDEEM must be ALL or an integer share amount, got '{raw}'"
                ))
            })
    }

    pub fn approval_ceiling_value(&self) -> Result<U256, AppError> {
        match self.approval_ceiling.as_deref().map(str::trim) {
            None | Some("") => Ok(U256::MAX),
            Some(raw) => U256::from_str_radix(raw, 10).map_err(|_| {
                AppError::Config(format!(
                    "APPROVAL_CEILING must be an integer base-unit amount, got '{raw}'"
                ))
            }),
        }
    }

    pub fn priority_fee_wei(&self) -> u128 {
        (self.max_priority_fee_gwei.max(0.0) * WEI_PER_GWEI).round() as u128
    }

    pub fn fee_cap_wei(&self) -> u128 {
        (self.max_fee_gwei.max(0.0) * WEI_PER_GWEI).round() as u128
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }

    pub fn approve_confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.approve_confirm_secs)
    }

    pub fn redeem_confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.redeem_confirm_secs)
    }
}

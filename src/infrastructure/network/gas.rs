// SPDX-License-Identifier: MIT

use crate::common::retry::retry_async;
use crate::domain::error::AppError;
use crate::network::provider::HttpProvider;
use alloy::providers::Provider;
use std::time::Duration;

/// EIP-1559 fee fields for one transaction. Computed fresh before every
/// submission; fee markets move between cycles, so quotes are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

#[derive(Clone)]
pub struct FeeEstimator {
    provider: HttpProvider,
    priority_fee: u128,
    fee_cap: u128,
}

impl FeeEstimator {
    pub fn new(provider: HttpProvider, priority_fee: u128, fee_cap: u128) -> Self {
        Self {
            provider,
            priority_fee,
            fee_cap,
        }
    }

    /// Quote fees from the current gas price (base-fee proxy) and the
    /// configured priority constant and ceiling.
    pub async fn quote(&self) -> Result<FeeQuote, AppError> {
        let provider = self.provider.clone();
        let base = retry_async(
            move || {
                let provider = provider.clone();
                async move { provider.get_gas_price().await }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("Gas price fetch failed: {}", e)))?;

        Ok(compose_fee(base, self.priority_fee, self.fee_cap))
    }
}

/// Bid one fee-market step above the observed base, floored at twice the
/// priority fee and capped at the configured ceiling.
pub fn compose_fee(base: u128, priority: u128, cap: u128) -> FeeQuote {
    let double_priority = priority.saturating_mul(2);
    let bid = base.saturating_add(double_priority).max(double_priority);
    FeeQuote {
        max_fee_per_gas: bid.min(cap),
        max_priority_fee_per_gas: priority,
    }
}

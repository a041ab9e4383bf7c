// SPDX-License-Identifier: MIT

use crate::common::units::format_units;
use crate::domain::error::AppError;
use crate::infrastructure::contracts::{BareVault, Erc20, Erc4626Vault};
use crate::network::gas::FeeEstimator;
use crate::network::nonce::NonceSource;
use crate::network::provider::HttpProvider;
use crate::network::submitter::Submission;
use crate::services::redeemer::allowance::AllowanceManager;
use crate::services::redeemer::capability::CapabilityMode;
use alloy::primitives::{Address, B256, U256};
use alloy_sol_types::SolCall;
use std::fmt;

/// How many shares a triggered cycle redeems: everything the operator holds,
/// or the held balance clamped to a fixed base-unit amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharePolicy {
    All,
    Fixed(U256),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    BelowThreshold,
    NoShares,
    PreviewTooSmall,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::BelowThreshold => write!(f, "vault balance below threshold"),
            SkipReason::NoShares => write!(f, "no shares held"),
            SkipReason::PreviewTooSmall => write!(f, "previewed output below threshold"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    Submitted(B256),
}

/// Clamp the observed share balance to the configured policy. The submitted
/// quantity never exceeds the balance.
pub fn redeem_quantity(balance: U256, policy: &SharePolicy) -> U256 {
    match policy {
        SharePolicy::All => balance,
        SharePolicy::Fixed(q) => balance.min(*q),
    }
}

/// Trigger evaluation for one poll cycle, separated from chain I/O: given
/// the observed vault and operator balances, returns the share quantity to
/// redeem or the reason the cycle submits nothing.
pub fn evaluate_cycle(
    vault_assets: U256,
    threshold_units: U256,
    operator_shares: U256,
    policy: &SharePolicy,
) -> Result<U256, SkipReason> {
    if vault_assets < threshold_units {
        return Err(SkipReason::BelowThreshold);
    }
    if operator_shares.is_zero() {
        return Err(SkipReason::NoShares);
    }
    Ok(redeem_quantity(operator_shares, policy))
}

/// Preview gate for the standard interface: redeeming a share amount whose
/// estimated output is below the threshold wastes gas even when the vault's
/// gross balance passed.
pub fn preview_meets_threshold(estimate: U256, threshold_units: U256) -> bool {
    estimate >= threshold_units
}

pub struct RedemptionEngine<S, N> {
    provider: HttpProvider,
    mode: CapabilityMode,
    vault: Address,
    share_token: Address,
    asset_token: Address,
    operator: Address,
    threshold_units: U256,
    asset_decimals: u8,
    share_decimals: u8,
    policy: SharePolicy,
    gas_limit: u64,
    fees: FeeEstimator,
    nonces: N,
    allowance: AllowanceManager<S, N>,
    submitter: S,
}

impl<S: Submission, N: NonceSource> RedemptionEngine<S, N> {
    pub fn new(
        provider: HttpProvider,
        mode: CapabilityMode,
        vault: Address,
        share_token: Address,
        asset_token: Address,
        operator: Address,
        threshold_units: U256,
        asset_decimals: u8,
        share_decimals: u8,
        policy: SharePolicy,
        gas_limit: u64,
        fees: FeeEstimator,
        nonces: N,
        allowance: AllowanceManager<S, N>,
        submitter: S,
    ) -> Self {
        Self {
            provider,
            mode,
            vault,
            share_token,
            asset_token,
            operator,
            threshold_units,
            asset_decimals,
            share_decimals,
            policy,
            gas_limit,
            fees,
            nonces,
            allowance,
            submitter,
        }
    }

    /// One redemption decision: gate on the vault's settlement-asset balance,
    /// clamp the share quantity, optionally preview the output, raise the
    /// allowance if short, then broadcast. Returns immediately after
    /// broadcast; receipt observation is the caller's concern.
    pub async fn attempt_redeem(&self) -> Result<Outcome, AppError> {
        let asset = Erc20::new(self.asset_token, self.provider.clone());
        let vault_assets = asset
            .balanceOf(self.vault)
            .call()
            .await
            .map_err(|e| AppError::Connection(format!("Vault balance read failed: {}", e)))?;
        // Cheap gross check first; skip all further reads while idle.
        if vault_assets < self.threshold_units {
            return Ok(Outcome::Skipped(SkipReason::BelowThreshold));
        }

        let shares = Erc20::new(self.share_token, self.provider.clone());
        let operator_shares = shares
            .balanceOf(self.operator)
            .call()
            .await
            .map_err(|e| AppError::Connection(format!("Share balance read failed: {}", e)))?;

        let quantity = match evaluate_cycle(
            vault_assets,
            self.threshold_units,
            operator_shares,
            &self.policy,
        ) {
            Ok(q) => q,
            Err(reason) => return Ok(Outcome::Skipped(reason)),
        };

        if self.mode == CapabilityMode::Erc4626 {
            let vault = Erc4626Vault::new(self.vault, self.provider.clone());
            let estimate = vault
                .previewRedeem(quantity)
                .call()
                .await
                .map_err(|e| AppError::Connection(format!("previewRedeem failed: {}", e)))?;
            if !preview_meets_threshold(estimate, self.threshold_units) {
                tracing::debug!(
                    target: "engine",
                    estimate = %format_units(estimate, self.asset_decimals),
                    shares = %format_units(quantity, self.share_decimals),
                    "Previewed output below threshold"
                );
                return Ok(Outcome::Skipped(SkipReason::PreviewTooSmall));
            }
        }

        self.allowance.ensure_allowance(quantity).await?;

        let quote = self.fees.quote().await?;
        let nonce = self.nonces.next_nonce().await?;
        let calldata = match self.mode {
            CapabilityMode::Erc4626 => Erc4626Vault::redeemCall {
                shares: quantity,
                receiver: self.operator,
                owner: self.operator,
            }
            .abi_encode(),
            CapabilityMode::Bare => BareVault::redeemCall { shares: quantity }.abi_encode(),
        };

        let hash = self
            .submitter
            .submit_call(self.vault, calldata, self.gas_limit, quote, nonce)
            .await?;
        tracing::info!(
            target: "engine",
            tx = %format!("{hash:#x}"),
            shares = %format_units(quantity, self.share_decimals),
            vault_assets = %format_units(vault_assets, self.asset_decimals),
            "Redeem submitted"
        );

        Ok(Outcome::Submitted(hash))
    }
}

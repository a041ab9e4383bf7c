// SPDX-License-Identifier: MIT

use crate::domain::error::AppError;
use crate::infrastructure::contracts::Erc20;
use crate::network::gas::FeeEstimator;
use crate::network::nonce::NonceSource;
use crate::network::provider::HttpProvider;
use crate::network::submitter::{ReceiptStatus, Submission};
use alloy::primitives::{Address, U256};
use alloy_sol_types::SolCall;
use std::time::Duration;

/// Keeps the vault's spending allowance over the operator's share tokens
/// ahead of redemption needs. The common case after the first approval is a
/// single read and no transaction.
#[derive(Clone)]
pub struct AllowanceManager<S, N> {
    provider: HttpProvider,
    share_token: Address,
    vault: Address,
    approval_ceiling: U256,
    gas_limit: u64,
    confirm_timeout: Duration,
    fees: FeeEstimator,
    nonces: N,
    submitter: S,
}

/// True when the current grant does not cover the required quantity.
pub fn needs_approval(current: U256, required: U256) -> bool {
    current < required
}

impl<S: Submission, N: NonceSource> AllowanceManager<S, N> {
    pub fn new(
        provider: HttpProvider,
        share_token: Address,
        vault: Address,
        approval_ceiling: U256,
        gas_limit: u64,
        confirm_timeout: Duration,
        fees: FeeEstimator,
        nonces: N,
        submitter: S,
    ) -> Self {
        Self {
            provider,
            share_token,
            vault,
            approval_ceiling,
            gas_limit,
            confirm_timeout,
            fees,
            nonces,
            submitter,
        }
    }

    /// Ensure the vault may move at least `required` share base units.
    /// Submits an approval up to the configured ceiling only when the
    /// observed allowance falls short, and blocks until that approval is
    /// confirmed so the redemption that follows cannot race it.
    pub async fn ensure_allowance(&self, required: U256) -> Result<(), AppError> {
        let shares = Erc20::new(self.share_token, self.provider.clone());
        let current = shares
            .allowance(self.submitter.sender(), self.vault)
            .call()
            .await
            .map_err(|e| AppError::Connection(format!("Allowance read failed: {}", e)))?;

        if !needs_approval(current, required) {
            return Ok(());
        }

        let quote = self.fees.quote().await?;
        let nonce = self.nonces.next_nonce().await?;
        let calldata = Erc20::approveCall {
            spender: self.vault,
            amount: self.approval_ceiling,
        }
        .abi_encode();

        let hash = self
            .submitter
            .submit_call(self.share_token, calldata, self.gas_limit, quote, nonce)
            .await?;
        tracing::info!(
            target: "allowance",
            tx = %format!("{hash:#x}"),
            required = %required,
            "Approval submitted"
        );

        match self.submitter.wait_for_receipt(hash, self.confirm_timeout).await? {
            ReceiptStatus::Success => {
                tracing::info!(target: "allowance", tx = %format!("{hash:#x}"), "Approval confirmed");
                Ok(())
            }
            ReceiptStatus::Reverted => Err(AppError::Transaction {
                hash: format!("{hash:#x}"),
                reason: "approval reverted on-chain".to_string(),
            }),
        }
    }
}

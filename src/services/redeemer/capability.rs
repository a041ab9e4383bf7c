// SPDX-License-Identifier: MIT

use crate::domain::error::AppError;
use crate::infrastructure::contracts::Erc4626Vault;
use crate::network::provider::HttpProvider;
use alloy::primitives::Address;
use alloy::providers::Provider;

/// Which of the two mutually exclusive redemption interfaces the vault
/// exposes. Resolved exactly once at startup and threaded through as an
/// immutable value; never re-probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityMode {
    /// `redeem(shares, receiver, owner)` plus `previewRedeem(shares)`.
    Erc4626,
    /// Bare `redeem(shares)`; no preview available.
    Bare,
}

/// Probe the vault's `asset()` metadata accessor to pick the interaction
/// mode. A failed probe against a reachable endpoint means the method is
/// missing and the bare interface applies; a failed probe against an
/// unreachable endpoint aborts startup, since committing to a mode while the
/// RPC is down risks locking in the wrong ABI for the process lifetime.
pub async fn resolve(provider: &HttpProvider, vault: Address) -> Result<CapabilityMode, AppError> {
    let probe = Erc4626Vault::new(vault, provider.clone());
    match probe.asset().call().await {
        Ok(asset) => {
            tracing::info!(
                target: "capability",
                vault = %vault,
                asset = %asset,
                "Vault exposes the standard ERC-4626 interface"
            );
            Ok(CapabilityMode::Erc4626)
        }
        Err(probe_err) => {
            provider.get_chain_id().await.map_err(|e| {
                AppError::Connection(format!("RPC unreachable during interface probe: {}", e))
            })?;
            tracing::info!(
                target: "capability",
                vault = %vault,
                probe_error = %probe_err,
                "asset() probe failed; using bare redeem(uint256) interface"
            );
            Ok(CapabilityMode::Bare)
        }
    }
}

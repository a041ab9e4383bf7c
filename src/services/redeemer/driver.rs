// SPDX-License-Identifier: MIT

use crate::network::nonce::NonceSource;
use crate::network::submitter::{ReceiptStatus, Submission};
use crate::services::redeemer::engine::{Outcome, RedemptionEngine};
use alloy::primitives::Address;
use std::time::Duration;
use tokio::time::sleep;

/// Outer scheduling loop: invokes the engine on a fixed cadence, contains
/// every per-cycle failure and never terminates.
pub struct PollDriver<S, N> {
    engine: RedemptionEngine<S, N>,
    submitter: S,
    vault: Address,
    poll_interval: Duration,
    error_backoff: Duration,
    confirm_timeout: Duration,
}

impl<S: Submission, N: NonceSource> PollDriver<S, N> {
    pub fn new(
        engine: RedemptionEngine<S, N>,
        submitter: S,
        vault: Address,
        poll_interval: Duration,
        error_backoff: Duration,
        confirm_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            submitter,
            vault,
            poll_interval,
            error_backoff,
            confirm_timeout,
        }
    }

    /// Runs until the process is externally terminated.
    pub async fn run(&self) {
        tracing::info!(target: "driver", vault = %self.vault, "Redemption watch started");
        loop {
            match self.engine.attempt_redeem().await {
                Ok(Outcome::Submitted(hash)) => {
                    // Best-effort observation only. An unconfirmed redeem is
                    // left to the chain; its nonce is superseded by whatever
                    // the next cycle submits.
                    match self.submitter.wait_for_receipt(hash, self.confirm_timeout).await {
                        Ok(ReceiptStatus::Success) => {
                            tracing::info!(target: "driver", tx = %format!("{hash:#x}"), "Redeem confirmed");
                        }
                        Ok(ReceiptStatus::Reverted) => {
                            tracing::warn!(target: "driver", tx = %format!("{hash:#x}"), "Redeem reverted on-chain");
                        }
                        Err(e) => {
                            tracing::warn!(
                                target: "driver",
                                tx = %format!("{hash:#x}"),
                                error = %e,
                                "Gave up waiting for redeem receipt"
                            );
                        }
                    }
                }
                Ok(Outcome::Skipped(reason)) => {
                    tracing::debug!(target: "driver", reason = %reason, "Cycle skipped");
                }
                Err(e) => {
                    tracing::warn!(target: "driver", error = %e, "Cycle failed");
                    sleep(self.error_backoff).await;
                }
            }
            sleep(self.poll_interval).await;
        }
    }
}

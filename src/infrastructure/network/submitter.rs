// SPDX-License-Identifier: MIT

use crate::domain::error::AppError;
use crate::network::gas::FeeQuote;
use crate::network::provider::HttpProvider;
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, B256, TxKind, U256};
use alloy::providers::Provider;
use alloy::signers::local::PrivateKeySigner;
use std::time::Duration;
use tokio::time::{Instant, sleep};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// Chain write access as the redemption components see it: broadcast a
/// prepared call and observe its receipt.
#[allow(async_fn_in_trait)]
pub trait Submission {
    fn sender(&self) -> Address;

    async fn submit_call(
        &self,
        to: Address,
        calldata: Vec<u8>,
        gas_limit: u64,
        fees: FeeQuote,
        nonce: u64,
    ) -> Result<B256, AppError>;

    async fn wait_for_receipt(&self, hash: B256, timeout: Duration)
    -> Result<ReceiptStatus, AppError>;
}

/// Builds, signs and broadcasts EIP-1559 calls for the operator account, and
/// polls for their receipts. In dry-run mode transactions are signed and
/// logged but never broadcast.
#[derive(Clone)]
pub struct TxSubmitter {
    provider: HttpProvider,
    signer: PrivateKeySigner,
    chain_id: u64,
    dry_run: bool,
}

impl TxSubmitter {
    pub fn new(provider: HttpProvider, signer: PrivateKeySigner, chain_id: u64, dry_run: bool) -> Self {
        Self {
            provider,
            signer,
            chain_id,
            dry_run,
        }
    }
}

impl Submission for TxSubmitter {
    fn sender(&self) -> Address {
        self.signer.address()
    }

    async fn submit_call(
        &self,
        to: Address,
        calldata: Vec<u8>,
        gas_limit: u64,
        fees: FeeQuote,
        nonce: u64,
    ) -> Result<B256, AppError> {
        let mut tx = TxEip1559 {
            chain_id: self.chain_id,
            nonce,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            max_fee_per_gas: fees.max_fee_per_gas,
            gas_limit,
            to: TxKind::Call(to),
            value: U256::ZERO,
            access_list: Default::default(),
            input: calldata.into(),
        };

        let sig = TxSignerSync::sign_transaction_sync(&self.signer, &mut tx)
            .map_err(|e| AppError::Initialization(format!("Sign tx failed: {}", e)))?;
        let signed: TxEnvelope = tx.into_signed(sig).into();
        let raw = signed.encoded_2718();
        let hash = *signed.tx_hash();

        if self.dry_run {
            tracing::info!(target: "submitter", tx = %format!("{hash:#x}"), nonce, "Dry-run: would broadcast tx");
            return Ok(hash);
        }

        self.provider
            .send_raw_transaction(raw.as_slice())
            .await
            .map_err(|e| AppError::Connection(format!("Raw tx send failed: {}", e)))?;

        Ok(hash)
    }

    /// Poll for a receipt until the deadline. Transient read errors during
    /// the wait are logged and absorbed; only the deadline surfaces an error.
    async fn wait_for_receipt(
        &self,
        hash: B256,
        timeout: Duration,
    ) -> Result<ReceiptStatus, AppError> {
        if self.dry_run {
            return Ok(ReceiptStatus::Success);
        }

        let deadline = Instant::now() + timeout;
        loop {
            match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(rcpt)) => {
                    return Ok(if rcpt.status() {
                        ReceiptStatus::Success
                    } else {
                        ReceiptStatus::Reverted
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(target: "submitter", tx = %format!("{hash:#x}"), error = %e, "Receipt poll failed");
                }
            }

            if Instant::now() >= deadline {
                return Err(AppError::Transaction {
                    hash: format!("{hash:#x}"),
                    reason: format!("no receipt within {}s", timeout.as_secs()),
                });
            }
            sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}

// SPDX-License-Identifier: MIT

use alloy::primitives::{Address, B256, Bytes, U128, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::transports::mock::Asserter;
use alloy_sol_types::SolCall;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vault_redeemer::domain::error::AppError;
use vault_redeemer::infrastructure::contracts::{BareVault, Erc20, Erc4626Vault};
use vault_redeemer::network::gas::{FeeEstimator, FeeQuote};
use vault_redeemer::network::nonce::NonceSource;
use vault_redeemer::network::provider::HttpProvider;
use vault_redeemer::network::submitter::{ReceiptStatus, Submission};
use vault_redeemer::redeemer::allowance::AllowanceManager;
use vault_redeemer::redeemer::capability::CapabilityMode;
use vault_redeemer::redeemer::engine::{Outcome, RedemptionEngine, SharePolicy};

fn operator() -> Address {
    Address::from([0xAA; 20])
}
fn vault() -> Address {
    Address::from([0x11; 20])
}
fn share_token() -> Address {
    Address::from([0x22; 20])
}
fn asset_token() -> Address {
    Address::from([0x33; 20])
}

fn usdt(amount: u64) -> U256 {
    U256::from(amount) * U256::from(1_000_000u64)
}

// One ABI-encoded 32-byte word, as an eth_call response.
fn word(value: U256) -> Bytes {
    Bytes::from(value.to_be_bytes_vec())
}

fn gas_price() -> U128 {
    U128::from(30_000_000_000u128)
}

fn mocked_provider(asserter: &Asserter) -> HttpProvider {
    ProviderBuilder::new()
        .connect_mocked_client(asserter.clone())
        .root()
        .clone()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Submitted {
        to: Address,
        selector: [u8; 4],
        nonce: u64,
    },
    AwaitedReceipt(B256),
}

/// Records every write-path call; hashes are derived from the nonce so the
/// receipt wait can be matched to its submission.
#[derive(Clone)]
struct RecordingSubmitter {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingSubmitter {
    fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl Submission for RecordingSubmitter {
    fn sender(&self) -> Address {
        operator()
    }

    async fn submit_call(
        &self,
        to: Address,
        calldata: Vec<u8>,
        _gas_limit: u64,
        _fees: FeeQuote,
        nonce: u64,
    ) -> Result<B256, AppError> {
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&calldata[..4]);
        self.events
            .lock()
            .unwrap()
            .push(Event::Submitted { to, selector, nonce });
        Ok(B256::with_last_byte(nonce as u8))
    }

    async fn wait_for_receipt(
        &self,
        hash: B256,
        _timeout: Duration,
    ) -> Result<ReceiptStatus, AppError> {
        self.events.lock().unwrap().push(Event::AwaitedReceipt(hash));
        Ok(ReceiptStatus::Success)
    }
}

/// Stands in for the chain's confirmed transaction count: every submission in
/// these scenarios confirms, so each query yields the next value.
#[derive(Clone)]
struct CountingNonces {
    next: Arc<Mutex<u64>>,
}

impl CountingNonces {
    fn starting_at(nonce: u64) -> Self {
        Self {
            next: Arc::new(Mutex::new(nonce)),
        }
    }
}

impl NonceSource for CountingNonces {
    async fn next_nonce(&self) -> Result<u64, AppError> {
        let mut next = self.next.lock().unwrap();
        let nonce = *next;
        *next += 1;
        Ok(nonce)
    }
}

fn engine(
    provider: HttpProvider,
    mode: CapabilityMode,
    submitter: RecordingSubmitter,
    nonces: CountingNonces,
) -> RedemptionEngine<RecordingSubmitter, CountingNonces> {
    let fees = FeeEstimator::new(provider.clone(), 2_000_000_000, 40_000_000_000);
    let allowance = AllowanceManager::new(
        provider.clone(),
        share_token(),
        vault(),
        U256::MAX,
        70_000,
        Duration::from_secs(120),
        fees.clone(),
        nonces.clone(),
        submitter.clone(),
    );
    RedemptionEngine::new(
        provider,
        mode,
        vault(),
        share_token(),
        asset_token(),
        operator(),
        usdt(10),
        6,
        6,
        SharePolicy::All,
        300_000,
        fees,
        nonces,
        allowance,
        submitter,
    )
}

#[tokio::test]
async fn approval_is_confirmed_before_the_redeem_is_submitted() {
    let asserter = Asserter::new();
    // Reads in engine order: vault asset balance, operator shares, preview,
    // current allowance, then one gas price per submission.
    asserter.push_success(&word(usdt(15)));
    asserter.push_success(&word(U256::from(1000u64)));
    asserter.push_success(&word(usdt(12)));
    asserter.push_success(&word(U256::ZERO));
    asserter.push_success(&gas_price());
    asserter.push_success(&gas_price());

    let submitter = RecordingSubmitter::new();
    let engine = engine(
        mocked_provider(&asserter),
        CapabilityMode::Erc4626,
        submitter.clone(),
        CountingNonces::starting_at(4),
    );

    let outcome = engine.attempt_redeem().await.expect("cycle");

    assert_eq!(
        submitter.events(),
        vec![
            Event::Submitted {
                to: share_token(),
                selector: Erc20::approveCall::SELECTOR,
                nonce: 4,
            },
            Event::AwaitedReceipt(B256::with_last_byte(4)),
            Event::Submitted {
                to: vault(),
                selector: Erc4626Vault::redeemCall::SELECTOR,
                nonce: 5,
            },
        ]
    );
    assert_eq!(outcome, Outcome::Submitted(B256::with_last_byte(5)));
}

#[tokio::test]
async fn covered_allowance_submits_only_the_redeem() {
    let asserter = Asserter::new();
    asserter.push_success(&word(usdt(15)));
    asserter.push_success(&word(U256::from(1000u64)));
    asserter.push_success(&word(usdt(12)));
    asserter.push_success(&word(U256::MAX));
    asserter.push_success(&gas_price());

    let submitter = RecordingSubmitter::new();
    let engine = engine(
        mocked_provider(&asserter),
        CapabilityMode::Erc4626,
        submitter.clone(),
        CountingNonces::starting_at(4),
    );

    let outcome = engine.attempt_redeem().await.expect("cycle");

    assert_eq!(
        submitter.events(),
        vec![Event::Submitted {
            to: vault(),
            selector: Erc4626Vault::redeemCall::SELECTOR,
            nonce: 4,
        }]
    );
    assert_eq!(outcome, Outcome::Submitted(B256::with_last_byte(4)));
}

#[tokio::test]
async fn bare_mode_redeems_without_a_preview_read() {
    let asserter = Asserter::new();
    // No preview response queued: the bare interface never asks for one.
    asserter.push_success(&word(usdt(20)));
    asserter.push_success(&word(U256::from(500u64)));
    asserter.push_success(&word(U256::MAX));
    asserter.push_success(&gas_price());

    let submitter = RecordingSubmitter::new();
    let engine = engine(
        mocked_provider(&asserter),
        CapabilityMode::Bare,
        submitter.clone(),
        CountingNonces::starting_at(0),
    );

    let outcome = engine.attempt_redeem().await.expect("cycle");

    assert_eq!(
        submitter.events(),
        vec![Event::Submitted {
            to: vault(),
            selector: BareVault::redeemCall::SELECTOR,
            nonce: 0,
        }]
    );
    assert_eq!(outcome, Outcome::Submitted(B256::with_last_byte(0)));
}

#[tokio::test]
async fn consecutive_cycle_submissions_use_strictly_increasing_nonces() {
    let asserter = Asserter::new();
    for _ in 0..2 {
        asserter.push_success(&word(usdt(15)));
        asserter.push_success(&word(U256::from(1000u64)));
        asserter.push_success(&word(usdt(12)));
        asserter.push_success(&word(U256::MAX));
        asserter.push_success(&gas_price());
    }

    let submitter = RecordingSubmitter::new();
    let engine = engine(
        mocked_provider(&asserter),
        CapabilityMode::Erc4626,
        submitter.clone(),
        CountingNonces::starting_at(4),
    );

    engine.attempt_redeem().await.expect("first cycle");
    engine.attempt_redeem().await.expect("second cycle");

    let nonces: Vec<u64> = submitter
        .events()
        .iter()
        .filter_map(|e| match e {
            Event::Submitted { nonce, .. } => Some(*nonce),
            Event::AwaitedReceipt(_) => None,
        })
        .collect();
    assert_eq!(nonces, vec![4, 5]);
}

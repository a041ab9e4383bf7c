// SPDX-License-Identifier: MIT

use crate::common::retry::retry_async;
use crate::domain::error::AppError;
use crate::network::provider::HttpProvider;
use alloy::primitives::Address;
use alloy::providers::Provider;
use std::time::Duration;

/// Source of the nonce for the next submission.
#[allow(async_fn_in_trait)]
pub trait NonceSource {
    async fn next_nonce(&self) -> Result<u64, AppError>;
}

/// Fresh confirmed-count queries for the operator account. Submissions are
/// strictly serialized by the single poll loop, and the latest (not pending)
/// count is used deliberately: a transaction from a previous cycle that never
/// confirmed does not advance it, so the next submission reuses the same
/// nonce and supersedes the stuck one instead of queueing behind it.
#[derive(Clone)]
pub struct NonceManager {
    provider: HttpProvider,
    address: Address,
}

impl NonceManager {
    pub fn new(provider: HttpProvider, address: Address) -> Self {
        Self { provider, address }
    }
}

impl NonceSource for NonceManager {
    async fn next_nonce(&self) -> Result<u64, AppError> {
        let provider = self.provider.clone();
        let address = self.address;
        retry_async(
            move || {
                let provider = provider.clone();
                async move { provider.get_transaction_count(address).latest().await }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("Failed to fetch nonce: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U64;
    use alloy::providers::ProviderBuilder;
    use alloy::transports::mock::Asserter;

    fn mocked_provider(asserter: &Asserter) -> HttpProvider {
        ProviderBuilder::new()
            .connect_mocked_client(asserter.clone())
            .root()
            .clone()
    }

    #[tokio::test]
    async fn unconfirmed_submission_leaves_the_next_nonce_unchanged() {
        let asserter = Asserter::new();
        asserter.push_success(&U64::from(9u64));
        asserter.push_success(&U64::from(9u64));
        let nonces = NonceManager::new(mocked_provider(&asserter), Address::from([7u8; 20]));

        assert_eq!(nonces.next_nonce().await.unwrap(), 9);
        // The prior submission never confirmed, so the chain's count is
        // unchanged and the same nonce goes out again, replacing it.
        assert_eq!(nonces.next_nonce().await.unwrap(), 9);
    }

    #[tokio::test]
    async fn confirmed_submissions_advance_the_nonce() {
        let asserter = Asserter::new();
        asserter.push_success(&U64::from(9u64));
        asserter.push_success(&U64::from(10u64));
        let nonces = NonceManager::new(mocked_provider(&asserter), Address::from([7u8; 20]));

        assert_eq!(nonces.next_nonce().await.unwrap(), 9);
        assert_eq!(nonces.next_nonce().await.unwrap(), 10);
    }
}

// SPDX-License-Identifier: MIT

use alloy::providers::Provider;
use alloy::signers::local::PrivateKeySigner;
use clap::Parser;
use std::str::FromStr;
use vault_redeemer::app::config::Settings;
use vault_redeemer::app::logging::setup_logging;
use vault_redeemer::common::units::{format_units, parse_base_units};
use vault_redeemer::domain::error::AppError;
use vault_redeemer::infrastructure::contracts::Erc20;
use vault_redeemer::network::gas::FeeEstimator;
use vault_redeemer::network::nonce::NonceManager;
use vault_redeemer::network::provider::ConnectionFactory;
use vault_redeemer::network::submitter::TxSubmitter;
use vault_redeemer::redeemer::allowance::AllowanceManager;
use vault_redeemer::redeemer::capability;
use vault_redeemer::redeemer::driver::PollDriver;
use vault_redeemer::redeemer::engine::RedemptionEngine;

#[derive(Parser, Debug)]
#[command(author, version, about = "vault redemption agent")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,...} if present)
    #[arg(long)]
    config: Option<String>,

    /// Sign transactions but do not broadcast them
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let settings = Settings::load_with_path(cli.config.as_deref())?;
    setup_logging(
        if settings.debug { "debug" } else { "info" },
        settings.log_json,
    );

    let signer = PrivateKeySigner::from_str(&settings.wallet_key)
        .map_err(|e| AppError::Config(format!("Invalid wallet key: {}", e)))?;
    if signer.address() != settings.wallet_address {
        return Err(AppError::InvalidAddress(format!(
            "WALLET_ADDRESS {} does not match the key's address {}",
            settings.wallet_address,
            signer.address()
        )));
    }

    let provider = ConnectionFactory::http(&settings.rpc_url)?;
    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| AppError::Connection(format!("chain_id fetch failed: {}", e)))?;
    tracing::info!(
        target: "startup",
        chain_id,
        vault = %settings.vault_address,
        dry_run = cli.dry_run,
        "Connected to RPC"
    );

    // Resolved once; the interaction mode is fixed for the process lifetime.
    let mode = capability::resolve(&provider, settings.vault_address).await?;

    let asset = Erc20::new(settings.asset_token_address, provider.clone());
    let asset_decimals: u8 = asset
        .decimals()
        .call()
        .await
        .map_err(|e| AppError::Initialization(format!("Asset decimals read failed: {}", e)))?;
    let share_token = Erc20::new(settings.share_token_address, provider.clone());
    let share_decimals: u8 = share_token
        .decimals()
        .call()
        .await
        .map_err(|e| AppError::Initialization(format!("Share decimals read failed: {}", e)))?;

    let threshold_units = parse_base_units(&settings.min_redeem_threshold, asset_decimals)?;
    let policy = settings.share_policy()?;
    tracing::info!(
        target: "startup",
        mode = ?mode,
        asset_decimals,
        share_decimals,
        threshold = %format_units(threshold_units, asset_decimals),
        policy = ?policy,
        "Redemption policy resolved"
    );

    let fees = FeeEstimator::new(
        provider.clone(),
        settings.priority_fee_wei(),
        settings.fee_cap_wei(),
    );
    let nonces = NonceManager::new(provider.clone(), signer.address());
    let submitter = TxSubmitter::new(provider.clone(), signer, chain_id, cli.dry_run);
    let allowance = AllowanceManager::new(
        provider.clone(),
        settings.share_token_address,
        settings.vault_address,
        settings.approval_ceiling_value()?,
        settings.gas_limit_approve,
        settings.approve_confirm_timeout(),
        fees.clone(),
        nonces.clone(),
        submitter.clone(),
    );
    let engine = RedemptionEngine::new(
        provider,
        mode,
        settings.vault_address,
        settings.share_token_address,
        settings.asset_token_address,
        settings.wallet_address,
        threshold_units,
        asset_decimals,
        share_decimals,
        policy,
        settings.gas_limit_redeem,
        fees,
        nonces,
        allowance,
        submitter.clone(),
    );
    let driver = PollDriver::new(
        engine,
        submitter,
        settings.vault_address,
        settings.poll_interval(),
        settings.error_backoff(),
        settings.redeem_confirm_timeout(),
    );

    driver.run().await;
    Ok(())
}

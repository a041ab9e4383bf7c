// SPDX-License-Identifier: MIT

use crate::domain::error::AppError;
use alloy::primitives::U256;

/// Scale a human-readable decimal amount (e.g. "10" or "12.5") into integer
/// base units for a token with the given decimal precision. Fractional digits
/// beyond the token's precision are truncated.
pub fn parse_base_units(raw: &str, decimals: u8) -> Result<U256, AppError> {
    let trimmed = raw.trim();
    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((i, f)) => (i, f),
        None => (trimmed, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(AppError::Config(format!("Invalid decimal amount '{raw}'")));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(AppError::Config(format!("Invalid decimal amount '{raw}'")));
    }

    let scale = U256::from(10u64)
        .checked_pow(U256::from(decimals))
        .ok_or_else(|| AppError::Config(format!("Unsupported token precision {decimals}")))?;

    let int_units = if int_part.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(int_part, 10)
            .map_err(|_| AppError::Config(format!("Invalid decimal amount '{raw}'")))?
            .checked_mul(scale)
            .ok_or_else(|| AppError::Config(format!("Amount '{raw}' overflows base units")))?
    };

    let mut frac = frac_part.to_string();
    frac.truncate(decimals as usize);
    let frac_units = if frac.is_empty() {
        U256::ZERO
    } else {
        let pad = (decimals as usize - frac.len()) as u64;
        U256::from_str_radix(&frac, 10)
            .map_err(|_| AppError::Config(format!("Invalid decimal amount '{raw}'")))?
            .checked_mul(U256::from(10u64).pow(U256::from(pad)))
            .ok_or_else(|| AppError::Config(format!("Amount '{raw}' overflows base units")))?
    };

    int_units
        .checked_add(frac_units)
        .ok_or_else(|| AppError::Config(format!("Amount '{raw}' overflows base units")))
}

/// Render integer base units as a decimal string for log output.
pub fn format_units(value: U256, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let scale = U256::from(10u64).pow(U256::from(decimals));
    let whole = value / scale;
    let frac = value % scale;
    if frac.is_zero() {
        return whole.to_string();
    }
    let digits = frac.to_string();
    let frac_str = format!("{}{digits}", "0".repeat(decimals as usize - digits.len()));
    format!("{whole}.{}", frac_str.trim_end_matches('0'))
}

//! Native currency amount entry.

use alloy::primitives::{utils::parse_ether, U256};

use crate::error::ValidationError;

/// Suggested tip shown in the amount prompt.
pub const DEFAULT_TIP_AMOUNT: &str = "0.001";

/// Wei resolution of the native currency.
const MAX_FRACTION_DIGITS: usize = 18;

/// Fixed fee the contract charges to mint a profile NFT (0.001 native units).
pub const PROFILE_NFT_FEE_WEI: u64 = 1_000_000_000_000_000;

/// Parse user-entered tip text into wei.
///
/// Empty input means the user backed out and yields `Ok(None)`. Anything that is not a
/// positive decimal amount is rejected.
pub fn parse_tip_amount(input: &str) -> Result<Option<U256>, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let invalid = || ValidationError::InvalidTipAmount(trimmed.to_string());
    if !trimmed.chars().all(|c| c.is_ascii_digit() || c == '.') || trimmed.matches('.').count() > 1 {
        return Err(invalid());
    }
    // Finer than one wei cannot be sent; refuse instead of truncating.
    if trimmed.split_once('.').is_some_and(|(_, fraction)| fraction.len() > MAX_FRACTION_DIGITS) {
        return Err(invalid());
    }
    let wei = parse_ether(trimmed).map_err(|_| invalid())?;
    if wei.is_zero() {
        return Err(invalid());
    }
    Ok(Some(wei))
}

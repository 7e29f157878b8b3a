//! Limit values with optional K/M/G suffixes.

use crate::errors::*;

/// Parse `42`, `1K`, `2M`, `3G` (decimal multipliers) or `-1` (unlimited).
///
/// An empty string is zero.
pub fn parse_number(input: &str) -> Result<i64> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(0);
    }
    if input == "-1" {
        return Ok(-1);
    }

    let upper = input.to_ascii_uppercase();
    let (digits, multiplier) = match upper.chars().last() {
        Some('K') => (&upper[..upper.len() - 1], 1_000),
        Some('M') => (&upper[..upper.len() - 1], 1_000_000),
        Some('G') => (&upper[..upper.len() - 1], 1_000_000_000),
        _ => (upper.as_str(), 1),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ClaimError::InvalidNumber(input.to_string()));
    }
    digits
        .parse::<i64>()
        .ok()
        .and_then(|v| v.checked_mul(multiplier))
        .ok_or_else(|| ClaimError::InvalidNumber(input.to_string()))
}

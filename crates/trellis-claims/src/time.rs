//! Claim validity windows.
//!
//! A time parameter is one of
//!
//! - `0`: unset; the bound is removed from the claim
//! - an absolute date, `YYYY-MM-DD` (midnight UTC) or RFC 3339
//! - an offset from now: a number followed by `h`, `d`, `w`, `M` or `y`

use crate::{claim::Claim, errors::*};
use chrono::{DateTime, Duration, Months, NaiveDate, Utc};

/// Current Unix timestamp in seconds
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Parse a time parameter relative to `now`. `Ok(None)` means unset.
pub fn parse_time(input: &str, now: i64) -> Result<Option<i64>> {
    let input = input.trim();
    if input == "0" {
        return Ok(None);
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| invalid(input, "date out of range"))?;
        return Ok(Some(midnight.and_utc().timestamp()));
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Ok(Some(at.timestamp()));
    }
    parse_offset(input, now).map(Some)
}

fn invalid(input: &str, reason: &str) -> ClaimError {
    ClaimError::InvalidDate {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_offset(input: &str, now: i64) -> Result<i64> {
    let unit = input
        .chars()
        .last()
        .ok_or_else(|| invalid(input, "empty value"))?;
    let amount: i64 = input[..input.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| invalid(input, "expected a date or a number followed by h, d, w, M or y"))?;
    if amount < 0 {
        return Err(invalid(input, "offsets cannot be negative"));
    }

    let base = DateTime::<Utc>::from_timestamp(now, 0)
        .ok_or_else(|| invalid(input, "timestamp out of range"))?;
    let at = match unit {
        'h' => Duration::try_hours(amount).and_then(|d| base.checked_add_signed(d)),
        'd' => Duration::try_days(amount).and_then(|d| base.checked_add_signed(d)),
        'w' => Duration::try_weeks(amount).and_then(|d| base.checked_add_signed(d)),
        'M' => months(amount).and_then(|m| base.checked_add_months(m)),
        'y' => amount
            .checked_mul(12)
            .and_then(months)
            .and_then(|m| base.checked_add_months(m)),
        _ => return Err(invalid(input, "unknown unit")),
    };
    at.map(|at| at.timestamp())
        .ok_or_else(|| invalid(input, "date out of range"))
}

fn months(amount: i64) -> Option<Months> {
    u32::try_from(amount).ok().map(Months::new)
}

/// Start/expiry parameters supplied by the caller.
///
/// `None` leaves the corresponding claim field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeParams {
    pub start: Option<String>,
    pub expiry: Option<String>,
}

impl TimeParams {
    pub fn is_start_changed(&self) -> bool {
        self.start.is_some()
    }

    pub fn is_expiry_changed(&self) -> bool {
        self.expiry.is_some()
    }

    pub fn start_date(&self, now: i64) -> Result<Option<i64>> {
        self.start
            .as_deref()
            .map_or(Ok(None), |s| parse_time(s, now))
    }

    pub fn expiry_date(&self, now: i64) -> Result<Option<i64>> {
        self.expiry
            .as_deref()
            .map_or(Ok(None), |s| parse_time(s, now))
    }

    /// Check both values parse and that expiry is after start
    pub fn validate(&self) -> Result<()> {
        self.validate_at(current_timestamp())
    }

    pub fn validate_at(&self, now: i64) -> Result<()> {
        let start = self.start_date(now)?;
        let expiry = self.expiry_date(now)?;
        check_window(start, expiry)
    }

    /// Apply the changed bounds to `claim`
    pub fn apply(&self, claim: &mut Claim) -> Result<()> {
        self.apply_at(claim, current_timestamp())
    }

    pub fn apply_at(&self, claim: &mut Claim, now: i64) -> Result<()> {
        let nbf = if self.is_start_changed() {
            self.start_date(now)?
        } else {
            claim.nbf
        };
        let exp = if self.is_expiry_changed() {
            self.expiry_date(now)?
        } else {
            claim.exp
        };
        check_window(nbf, exp)?;
        claim.nbf = nbf;
        claim.exp = exp;
        Ok(())
    }
}

fn check_window(start: Option<i64>, expiry: Option<i64>) -> Result<()> {
    match (start, expiry) {
        (Some(start), Some(expiry)) if expiry <= start => {
            Err(ClaimError::InvalidTimeWindow { start, expiry })
        }
        _ => Ok(()),
    }
}

//! # Facet Accrual - Yield Accrual Engine
//!
//! ## Purpose
//!
//! Pure, time-weighted yield arithmetic for the yield token. Time is always
//! supplied by the caller; nothing in this crate reads a clock, so the same
//! inputs always produce the same yield.
//!
//! ## Model
//!
//! ```text
//! accrue(previous, elapsed, rate_bps, expiry, since)
//!     = previous + floor(clamp(elapsed, 0, expiry - since) * rate_bps / 10000)
//! ```
//!
//! A yield token carries no mint time, so [`AccrualSchedule`] anchors each
//! token's window to its expiry: accrual runs over `[expiry - term, expiry]`
//! and the target at `expiry` is exactly the full-term yield.

pub mod schedule;

pub use schedule::AccrualSchedule;

use facet_codec::range;
use facet_types::CovenantResult;

/// Basis-point denominator for yield rates
pub const RATE_DENOMINATOR: u64 = 10_000;

/// Add yield earned over `elapsed` seconds to `previous`
///
/// `elapsed` is clamped to `[0, expiry - since]`, so the result never passes
/// the yield available up to expiry. Overflow is `OutOfRange`.
pub fn accrue(
    previous: u64,
    elapsed: i64,
    rate_bps: u32,
    expiry: u32,
    since: u32,
) -> CovenantResult<u64> {
    let window = i64::from(expiry.saturating_sub(since));
    let elapsed = elapsed.clamp(0, window);
    // elapsed is in [0, u32::MAX] after the clamp
    let earned = u128::from(elapsed.unsigned_abs()) * u128::from(rate_bps)
        / u128::from(RATE_DENOMINATOR);
    range::amount("accrued_yield", u128::from(previous) + earned)
}

/// Yield for a full window of `term` seconds
pub fn term_yield(term: u32, rate_bps: u32) -> CovenantResult<u64> {
    accrue(0, i64::from(term), rate_bps, term, 0)
}

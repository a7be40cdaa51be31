//! # Yield Accrual Properties
//!
//! - repeated claims at non-decreasing times never lower the accrued yield
//! - the claim at expiry equals the full-term yield for the rate
//! - `accrue` is bounded by its clamped window

use facet_accrual::{accrue, AccrualSchedule, RATE_DENOMINATOR};
use facet_codec::YieldToken;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_claims_are_monotone(
        rate_bps in 0u32..=100_000,
        term in 1u32..=1_000_000,
        offsets in prop::collection::vec(0u32..2_000_000, 1..16),
    ) {
        let schedule = AccrualSchedule::new(rate_bps, term).unwrap();
        let expiry = 2_000_000u32;
        let mut times = offsets;
        times.sort_unstable();

        let mut token = YieldToken { accrued: 0, expiry };
        for now in times {
            let claimed = schedule.claimable(&token, now).unwrap();
            prop_assert!(claimed >= token.accrued);
            token.accrued = claimed;
        }
        prop_assert!(token.accrued <= schedule.full_term_yield().unwrap());
        prop_assert_eq!(
            schedule.claimable(&token, expiry).unwrap(),
            schedule.full_term_yield().unwrap()
        );
    }

    #[test]
    fn prop_accrue_bounded_by_window(
        previous in 0u64..u64::MAX / 2,
        elapsed in any::<i64>(),
        rate_bps in any::<u32>(),
        since in any::<u32>(),
        expiry in any::<u32>(),
    ) {
        let value = accrue(previous, elapsed, rate_bps, expiry, since).unwrap();
        let window = u128::from(expiry.saturating_sub(since));
        let ceiling = u128::from(previous) + window * u128::from(rate_bps) / u128::from(RATE_DENOMINATOR);
        prop_assert!(value >= previous);
        prop_assert!(u128::from(value) <= ceiling);
    }

    #[test]
    fn prop_accrue_is_deterministic(
        elapsed in 0i64..1_000_000,
        rate_bps in 0u32..10_000,
    ) {
        prop_assert_eq!(
            accrue(5, elapsed, rate_bps, 1_000_000, 0).unwrap(),
            accrue(5, elapsed, rate_bps, 1_000_000, 0).unwrap()
        );
    }
}

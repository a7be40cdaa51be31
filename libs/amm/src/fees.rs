//! Per-liquidity fee growth in 32.32 fixed point
//!
//! The cumulative growth counters wrap modulo 2^64, and a position's share is
//! taken from the wrapping difference against its checkpoint. Only that
//! difference has to fit: a position must be collected before it is owed more
//! than 2^32 fee units per unit of its liquidity.

use facet_codec::range;
use facet_types::{CovenantError, CovenantResult};

/// Fee growth is scaled by `2^FEE_GROWTH_SHIFT`
pub const FEE_GROWTH_SHIFT: u32 = 32;

/// Growth added when `fee` is spread over `liquidity`
pub fn growth_increment(field: &'static str, fee: u64, liquidity: u64) -> CovenantResult<u64> {
    if liquidity == 0 {
        return Err(CovenantError::InsufficientReserve {
            available: 0,
            required: fee,
        });
    }
    let scaled = (u128::from(fee) << FEE_GROWTH_SHIFT) / u128::from(liquidity);
    range::amount(field, scaled)
}

/// Fees a position earned between its checkpoint and the current growth
pub fn fees_owed(
    field: &'static str,
    liquidity: u64,
    growth: u64,
    checkpoint: u64,
) -> CovenantResult<u64> {
    let delta = growth.wrapping_sub(checkpoint);
    let owed = (u128::from(liquidity) * u128::from(delta)) >> FEE_GROWTH_SHIFT;
    range::amount(field, owed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_provider_earns_whole_fee() {
        let growth = growth_increment("fee_growth0", 30, 1_000).unwrap();
        assert_eq!(fees_owed("fees0", 1_000, growth, 0).unwrap(), 29);
        let growth = growth_increment("fee_growth0", 30, 1_024).unwrap();
        assert_eq!(fees_owed("fees0", 1_024, growth, 0).unwrap(), 30);
    }

    #[test]
    fn test_split_between_providers_never_exceeds_fee() {
        let growth = growth_increment("fee_growth0", 1_000, 3).unwrap();
        let owed: u64 = (0..3)
            .map(|_| fees_owed("fees0", 1, growth, 0).unwrap())
            .sum();
        assert!(owed <= 1_000);
        assert_eq!(owed, 999);
    }

    #[test]
    fn test_owed_survives_growth_wraparound() {
        let checkpoint = u64::MAX - (5 << FEE_GROWTH_SHIFT) + 1;
        let growth = checkpoint.wrapping_add(growth_increment("fee_growth0", 40, 4).unwrap());
        assert!(growth < checkpoint);
        assert_eq!(fees_owed("fees0", 4, growth, checkpoint).unwrap(), 40);
        assert_eq!(fees_owed("fees0", 10, 6, 6).unwrap(), 0);
    }

    #[test]
    fn test_zero_liquidity_has_no_growth() {
        assert!(matches!(
            growth_increment("fee_growth0", 10, 0),
            Err(CovenantError::InsufficientReserve { .. })
        ));
    }

    #[test]
    fn test_growth_overflow_reported() {
        assert!(matches!(
            growth_increment("fee_growth1", u64::MAX, 1),
            Err(CovenantError::OutOfRange { field: "fee_growth1", .. })
        ));
    }
}

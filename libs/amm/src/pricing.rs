//! Liquidity and swap quoting
//!
//! All arithmetic is integer; division truncates toward zero.

use facet_codec::range;
use facet_types::{CovenantError, CovenantResult};
use rust_decimal::Decimal;

/// Basis-point denominator; fees are capped at 100%
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Liquidity minted for a two-leg deposit
pub fn liquidity_from_amounts(amount0: u64, amount1: u64) -> u64 {
    amount0.min(amount1)
}

/// Fee-adjusted output of a swap, without any reserve or slippage check
///
/// `fee = floor(amount_in * fee_bps / 10000)`, `amount_out = amount_in - fee`.
pub fn swap_output(amount_in: u64, fee_bps: u32) -> CovenantResult<SwapQuote> {
    if u64::from(fee_bps) > BPS_DENOMINATOR {
        return Err(CovenantError::out_of_range("fee_bps", fee_bps));
    }
    let fee = u128::from(amount_in) * u128::from(fee_bps) / u128::from(BPS_DENOMINATOR);
    let fee = range::amount("swap_fee", fee)?;
    Ok(SwapQuote {
        amount_in,
        fee,
        amount_out: amount_in - fee,
    })
}

/// Quoted swap legs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    pub amount_in: u64,
    /// Portion of the input retained by the pool for liquidity providers
    pub fee: u64,
    pub amount_out: u64,
}

impl SwapQuote {
    /// Realised fee as a fraction of the input, for reporting only
    pub fn effective_fee_rate(&self) -> Decimal {
        if self.amount_in == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.fee) / Decimal::from(self.amount_in)
    }
}

/// Pricing curve used by the pool ledger
pub trait PricingModel: std::fmt::Debug + Send + Sync {
    /// Fee charged on every swap, in basis points
    fn fee_bps(&self) -> u32;

    /// Liquidity minted for a deposit of both legs
    fn liquidity_for(&self, amount0: u64, amount1: u64) -> u64;

    /// Quote a swap of `amount_in`
    fn quote(&self, amount_in: u64) -> CovenantResult<SwapQuote>;
}

/// Fee-only model: one unit in buys one unit out, less the fee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearFeeModel {
    fee_bps: u32,
}

impl LinearFeeModel {
    pub fn new(fee_bps: u32) -> CovenantResult<Self> {
        if u64::from(fee_bps) > BPS_DENOMINATOR {
            return Err(CovenantError::out_of_range("fee_bps", fee_bps));
        }
        Ok(Self { fee_bps })
    }
}

impl PricingModel for LinearFeeModel {
    fn fee_bps(&self) -> u32 {
        self.fee_bps
    }

    fn liquidity_for(&self, amount0: u64, amount1: u64) -> u64 {
        liquidity_from_amounts(amount0, amount1)
    }

    fn quote(&self, amount_in: u64) -> CovenantResult<SwapQuote> {
        if amount_in == 0 {
            return Err(CovenantError::out_of_range("amount_in", 0u8));
        }
        swap_output(amount_in, self.fee_bps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_thirty_bps_on_ten_thousand() {
        let quote = swap_output(10_000, 30).unwrap();
        assert_eq!(quote.fee, 30);
        assert_eq!(quote.amount_out, 9_970);
        assert_eq!(quote.effective_fee_rate(), dec!(0.003));
    }

    #[test]
    fn test_fee_truncates_toward_zero() {
        let quote = swap_output(333, 30).unwrap();
        assert_eq!(quote.fee, 0);
        assert_eq!(quote.amount_out, 333);
    }

    #[test]
    fn test_fee_cap() {
        assert_eq!(swap_output(500, 10_000).unwrap().amount_out, 0);
        assert!(swap_output(500, 10_001).is_err());
        assert!(LinearFeeModel::new(10_001).is_err());
    }

    #[test]
    fn test_zero_input_out_of_range() {
        let model = LinearFeeModel::new(30).unwrap();
        assert!(matches!(
            model.quote(0),
            Err(CovenantError::OutOfRange { field: "amount_in", .. })
        ));
    }

    #[test]
    fn test_liquidity_is_smaller_leg() {
        assert_eq!(liquidity_from_amounts(1_000, 400), 400);
        assert_eq!(liquidity_from_amounts(0, 400), 0);
    }

    #[test]
    fn test_max_input_does_not_overflow() {
        let quote = swap_output(u64::MAX, 10_000).unwrap();
        assert_eq!(quote.fee, u64::MAX);
    }
}

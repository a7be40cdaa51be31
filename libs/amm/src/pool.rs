//! Pool ledger: successor pool state for each liquidity operation
//!
//! Token 0 is the native unit, token 1 the quote category. The pool state
//! tracks reserves and fee growth only; swap fees sit outside the tracked
//! reserves as a fee pot the covenant reads from the registry balance.

use facet_codec::{range, FeeCheckpoint, PoolState, Position};
use facet_types::{CovenantError, CovenantResult};
use tracing::debug;

use crate::fees::{fees_owed, growth_increment};
use crate::pricing::{PricingModel, SwapQuote};
use crate::ticks::TickDomain;

/// Outcome of adding liquidity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deposit {
    pub state: PoolState,
    pub position: Position,
    pub checkpoint: FeeCheckpoint,
    pub amount0: u64,
    pub amount1: u64,
}

/// Outcome of removing a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdrawal {
    pub state: PoolState,
    /// Proportional share of the tracked reserves
    pub amount0: u64,
    pub amount1: u64,
    /// Uncollected fees, paid from the fee pot
    pub fees0: u64,
    pub fees1: u64,
}

impl Withdrawal {
    pub fn total0(&self) -> CovenantResult<u64> {
        add("payout0", self.amount0, self.fees0)
    }

    pub fn total1(&self) -> CovenantResult<u64> {
        add("payout1", self.amount1, self.fees1)
    }
}

/// Outcome of a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOutcome {
    pub state: PoolState,
    pub quote: SwapQuote,
    pub zero_for_one: bool,
}

/// Outcome of collecting fees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    pub checkpoint: FeeCheckpoint,
    pub fees0: u64,
    pub fees1: u64,
}

/// Pool accounting over a pricing model and a tick domain
#[derive(Debug, Clone)]
pub struct PoolLedger<M> {
    model: M,
    domain: TickDomain,
}

fn add(field: &'static str, a: u64, b: u64) -> CovenantResult<u64> {
    range::amount(field, u128::from(a) + u128::from(b))
}

fn share(amount: u64, liquidity: u64, total: u64) -> u64 {
    // liquidity <= total, so the quotient never exceeds amount
    let scaled = u128::from(amount) * u128::from(liquidity) / u128::from(total);
    u64::try_from(scaled).unwrap_or(amount)
}

impl<M: PricingModel> PoolLedger<M> {
    pub fn new(model: M, domain: TickDomain) -> Self {
        Self { model, domain }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn domain(&self) -> &TickDomain {
        &self.domain
    }

    /// Deposit both legs into `[tick_lower, tick_upper)`
    ///
    /// Ticks are checked before amounts, so a bad range fails with
    /// `InvalidTickRange` whatever the deposit.
    pub fn add_liquidity(
        &self,
        state: &PoolState,
        amount0: u64,
        amount1: u64,
        tick_lower: i32,
        tick_upper: i32,
    ) -> CovenantResult<Deposit> {
        self.domain.validate_range(tick_lower, tick_upper)?;

        let liquidity = self.model.liquidity_for(amount0, amount1);
        if liquidity == 0 {
            return Err(CovenantError::out_of_range("liquidity", 0u8));
        }

        let next = PoolState {
            reserve0: add("reserve0", state.reserve0, amount0)?,
            reserve1: add("reserve1", state.reserve1, amount1)?,
            liquidity: add("liquidity", state.liquidity, liquidity)?,
            ..*state
        };
        let position = Position {
            tick_lower,
            tick_upper,
            liquidity,
        };
        let checkpoint = FeeCheckpoint::for_position(&position, state.fee_growth0, state.fee_growth1);

        debug!(
            amount0,
            amount1,
            liquidity,
            tick_lower,
            tick_upper,
            "Liquidity added"
        );

        Ok(Deposit {
            state: next,
            position,
            checkpoint,
            amount0,
            amount1,
        })
    }

    /// Burn a position, returning its reserve share plus uncollected fees
    pub fn remove_liquidity(
        &self,
        state: &PoolState,
        position: &Position,
        checkpoint: &FeeCheckpoint,
    ) -> CovenantResult<Withdrawal> {
        if !checkpoint.matches(position) {
            return Err(CovenantError::invalid(
                "fee checkpoint does not belong to the position",
            ));
        }
        if position.liquidity == 0 || position.liquidity > state.liquidity {
            return Err(CovenantError::invalid(format!(
                "position liquidity {} exceeds pool liquidity {}",
                position.liquidity, state.liquidity
            )));
        }

        let (amount0, amount1) = if position.liquidity == state.liquidity {
            (state.reserve0, state.reserve1)
        } else {
            (
                share(state.reserve0, position.liquidity, state.liquidity),
                share(state.reserve1, position.liquidity, state.liquidity),
            )
        };
        let fees0 = fees_owed(
            "fees0",
            position.liquidity,
            state.fee_growth0,
            checkpoint.fee_growth0,
        )?;
        let fees1 = fees_owed(
            "fees1",
            position.liquidity,
            state.fee_growth1,
            checkpoint.fee_growth1,
        )?;

        let next = PoolState {
            reserve0: state.reserve0 - amount0,
            reserve1: state.reserve1 - amount1,
            liquidity: state.liquidity - position.liquidity,
            ..*state
        };

        debug!(
            liquidity = position.liquidity,
            amount0, amount1, fees0, fees1, "Liquidity removed"
        );

        Ok(Withdrawal {
            state: next,
            amount0,
            amount1,
            fees0,
            fees1,
        })
    }

    /// Swap `amount_in` of one leg for the other
    ///
    /// The net input joins the input reserve, the fee joins the fee pot and
    /// raises fee growth on the input leg.
    pub fn swap(
        &self,
        state: &PoolState,
        zero_for_one: bool,
        amount_in: u64,
        min_amount_out: u64,
    ) -> CovenantResult<SwapOutcome> {
        let quote = self.model.quote(amount_in)?;

        let reserve_out = if zero_for_one {
            state.reserve1
        } else {
            state.reserve0
        };
        if state.liquidity == 0 || quote.amount_out > reserve_out {
            return Err(CovenantError::InsufficientReserve {
                available: if state.liquidity == 0 { 0 } else { reserve_out },
                required: quote.amount_out,
            });
        }
        if quote.amount_out < min_amount_out {
            return Err(CovenantError::SlippageExceeded {
                amount_out: quote.amount_out,
                min_amount_out,
            });
        }

        let net_in = quote.amount_in.checked_sub(quote.fee).ok_or_else(|| {
            CovenantError::invalid(format!(
                "swap fee {} exceeds input {}",
                quote.fee, quote.amount_in
            ))
        })?;

        let mut next = *state;
        if zero_for_one {
            next.reserve0 = add("reserve0", state.reserve0, net_in)?;
            next.reserve1 = state.reserve1 - quote.amount_out;
            let growth = growth_increment("fee_growth0", quote.fee, state.liquidity)?;
            next.fee_growth0 = state.fee_growth0.wrapping_add(growth);
        } else {
            next.reserve1 = add("reserve1", state.reserve1, net_in)?;
            next.reserve0 = state.reserve0 - quote.amount_out;
            let growth = growth_increment("fee_growth1", quote.fee, state.liquidity)?;
            next.fee_growth1 = state.fee_growth1.wrapping_add(growth);
        }

        debug!(
            zero_for_one,
            amount_in,
            amount_out = quote.amount_out,
            fee = quote.fee,
            fee_rate = %quote.effective_fee_rate(),
            "Swap quoted"
        );

        Ok(SwapOutcome {
            state: next,
            quote,
            zero_for_one,
        })
    }

    /// Fees owed since the checkpoint, and the advanced checkpoint
    pub fn collect(
        &self,
        state: &PoolState,
        position: &Position,
        checkpoint: &FeeCheckpoint,
    ) -> CovenantResult<Collection> {
        if !checkpoint.matches(position) {
            return Err(CovenantError::invalid(
                "fee checkpoint does not belong to the position",
            ));
        }
        let fees0 = fees_owed(
            "fees0",
            position.liquidity,
            state.fee_growth0,
            checkpoint.fee_growth0,
        )?;
        let fees1 = fees_owed(
            "fees1",
            position.liquidity,
            state.fee_growth1,
            checkpoint.fee_growth1,
        )?;
        Ok(Collection {
            checkpoint: FeeCheckpoint::for_position(position, state.fee_growth0, state.fee_growth1),
            fees0,
            fees1,
        })
    }
}

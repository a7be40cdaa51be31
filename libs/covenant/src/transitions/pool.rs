//! Pool liquidity, swaps and fee collection
//!
//! The pool registry's native value is its dust, reserve0 and the native fee
//! pot. The quote vault holds reserve1 and the quote fee pot. The pool state
//! token tracks the reserves, so each pot is whatever sits above them.

use facet_codec::{Facet, FeeCheckpoint, PoolState, Position, RegistryEntry};
use facet_types::{CovenantError, CovenantResult, Destination};
use tracing::debug;

use crate::draft::{total, Context, TransitionDraft};
use crate::tokens::{Held, InputSet};

struct PoolInputs {
    registry: Held<RegistryEntry>,
    state: Held<PoolState>,
    vault: Option<Held<u64>>,
}

impl PoolInputs {
    fn take(inputs: &mut InputSet) -> CovenantResult<Self> {
        let registry = inputs.registry(Facet::Pool)?;
        registry.ensure_active()?;
        Ok(Self {
            registry,
            state: inputs.state()?,
            vault: inputs.quote_vault(),
        })
    }

    fn vault_balance(&self) -> u64 {
        self.vault.as_ref().map_or(0, |held| held.value)
    }

    /// Fee pots above the tracked reserves
    fn pots(&self, cx: &Context<'_>) -> CovenantResult<(u64, u64)> {
        let reserve0 = cx.reserve_of(&self.registry);
        let reserve1 = self.vault_balance();
        let pot0 = reserve0.checked_sub(self.state.value.reserve0);
        let pot1 = reserve1.checked_sub(self.state.value.reserve1);
        match (pot0, pot1) {
            (Some(pot0), Some(pot1)) => Ok((pot0, pot1)),
            _ => Err(CovenantError::invalid(format!(
                "pool balances ({}, {}) below tracked reserves ({}, {})",
                reserve0, reserve1, self.state.value.reserve0, self.state.value.reserve1
            ))),
        }
    }

    /// Consume registry, state and vault; recreate them moved by the given deltas
    fn settle(
        &self,
        cx: &Context<'_>,
        draft: &mut TransitionDraft,
        next: &PoolState,
        native: i128,
        quote: i128,
    ) -> CovenantResult<()> {
        draft.move_reserve(cx, &self.registry, native)?;
        draft.move_vault(cx, self.vault.as_ref(), quote)?;
        draft.spend(&self.state);
        draft.emit(cx.state_output(Facet::Pool, next, Destination::Covenant));
        Ok(())
    }
}

fn ensure_pot(pot: u64, owed: u64) -> CovenantResult<()> {
    if owed > pot {
        return Err(CovenantError::InsufficientReserve {
            available: pot,
            required: owed,
        });
    }
    Ok(())
}

/// Deposit `amount0` native and `amount1` quote into `[tick_lower, tick_upper)`
pub fn add_liquidity(
    cx: &Context<'_>,
    inputs: &mut InputSet,
    amount0: u64,
    amount1: u64,
    tick_lower: i32,
    tick_upper: i32,
    holder: Destination,
) -> CovenantResult<TransitionDraft> {
    let ledger = &cx.deployment.params.pool;
    ledger.domain().validate_range(tick_lower, tick_upper)?;

    let pool = PoolInputs::take(inputs)?;
    pool.pots(cx)?;
    let deposit = ledger.add_liquidity(&pool.state.value, amount0, amount1, tick_lower, tick_upper)?;

    let mut draft = TransitionDraft::new();
    pool.settle(
        cx,
        &mut draft,
        &deposit.state,
        i128::from(amount0),
        i128::from(amount1),
    )?;
    draft.emit(cx.state_output(Facet::Pool, &deposit.position, holder.clone()));
    draft.emit(cx.state_output(Facet::Pool, &deposit.checkpoint, holder));
    Ok(draft)
}

/// Burn a position and its checkpoint for the reserve share plus uncollected fees
pub fn remove_liquidity(
    cx: &Context<'_>,
    inputs: &mut InputSet,
    payout: Destination,
) -> CovenantResult<TransitionDraft> {
    let pool = PoolInputs::take(inputs)?;
    let position: Held<Position> = inputs.state()?;
    let checkpoint: Held<FeeCheckpoint> = inputs.state()?;
    let (pot0, pot1) = pool.pots(cx)?;

    let withdrawal = cx.deployment.params.pool.remove_liquidity(
        &pool.state.value,
        &position.value,
        &checkpoint.value,
    )?;
    ensure_pot(pot0, withdrawal.fees0)?;
    ensure_pot(pot1, withdrawal.fees1)?;
    let total0 = withdrawal.total0()?;
    let total1 = withdrawal.total1()?;

    let mut draft = TransitionDraft::new();
    pool.settle(
        cx,
        &mut draft,
        &withdrawal.state,
        -i128::from(total0),
        -i128::from(total1),
    )?;
    draft.spend(&position);
    draft.spend(&checkpoint);
    draft.pay(
        cx,
        payout,
        total("payout", &[total0, position.attached(), checkpoint.attached()])?,
        total1,
    );
    Ok(draft)
}

/// Swap `amount_in` of one leg for the other, fee retained by the pool
pub fn swap(
    cx: &Context<'_>,
    inputs: &mut InputSet,
    zero_for_one: bool,
    amount_in: u64,
    min_amount_out: u64,
    recipient: Destination,
) -> CovenantResult<TransitionDraft> {
    let pool = PoolInputs::take(inputs)?;
    pool.pots(cx)?;
    let outcome = cx.deployment.params.pool.swap(
        &pool.state.value,
        zero_for_one,
        amount_in,
        min_amount_out,
    )?;
    let amount_in = i128::from(outcome.quote.amount_in);
    let amount_out = outcome.quote.amount_out;

    let mut draft = TransitionDraft::new();
    if zero_for_one {
        pool.settle(cx, &mut draft, &outcome.state, amount_in, -i128::from(amount_out))?;
        draft.pay(cx, recipient, 0, amount_out);
    } else {
        pool.settle(cx, &mut draft, &outcome.state, -i128::from(amount_out), amount_in)?;
        draft.pay(cx, recipient, amount_out, 0);
    }
    debug!(
        zero_for_one,
        amount_out,
        fee = outcome.quote.fee,
        "Swap drafted"
    );
    Ok(draft)
}

/// Pay fees earned since the checkpoint and advance it; the position is untouched
pub fn collect(
    cx: &Context<'_>,
    inputs: &mut InputSet,
    payout: Destination,
) -> CovenantResult<TransitionDraft> {
    let pool = PoolInputs::take(inputs)?;
    let position: Held<Position> = inputs.state()?;
    let checkpoint: Held<FeeCheckpoint> = inputs.state()?;
    let (pot0, pot1) = pool.pots(cx)?;

    let collection =
        cx.deployment
            .params
            .pool
            .collect(&pool.state.value, &position.value, &checkpoint.value)?;
    ensure_pot(pot0, collection.fees0)?;
    ensure_pot(pot1, collection.fees1)?;

    let mut draft = TransitionDraft::new();
    pool.settle(
        cx,
        &mut draft,
        &pool.state.value,
        -i128::from(collection.fees0),
        -i128::from(collection.fees1),
    )?;
    draft.spend(&position);
    draft.spend(&checkpoint);
    draft.emit(cx.state_output(
        Facet::Pool,
        &position.value,
        position.utxo.output.destination.clone(),
    ));
    draft.emit(cx.state_output(
        Facet::Pool,
        &collection.checkpoint,
        checkpoint.utxo.output.destination.clone(),
    ));
    draft.pay(cx, payout, collection.fees0, collection.fees1);
    Ok(draft)
}

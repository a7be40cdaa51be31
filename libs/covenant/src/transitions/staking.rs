//! Stake and unstake

use facet_codec::{Facet, RegistryEntry, StakeReceipt};
use facet_types::{CovenantError, CovenantResult, Destination};

use crate::draft::{total, Context, TransitionDraft};
use crate::tokens::{Held, InputSet};

/// Lock `amount` in the staking reserve and mint a receipt for it
pub fn stake(
    cx: &Context<'_>,
    inputs: &mut InputSet,
    amount: u64,
    holder: Destination,
) -> CovenantResult<TransitionDraft> {
    let minimum = cx.deployment.params.min_stake;
    if amount < minimum {
        return Err(CovenantError::BelowMinimum {
            field: "stake",
            amount,
            minimum,
        });
    }
    let registry: Held<RegistryEntry> = inputs.registry(Facet::Staking)?;
    registry.ensure_active()?;

    let mut draft = TransitionDraft::new();
    draft.move_reserve(cx, &registry, i128::from(amount))?;
    draft.emit(cx.state_output(Facet::Staking, &StakeReceipt { amount }, holder));
    Ok(draft)
}

/// Burn a receipt and pay its amount out of the staking reserve
pub fn unstake(
    cx: &Context<'_>,
    inputs: &mut InputSet,
    payout: Destination,
) -> CovenantResult<TransitionDraft> {
    let registry = inputs.registry(Facet::Staking)?;
    registry.ensure_active()?;
    let receipt: Held<StakeReceipt> = inputs.state()?;
    let amount = receipt.value.amount;
    cx.ensure_reserve(&registry, amount)?;

    let mut draft = TransitionDraft::new();
    draft.move_reserve(cx, &registry, -i128::from(amount))?;
    draft.spend(&receipt);
    draft.pay(cx, payout, total("payout", &[amount, receipt.attached()])?, 0);
    Ok(draft)
}

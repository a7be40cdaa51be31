//! Principal / yield tranching: split, merge, redeem, claim
//!
//! A receipt of principal P splits into PT(P, E) and YT(0, E). The staked
//! principal moves from the staking reserve into the principal reserve; the
//! yield reserve is funded separately and pays YT holders.

use facet_codec::{Facet, PrincipalToken, StakeReceipt, YieldToken};
use facet_config::MergePolicy;
use facet_types::{CovenantError, CovenantResult, Destination};
use tracing::warn;

use crate::draft::{total, Context, TransitionDraft};
use crate::tokens::{Held, InputSet};

/// Split a receipt into a principal token and a yield token expiring at `expiry`
pub fn split(
    cx: &Context<'_>,
    inputs: &mut InputSet,
    expiry: u32,
    holder: Destination,
) -> CovenantResult<TransitionDraft> {
    let schedule = &cx.deployment.params.schedule;
    if !schedule.admits_split(expiry, cx.now) {
        return Err(CovenantError::invalid(format!(
            "expiry {} leaves less than the {}s yield term after {}",
            expiry, schedule.term, cx.now
        )));
    }

    let staking = inputs.registry(Facet::Staking)?;
    let principal = inputs.registry(Facet::Principal)?;
    let yield_registry = inputs.registry(Facet::Yield)?;
    for registry in [&staking, &principal, &yield_registry] {
        registry.ensure_active()?;
    }
    let receipt: Held<StakeReceipt> = inputs.state()?;
    let amount = receipt.value.amount;
    cx.ensure_reserve(&staking, amount)?;

    let mut draft = TransitionDraft::new();
    draft.spend(&receipt);
    draft.move_reserve(cx, &staking, -i128::from(amount))?;
    draft.move_reserve(cx, &principal, i128::from(amount))?;
    draft.move_reserve(cx, &yield_registry, 0)?;
    draft.emit(cx.state_output(
        Facet::Principal,
        &PrincipalToken {
            principal: amount,
            expiry,
        },
        holder.clone(),
    ));
    draft.emit(cx.state_output(
        Facet::Yield,
        &YieldToken { accrued: 0, expiry },
        holder,
    ));
    Ok(draft)
}

/// Recombine a PT/YT pair of equal expiry into a receipt
pub fn merge(
    cx: &Context<'_>,
    inputs: &mut InputSet,
    holder: Destination,
) -> CovenantResult<TransitionDraft> {
    let pt: Held<PrincipalToken> = inputs.state()?;
    let yt: Held<YieldToken> = inputs.state()?;
    if pt.value.expiry != yt.value.expiry {
        return Err(CovenantError::IncompatibleExpiry {
            principal_expiry: pt.value.expiry,
            yield_expiry: yt.value.expiry,
        });
    }

    let principal = inputs.registry(Facet::Principal)?;
    let staking = inputs.registry(Facet::Staking)?;
    let yield_registry = inputs.registry(Facet::Yield)?;
    for registry in [&principal, &staking, &yield_registry] {
        registry.ensure_active()?;
    }
    let amount = pt.value.principal;
    cx.ensure_reserve(&principal, amount)?;

    let accrued = cx.deployment.params.schedule.claimable(&yt.value, cx.now)?;
    let paid = match cx.deployment.params.merge_policy {
        MergePolicy::Payout => {
            cx.ensure_reserve(&yield_registry, accrued)?;
            accrued
        }
        MergePolicy::Forfeit => {
            if accrued > 0 {
                warn!(
                    accrued,
                    expiry = yt.value.expiry,
                    "Accrued yield forfeited on merge"
                );
            }
            0
        }
        MergePolicy::Reject if accrued > 0 => {
            return Err(CovenantError::UnclaimedYield { accrued });
        }
        MergePolicy::Reject => 0,
    };

    let mut draft = TransitionDraft::new();
    draft.spend(&pt);
    draft.spend(&yt);
    draft.move_reserve(cx, &principal, -i128::from(amount))?;
    draft.move_reserve(cx, &staking, i128::from(amount))?;
    draft.move_reserve(cx, &yield_registry, -i128::from(paid))?;
    draft.emit(cx.state_output(Facet::Staking, &StakeReceipt { amount }, holder.clone()));
    draft.pay(
        cx,
        holder,
        total("payout", &[paid, pt.attached(), yt.attached()])?,
        0,
    );
    Ok(draft)
}

/// Burn a matured principal token for its principal
pub fn redeem_principal(
    cx: &Context<'_>,
    inputs: &mut InputSet,
    payout: Destination,
) -> CovenantResult<TransitionDraft> {
    let pt: Held<PrincipalToken> = inputs.state()?;
    if cx.now < pt.value.expiry {
        return Err(CovenantError::NotYetMatured {
            now: cx.now,
            expiry: pt.value.expiry,
        });
    }
    let registry = inputs.registry(Facet::Principal)?;
    registry.ensure_active()?;
    let amount = pt.value.principal;
    cx.ensure_reserve(&registry, amount)?;

    let mut draft = TransitionDraft::new();
    draft.spend(&pt);
    draft.move_reserve(cx, &registry, -i128::from(amount))?;
    draft.pay(cx, payout, total("payout", &[amount, pt.attached()])?, 0);
    Ok(draft)
}

/// Record accrued yield before expiry; pay it out and burn the token after
pub fn claim_yield(
    cx: &Context<'_>,
    inputs: &mut InputSet,
    holder: Destination,
) -> CovenantResult<TransitionDraft> {
    let yt: Held<YieldToken> = inputs.state()?;
    let registry = inputs.registry(Facet::Yield)?;
    registry.ensure_active()?;
    let accrued = cx.deployment.params.schedule.claimable(&yt.value, cx.now)?;
    let mut draft = TransitionDraft::new();
    draft.spend(&yt);

    if cx.now < yt.value.expiry {
        // rewriting an immutable commitment needs the minting token present
        draft.move_reserve(cx, &registry, 0)?;
        draft.emit(cx.state_output(
            Facet::Yield,
            &YieldToken {
                accrued,
                expiry: yt.value.expiry,
            },
            holder,
        ));
        return Ok(draft);
    }

    cx.ensure_reserve(&registry, accrued)?;
    draft.move_reserve(cx, &registry, -i128::from(accrued))?;
    draft.pay(cx, holder, total("payout", &[accrued, yt.attached()])?, 0);
    Ok(draft)
}

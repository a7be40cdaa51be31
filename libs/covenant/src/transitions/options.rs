//! Option writing, exercise and expiry
//!
//! Collateral `C` per contract sits in the options reserve. Exercise pays the
//! holder a share of `C` proportional to how far the oracle price is in the
//! money; expiry returns `C` to the writer. For a given token, time and price
//! at most one of the two applies.

use facet_codec::{Facet, OptionContract, PriceFeed};
use facet_types::{CovenantError, CovenantResult, Destination};
use tracing::debug;

use crate::auth::{verify_admin, AdminAction, AdminAuthorization};
use crate::draft::{total, Context, TransitionDraft};
use crate::tokens::{Held, InputSet};

/// Whether `price` is in the money for `option`
pub fn in_the_money(option: &OptionContract, price: u64) -> bool {
    let strike = u64::from(option.strike);
    if option.is_call {
        price > strike
    } else {
        price < strike
    }
}

/// Holder's share of `collateral` at `price`; zero when out of the money
pub fn payoff(option: &OptionContract, price: u64, collateral: u64) -> u64 {
    if !in_the_money(option, price) {
        return 0;
    }
    let strike = u64::from(option.strike);
    let (gain, base) = if option.is_call {
        (price - strike, price)
    } else {
        (strike - price, strike)
    };
    let share = u128::from(collateral) * u128::from(gain) / u128::from(base);
    // gain < base, so the share never exceeds the collateral
    u64::try_from(share).unwrap_or(collateral)
}

/// Read the oracle feed, rejecting unpublished or stale prices
fn fresh_price(cx: &Context<'_>, feed: &PriceFeed) -> CovenantResult<u64> {
    let max_age = cx.deployment.params.max_price_age;
    let age = cx.now.saturating_sub(feed.published_at);
    if feed.price == 0 || age > max_age {
        return Err(CovenantError::StalePrice {
            published_at: feed.published_at,
            now: cx.now,
            max_age,
        });
    }
    Ok(feed.price)
}

/// Consume the feed and recreate it unchanged
fn reread_feed(cx: &Context<'_>, draft: &mut TransitionDraft, feed: &Held<PriceFeed>) {
    draft.spend(feed);
    draft.emit(cx.state_output(Facet::Oracle, &feed.value, Destination::Covenant));
}

/// Mint an option against locked collateral; the operator signs as writer
pub fn write_option(
    cx: &Context<'_>,
    inputs: &mut InputSet,
    option: OptionContract,
    holder: Destination,
    auth: &AdminAuthorization,
) -> CovenantResult<TransitionDraft> {
    let registry = inputs.registry(Facet::Options)?;
    registry.ensure_active()?;
    verify_admin(
        &cx.deployment.admin_key,
        auth,
        &registry.utxo.outpoint,
        &AdminAction::WriteOption {
            option,
            holder: holder.clone(),
        },
    )?;

    if option.asset != cx.deployment.oracle_asset {
        return Err(CovenantError::CategoryMismatch {
            expected: cx.deployment.oracle_asset,
            found: option.asset,
        });
    }
    if option.strike == 0 {
        return Err(CovenantError::out_of_range("strike", 0u8));
    }
    if option.expiry <= cx.now {
        return Err(CovenantError::Expired {
            now: cx.now,
            expiry: option.expiry,
        });
    }

    let collateral = cx.deployment.params.collateral_per_contract;
    let mut draft = TransitionDraft::new();
    draft.move_reserve(cx, &registry, i128::from(collateral))?;
    draft.emit(cx.state_output(Facet::Options, &option, holder));
    debug!(
        strike = option.strike,
        expiry = option.expiry,
        is_call = option.is_call,
        collateral,
        "Option written"
    );
    Ok(draft)
}

/// Exercise an in-the-money option before expiry
pub fn exercise(
    cx: &Context<'_>,
    inputs: &mut InputSet,
    payout: Destination,
) -> CovenantResult<TransitionDraft> {
    let option: Held<OptionContract> = inputs.state()?;
    if cx.now >= option.value.expiry {
        return Err(CovenantError::Expired {
            now: cx.now,
            expiry: option.value.expiry,
        });
    }
    let feed: Held<PriceFeed> = inputs.state()?;
    let price = fresh_price(cx, &feed.value)?;
    if !in_the_money(&option.value, price) {
        return Err(CovenantError::OutOfTheMoney {
            strike: option.value.strike,
            price,
        });
    }
    let registry = inputs.registry(Facet::Options)?;
    registry.ensure_active()?;
    let collateral = cx.deployment.params.collateral_per_contract;
    cx.ensure_reserve(&registry, collateral)?;
    let owed = payoff(&option.value, price, collateral);

    let mut draft = TransitionDraft::new();
    draft.spend(&option);
    draft.move_reserve(cx, &registry, -i128::from(collateral))?;
    reread_feed(cx, &mut draft, &feed);
    draft.pay(cx, payout, total("payout", &[owed, option.attached()])?, 0);
    draft.pay(cx, cx.deployment.params.writer.clone(), collateral - owed, 0);
    Ok(draft)
}

/// Return collateral to the writer for an option that expired out of the money
pub fn expire(cx: &Context<'_>, inputs: &mut InputSet) -> CovenantResult<TransitionDraft> {
    let option: Held<OptionContract> = inputs.state()?;
    if cx.now < option.value.expiry {
        return Err(CovenantError::NotYetMatured {
            now: cx.now,
            expiry: option.value.expiry,
        });
    }
    let feed: Held<PriceFeed> = inputs.state()?;
    let price = fresh_price(cx, &feed.value)?;
    if in_the_money(&option.value, price) {
        return Err(CovenantError::InTheMoney {
            strike: option.value.strike,
            price,
        });
    }
    let registry = inputs.registry(Facet::Options)?;
    registry.ensure_active()?;
    let collateral = cx.deployment.params.collateral_per_contract;
    cx.ensure_reserve(&registry, collateral)?;

    let mut draft = TransitionDraft::new();
    draft.spend(&option);
    draft.move_reserve(cx, &registry, -i128::from(collateral))?;
    reread_feed(cx, &mut draft, &feed);
    draft.pay(
        cx,
        cx.deployment.params.writer.clone(),
        total("payout", &[collateral, option.attached()])?,
        0,
    );
    Ok(draft)
}

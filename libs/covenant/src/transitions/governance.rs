//! Deployment, upgrades, pausing, oracle updates and reserve top-ups

use facet_codec::{Facet, PoolState, PriceFeed, RegistryEntry};
use facet_types::{CategoryId, CodeHash, CovenantError, CovenantResult, Destination};
use tracing::info;

use crate::auth::{verify_admin, AdminAction, AdminAuthorization};
use crate::draft::{Context, TransitionDraft};
use crate::tokens::{Held, InputSet};

/// Genesis of a facet category
///
/// The category id must equal the txid spent by the transaction's first
/// input, which must be output 0 of that transaction, and the admin signature
/// binds that outpoint.
pub fn deploy(
    cx: &Context<'_>,
    facet: Facet,
    code_hash: CodeHash,
    auth: &AdminAuthorization,
) -> CovenantResult<TransitionDraft> {
    let anchor = cx
        .anchor
        .ok_or_else(|| CovenantError::MissingInput("genesis funding input".to_string()))?;
    let category = cx.deployment.category(facet);
    let genesis = CategoryId::from(anchor.txid);
    if genesis != category {
        return Err(CovenantError::CategoryMismatch {
            expected: category,
            found: genesis,
        });
    }
    if anchor.vout != 0 {
        return Err(CovenantError::invalid(format!(
            "genesis must spend output 0 of {}, not output {}",
            anchor.txid, anchor.vout
        )));
    }
    verify_admin(
        &cx.deployment.admin_key,
        auth,
        &anchor,
        &AdminAction::Deploy { facet, code_hash },
    )?;

    let mut draft = TransitionDraft::new();
    draft.emit(cx.registry_output(&RegistryEntry::genesis(facet, code_hash), cx.dust()));
    match facet {
        Facet::Pool => {
            draft.emit(cx.state_output(Facet::Pool, &PoolState::default(), Destination::Covenant))
        }
        Facet::Oracle => draft.emit(cx.state_output(
            Facet::Oracle,
            &PriceFeed {
                price: 0,
                published_at: cx.now,
            },
            Destination::Covenant,
        )),
        _ => {}
    }
    info!(facet = %facet, category = %category, "Facet deployed");
    Ok(draft)
}

/// Commit the registry to new covenant code; versions strictly increase
pub fn upgrade(
    cx: &Context<'_>,
    inputs: &mut InputSet,
    facet: Facet,
    code_hash: CodeHash,
    version: u16,
    auth: &AdminAuthorization,
) -> CovenantResult<TransitionDraft> {
    let registry = inputs.registry(facet)?;
    verify_admin(
        &cx.deployment.admin_key,
        auth,
        &registry.utxo.outpoint,
        &AdminAction::Upgrade {
            facet,
            code_hash,
            version,
        },
    )?;
    if version <= registry.value.version {
        return Err(CovenantError::invalid(format!(
            "{} version {} does not follow {}",
            facet, version, registry.value.version
        )));
    }

    let entry = RegistryEntry {
        code_hash,
        version,
        ..registry.value
    };
    let mut draft = TransitionDraft::new();
    draft.replace_registry(cx, &registry, entry, 0)?;
    info!(facet = %facet, version, "Facet upgraded");
    Ok(draft)
}

/// Pause or resume a facet
pub fn set_paused(
    cx: &Context<'_>,
    inputs: &mut InputSet,
    facet: Facet,
    paused: bool,
    auth: &AdminAuthorization,
) -> CovenantResult<TransitionDraft> {
    let registry = inputs.registry(facet)?;
    verify_admin(
        &cx.deployment.admin_key,
        auth,
        &registry.utxo.outpoint,
        &AdminAction::SetPaused { facet, paused },
    )?;

    let entry = RegistryEntry {
        paused,
        ..registry.value
    };
    let mut draft = TransitionDraft::new();
    draft.replace_registry(cx, &registry, entry, 0)?;
    info!(facet = %facet, paused, "Facet pause flag set");
    Ok(draft)
}

/// Publish a new oracle price at the current time
///
/// The oracle registry is recreated alongside the feed.
pub fn update_price(
    cx: &Context<'_>,
    inputs: &mut InputSet,
    price: u64,
    auth: &AdminAuthorization,
) -> CovenantResult<TransitionDraft> {
    let feed: Held<PriceFeed> = inputs.state()?;
    let registry = inputs.registry(Facet::Oracle)?;
    let next = PriceFeed {
        price,
        published_at: cx.now,
    };
    verify_admin(
        &cx.deployment.admin_key,
        auth,
        &feed.utxo.outpoint,
        &AdminAction::UpdatePrice {
            price,
            published_at: next.published_at,
        },
    )?;
    if price == 0 {
        return Err(CovenantError::out_of_range("price", 0u8));
    }
    if next.published_at < feed.value.published_at {
        return Err(CovenantError::invalid(format!(
            "price published at {} predates the current feed at {}",
            next.published_at, feed.value.published_at
        )));
    }

    let mut draft = TransitionDraft::new();
    draft.spend(&feed);
    draft.move_reserve(cx, &registry, 0)?;
    draft.emit(cx.state_output(Facet::Oracle, &next, Destination::Covenant));
    Ok(draft)
}

/// Top up a facet reserve; anyone may fund, except the pool
pub fn fund_reserve(
    cx: &Context<'_>,
    inputs: &mut InputSet,
    facet: Facet,
    amount: u64,
) -> CovenantResult<TransitionDraft> {
    if facet == Facet::Pool {
        return Err(CovenantError::invalid(
            "pool reserves only change through liquidity operations",
        ));
    }
    if amount == 0 {
        return Err(CovenantError::out_of_range("amount", 0u8));
    }
    let registry = inputs.registry(facet)?;
    registry.ensure_active()?;

    let mut draft = TransitionDraft::new();
    draft.move_reserve(cx, &registry, i128::from(amount))?;
    Ok(draft)
}

//! Category / authorization guard
//!
//! Checks a complete transaction without trusting how it was built:
//!
//! 1. every facet token decodes and belongs to its facet's category
//! 2. supply of a facet category changes, and its state commitments are
//!    rewritten, only with its registry token consumed and recreated (or
//!    created at genesis)
//! 3. state tokens carry exactly the dust value; registries, pool state and
//!    price feeds stay locked by the covenant
//! 4. native value and every fungible category are conserved
//! 5. each registry (and the quote vault) moves by exactly its declared delta
//!
//! Admin signatures are checked by the transitions that need them, see
//! [`crate::auth`].

use std::collections::BTreeMap;

use facet_codec::{Commitment, Facet};
use facet_types::{CategoryId, CovenantError, CovenantResult, Output, Transaction};
use tracing::debug;

use crate::deployment::Deployment;
use crate::draft::ReserveDelta;
use crate::tokens::{classify, TokenClass};

#[derive(Debug, Default)]
struct FacetTally {
    registries_in: Vec<u64>,
    registries_out: Vec<u64>,
    state_in: Vec<Vec<u8>>,
    state_out: Vec<Vec<u8>>,
}

#[derive(Debug, Default)]
struct Tally {
    facets: BTreeMap<Facet, FacetTally>,
    vault_in: Vec<u64>,
    vault_out: Vec<u64>,
}

fn must_be_covenant_locked(commitment: &Commitment) -> bool {
    matches!(
        commitment,
        Commitment::PoolState(_) | Commitment::PriceFeed(_)
    )
}

fn commitment_bytes(output: &Output) -> Vec<u8> {
    output
        .nft()
        .map(|nft| nft.commitment.clone())
        .unwrap_or_default()
}

fn tally(deployment: &Deployment, tx: &Transaction) -> CovenantResult<Tally> {
    let mut tally = Tally::default();

    for utxo in &tx.inputs {
        match classify(deployment, &utxo.output)? {
            TokenClass::Registry { facet, .. } => tally
                .facets
                .entry(facet)
                .or_default()
                .registries_in
                .push(utxo.output.value),
            TokenClass::State { facet, .. } => tally
                .facets
                .entry(facet)
                .or_default()
                .state_in
                .push(commitment_bytes(&utxo.output)),
            TokenClass::QuoteVault { amount } => tally.vault_in.push(amount),
            TokenClass::Foreign => {}
        }
    }

    let dust = deployment.params.token_dust;
    for output in &tx.outputs {
        match classify(deployment, output)? {
            TokenClass::Registry { facet, .. } => {
                if !output.destination.is_covenant() {
                    return Err(CovenantError::invalid(format!(
                        "{} registry must stay locked by the covenant",
                        facet
                    )));
                }
                tally
                    .facets
                    .entry(facet)
                    .or_default()
                    .registries_out
                    .push(output.value);
            }
            TokenClass::State { facet, commitment } => {
                if output.value != dust {
                    return Err(CovenantError::invalid(format!(
                        "{} token carries {} instead of the dust value {}",
                        commitment.kind(),
                        output.value,
                        dust
                    )));
                }
                if must_be_covenant_locked(&commitment) && !output.destination.is_covenant() {
                    return Err(CovenantError::invalid(format!(
                        "{} token must stay locked by the covenant",
                        commitment.kind()
                    )));
                }
                tally
                    .facets
                    .entry(facet)
                    .or_default()
                    .state_out
                    .push(commitment_bytes(output));
            }
            TokenClass::QuoteVault { amount } => tally.vault_out.push(amount),
            TokenClass::Foreign => {}
        }
    }
    Ok(tally)
}

fn check_supply(deployment: &Deployment, tx: &Transaction, tally: &Tally) -> CovenantResult<()> {
    let genesis = tx
        .inputs
        .first()
        .filter(|utxo| utxo.outpoint.vout == 0)
        .map(|utxo| CategoryId::from(utxo.outpoint.txid));

    for (facet, counts) in &tally.facets {
        let category = deployment.category(*facet);
        let missing = |reason: &str| CovenantError::MintingAuthorityMissing {
            category,
            reason: reason.to_string(),
        };

        if counts.registries_in.len() > 1 || counts.registries_out.len() > 1 {
            return Err(missing("registry token duplicated"));
        }
        let registry_in = !counts.registries_in.is_empty();
        let registry_out = !counts.registries_out.is_empty();

        if registry_in && !registry_out {
            return Err(missing("registry consumed but not recreated"));
        }
        if registry_out && !registry_in && genesis != Some(category) {
            return Err(missing("registry created outside its genesis transaction"));
        }
        if !registry_out {
            if counts.state_in.len() != counts.state_out.len() {
                return Err(missing(&format!(
                    "supply changes from {} to {} without the registry",
                    counts.state_in.len(),
                    counts.state_out.len()
                )));
            }
            let mut before = counts.state_in.clone();
            let mut after = counts.state_out.clone();
            before.sort_unstable();
            after.sort_unstable();
            if before != after {
                return Err(missing("state commitment rewritten without the registry"));
            }
        }
    }

    let pool_present = tally
        .facets
        .get(&Facet::Pool)
        .is_some_and(|counts| !counts.registries_in.is_empty());
    if tally.vault_in.len() > 1 || tally.vault_out.len() > 1 {
        return Err(CovenantError::invalid("quote vault duplicated"));
    }
    if (!tally.vault_in.is_empty() || !tally.vault_out.is_empty()) && !pool_present {
        return Err(CovenantError::MintingAuthorityMissing {
            category: deployment.category(Facet::Pool),
            reason: "quote vault moved without the pool registry".to_string(),
        });
    }
    Ok(())
}

fn check_conservation(deployment: &Deployment, tx: &Transaction) -> CovenantResult<()> {
    let overflow = || CovenantError::out_of_range_wide("native_total", u128::from(u64::MAX) + 1);
    let inputs = tx.input_value().ok_or_else(overflow)?;
    let outputs = tx.output_value().ok_or_else(overflow)?;
    if outputs.checked_add(tx.fee) != Some(inputs) {
        return Err(CovenantError::ValueMismatch {
            inputs,
            outputs,
            fee: tx.fee,
        });
    }

    let mut balances: BTreeMap<CategoryId, (u128, u128)> = BTreeMap::new();
    let mut record = |output: &Output, side: usize| {
        if let Some(token) = &output.token {
            if deployment.categories.facet_of(&token.category).is_none() {
                let entry = balances.entry(token.category).or_default();
                let slot = if side == 0 { &mut entry.0 } else { &mut entry.1 };
                *slot += u128::from(token.amount);
            }
        }
    };
    tx.inputs.iter().for_each(|utxo| record(&utxo.output, 0));
    tx.outputs.iter().for_each(|output| record(output, 1));

    for (category, (inputs, outputs)) in balances {
        if inputs != outputs {
            return Err(CovenantError::FungibleMismatch {
                category,
                inputs: u64::try_from(inputs).unwrap_or(u64::MAX),
                outputs: u64::try_from(outputs).unwrap_or(u64::MAX),
            });
        }
    }
    Ok(())
}

fn check_delta(
    facet: Facet,
    what: &str,
    before: u64,
    after: u64,
    declared: i128,
) -> CovenantResult<()> {
    let expected = i128::from(before) + declared;
    if expected < 0 {
        return Err(CovenantError::InsufficientReserve {
            available: before,
            required: u64::try_from(-declared).unwrap_or(u64::MAX),
        });
    }
    if i128::from(after) != expected {
        return Err(CovenantError::invalid(format!(
            "{} {} moved from {} to {}, declared change {}",
            facet, what, before, after, declared
        )));
    }
    Ok(())
}

fn check_deltas(
    tally: &Tally,
    deltas: &BTreeMap<Facet, ReserveDelta>,
) -> CovenantResult<()> {
    for (facet, declared) in deltas {
        let counts = tally.facets.get(facet);
        let present = counts
            .is_some_and(|c| !c.registries_in.is_empty() && !c.registries_out.is_empty());
        if !present {
            return Err(CovenantError::MissingInput(format!(
                "{} registry for a declared reserve change",
                facet
            )));
        }
        if *facet != Facet::Pool && declared.fungible != 0 {
            return Err(CovenantError::invalid(format!(
                "{} declares a quote change",
                facet
            )));
        }
    }

    for (facet, counts) in &tally.facets {
        if let (Some(before), Some(after)) =
            (counts.registries_in.first(), counts.registries_out.first())
        {
            let declared = deltas.get(facet).copied().unwrap_or_default();
            check_delta(*facet, "reserve", *before, *after, declared.native)?;
        }
    }

    let vault_before = tally.vault_in.first().copied().unwrap_or(0);
    let vault_after = tally.vault_out.first().copied().unwrap_or(0);
    let declared = deltas
        .get(&Facet::Pool)
        .map_or(0, |delta| delta.fungible);
    check_delta(Facet::Pool, "quote vault", vault_before, vault_after, declared)
}

/// Check a finalized transaction against the declared reserve deltas
pub fn check(
    deployment: &Deployment,
    tx: &Transaction,
    deltas: &BTreeMap<Facet, ReserveDelta>,
) -> CovenantResult<()> {
    let tally = tally(deployment, tx)?;
    check_supply(deployment, tx, &tally)?;
    check_conservation(deployment, tx)?;
    check_deltas(&tally, deltas)?;
    debug!(
        inputs = tx.inputs.len(),
        outputs = tx.outputs.len(),
        fee = tx.fee,
        "Guard checks passed"
    );
    Ok(())
}

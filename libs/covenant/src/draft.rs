//! Transition drafts and their finalization into transactions
//!
//! A transition only describes the covenant side of a transaction: the state
//! inputs it consumes, the outputs it requires and the reserve change it
//! declares per facet. Funding, fee and change are added by [`finalize`],
//! after which the guard re-checks the whole transaction.

use std::collections::BTreeMap;

use facet_codec::{CommitmentLayout, Facet, RegistryEntry};
use facet_types::{
    Capability, CategoryId, CovenantError, CovenantResult, Destination, Outpoint, Output,
    TokenData, Transaction, Utxo,
};

use crate::deployment::Deployment;
use crate::guard;
use crate::tokens::{classify, Held, TokenClass};

/// Change a transition declares for one facet's pooled reserve
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReserveDelta {
    /// Change of the registry's native value
    pub native: i128,
    /// Change of the pool's quote vault; zero for every other facet
    pub fungible: i128,
}

/// Caller-supplied transaction context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxContext {
    pub now: u32,
    pub fee: u64,
    /// Plain outputs (optionally carrying quote tokens) that cover any shortfall
    pub funding: Vec<Utxo>,
    pub change: Destination,
}

/// Per-call view of the deployment handed to every transition
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub deployment: &'a Deployment,
    pub now: u32,
    /// Outpoint spent by the transaction's first input
    pub anchor: Option<Outpoint>,
}

impl<'a> Context<'a> {
    pub fn dust(&self) -> u64 {
        self.deployment.params.token_dust
    }

    /// Pooled reserve held by a registry, above its own dust
    pub fn reserve_of(&self, registry: &Held<RegistryEntry>) -> u64 {
        registry.attached().saturating_sub(self.dust())
    }

    /// Fail with `InsufficientReserve` unless `registry` holds `required`
    pub fn ensure_reserve(&self, registry: &Held<RegistryEntry>, required: u64) -> CovenantResult<()> {
        let available = self.reserve_of(registry);
        if available < required {
            return Err(CovenantError::InsufficientReserve {
                available,
                required,
            });
        }
        Ok(())
    }

    /// Output carrying a non-minting state token with the configured dust
    pub fn state_output<T: CommitmentLayout>(
        &self,
        facet: Facet,
        commitment: &T,
        destination: Destination,
    ) -> Output {
        Output::with_token(
            destination,
            self.dust(),
            TokenData::nft(
                self.deployment.category(facet),
                Capability::None,
                commitment.encode(),
            ),
        )
    }

    /// Registry output for `entry` holding `value`
    pub fn registry_output(&self, entry: &RegistryEntry, value: u64) -> Output {
        Output::with_token(
            Destination::Covenant,
            value,
            TokenData::nft(
                self.deployment.category(entry.facet),
                Capability::Minting,
                entry.encode(),
            ),
        )
    }

    /// Quote vault output holding `amount`
    pub fn vault_output(&self, amount: u64) -> Output {
        Output::with_token(
            Destination::Covenant,
            0,
            TokenData::fungible(self.deployment.quote, amount),
        )
    }
}

/// Checked sum of payout parts
pub fn total(field: &'static str, parts: &[u64]) -> CovenantResult<u64> {
    facet_codec::range::amount(field, parts.iter().map(|part| u128::from(*part)).sum())
}

fn apply_delta(field: &'static str, value: u64, delta: i128) -> CovenantResult<u64> {
    let next = i128::from(value) + delta;
    if next < 0 {
        return Err(CovenantError::InsufficientReserve {
            available: value,
            required: u64::try_from(-delta).unwrap_or(u64::MAX),
        });
    }
    u64::try_from(next).map_err(|_| CovenantError::out_of_range(field, next))
}

/// Covenant side of a transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionDraft {
    pub inputs: Vec<Utxo>,
    pub outputs: Vec<Output>,
    pub deltas: BTreeMap<Facet, ReserveDelta>,
}

impl TransitionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spend<T>(&mut self, held: &Held<T>) {
        self.inputs.push(held.utxo.clone());
    }

    pub fn emit(&mut self, output: Output) {
        self.outputs.push(output);
    }

    /// Pay native value and quote tokens to `destination`; nothing is emitted for zero
    pub fn pay(&mut self, cx: &Context<'_>, destination: Destination, native: u64, quote: u64) {
        match (native, quote) {
            (0, 0) => {}
            (_, 0) => self.emit(Output::payment(destination, native)),
            _ => self.emit(Output::with_token(
                destination,
                native,
                TokenData::fungible(cx.deployment.quote, quote),
            )),
        }
    }

    /// Consume `registry`, recreate it unchanged apart from `delta`, and declare the delta
    pub fn move_reserve(
        &mut self,
        cx: &Context<'_>,
        registry: &Held<RegistryEntry>,
        native: i128,
    ) -> CovenantResult<()> {
        self.replace_registry(cx, registry, registry.value, native)
    }

    /// Consume `registry` and recreate it with a new entry and value
    pub fn replace_registry(
        &mut self,
        cx: &Context<'_>,
        registry: &Held<RegistryEntry>,
        entry: RegistryEntry,
        native: i128,
    ) -> CovenantResult<()> {
        let value = apply_delta("registry_value", registry.attached(), native)?;
        self.spend(registry);
        self.emit(cx.registry_output(&entry, value));
        self.deltas.entry(registry.value.facet).or_default().native += native;
        Ok(())
    }

    /// Consume the quote vault (if any) and recreate it moved by `delta`
    pub fn move_vault(
        &mut self,
        cx: &Context<'_>,
        vault: Option<&Held<u64>>,
        delta: i128,
    ) -> CovenantResult<()> {
        let before = vault.map_or(0, |held| held.value);
        let after = apply_delta("quote_vault", before, delta)?;
        if let Some(held) = vault {
            self.spend(held);
        }
        if after > 0 {
            self.emit(cx.vault_output(after));
        }
        self.deltas.entry(Facet::Pool).or_default().fungible += delta;
        Ok(())
    }

    /// Total native value of the draft's inputs
    pub fn input_value(&self) -> CovenantResult<u64> {
        sum_values(self.inputs.iter().map(|utxo| &utxo.output))
    }

    /// Total native value of the draft's outputs
    pub fn output_value(&self) -> CovenantResult<u64> {
        sum_values(self.outputs.iter())
    }
}

fn sum_values<'a>(outputs: impl Iterator<Item = &'a Output>) -> CovenantResult<u64> {
    let total: u128 = outputs.map(|output| u128::from(output.value)).sum();
    facet_codec::range::amount("native_total", total)
}

/// Balance of every non-facet fungible category across `outputs`
fn fungible_totals<'a>(
    deployment: &Deployment,
    outputs: impl Iterator<Item = &'a Output>,
) -> BTreeMap<CategoryId, u128> {
    let mut totals = BTreeMap::new();
    for output in outputs {
        if let Some(token) = &output.token {
            if token.amount > 0 && deployment.categories.facet_of(&token.category).is_none() {
                *totals.entry(token.category).or_insert(0u128) += u128::from(token.amount);
            }
        }
    }
    totals
}

/// Add funding, fee and change to a draft, then run the guard
pub fn finalize(
    deployment: &Deployment,
    draft: TransitionDraft,
    ctx: &TxContext,
) -> CovenantResult<Transaction> {
    for utxo in &ctx.funding {
        if utxo.output.nft().is_some() {
            return Err(CovenantError::UnexpectedInput(format!(
                "funding input {} carries an NFT",
                utxo.outpoint
            )));
        }
        if classify(deployment, &utxo.output)? != TokenClass::Foreign {
            return Err(CovenantError::UnexpectedInput(format!(
                "funding input {} is a covenant token",
                utxo.outpoint
            )));
        }
    }

    let native_in = u128::from(draft.input_value()?)
        + ctx
            .funding
            .iter()
            .map(|utxo| u128::from(utxo.output.value))
            .sum::<u128>();
    let native_required = u128::from(draft.output_value()?) + u128::from(ctx.fee);
    if native_in < native_required {
        return Err(CovenantError::InsufficientFunds {
            available: u64::try_from(native_in).unwrap_or(u64::MAX),
            required: u64::try_from(native_required).unwrap_or(u64::MAX),
        });
    }
    let mut native_change = facet_codec::range::amount("change", native_in - native_required)?;

    let available = fungible_totals(
        deployment,
        draft
            .inputs
            .iter()
            .chain(&ctx.funding)
            .map(|utxo| &utxo.output),
    );
    let required = fungible_totals(deployment, draft.outputs.iter());
    for (category, needed) in &required {
        let have = available.get(category).copied().unwrap_or(0);
        if have < *needed {
            return Err(CovenantError::InsufficientFunds {
                available: u64::try_from(have).unwrap_or(u64::MAX),
                required: u64::try_from(*needed).unwrap_or(u64::MAX),
            });
        }
    }

    let mut change = Vec::new();
    for (category, have) in available {
        let leftover = have - required.get(&category).copied().unwrap_or(0);
        if leftover > 0 {
            let amount = facet_codec::range::amount("change", leftover)?;
            change.push(Output::with_token(
                ctx.change.clone(),
                std::mem::take(&mut native_change),
                TokenData::fungible(category, amount),
            ));
        }
    }
    if native_change > 0 {
        change.push(Output::payment(ctx.change.clone(), native_change));
    }

    let deltas = draft.deltas;
    let mut inputs = draft.inputs;
    inputs.extend(ctx.funding.iter().cloned());
    let mut outputs = draft.outputs;
    outputs.extend(change);

    let tx = Transaction {
        inputs,
        outputs,
        fee: ctx.fee,
    };
    guard::check(deployment, &tx, &deltas)?;
    Ok(tx)
}

//! In-memory ledger
//!
//! Applies transactions atomically under a single lock: either every input
//! is consumed and every output created, or nothing changes. It enforces only
//! what the base ledger enforces; covenant rules are the validator's business.
//!
//! Token rules per category, unless the transaction is the category's genesis
//! (its first input is output 0 of the transaction whose txid is the
//! category id):
//!
//! - fungible outputs never exceed fungible inputs
//! - without a minting NFT of the category among the inputs, every output NFT
//!   must reproduce a distinct input NFT with the same capability and
//!   commitment; immutable NFTs are moved or burned, never rewritten
//! - minting capability only comes from a minting input

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use facet_types::{
    Capability, CategoryId, Destination, Nft, Outpoint, Output, Transaction, TxId, Utxo,
};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{ChainResult, Rejection};
use crate::services::{Broadcaster, ChainQuery};

/// SHA-256 of the bincode encoding
pub fn txid(tx: &Transaction) -> Result<TxId, Rejection> {
    let bytes = bincode::serialize(tx).map_err(|e| Rejection::Encoding(e.to_string()))?;
    Ok(TxId::new(Sha256::digest(&bytes).into()))
}

#[derive(Debug, Default)]
struct LedgerState {
    unspent: BTreeMap<Outpoint, Output>,
    time: u32,
    accepted: u64,
}

impl LedgerState {
    fn check(&self, tx: &Transaction) -> Result<(), Rejection> {
        let first = tx.inputs.first().ok_or(Rejection::NoInputs)?;

        let mut seen = HashSet::with_capacity(tx.inputs.len());
        for input in &tx.inputs {
            if !seen.insert(input.outpoint) {
                return Err(Rejection::DuplicateInput {
                    outpoint: input.outpoint,
                });
            }
            if self.unspent.get(&input.outpoint) != Some(&input.output) {
                return Err(Rejection::InputsSpent {
                    outpoint: input.outpoint,
                });
            }
        }

        let inputs = tx.input_value().unwrap_or(u64::MAX);
        let outputs = tx.output_value().unwrap_or(u64::MAX);
        if outputs.checked_add(tx.fee) != Some(inputs) {
            return Err(Rejection::ValueMismatch {
                inputs,
                outputs,
                fee: tx.fee,
            });
        }

        let genesis = (first.outpoint.vout == 0).then(|| CategoryId::from(first.outpoint.txid));
        let before = CategoryTokens::collect(tx.inputs.iter().map(|utxo| &utxo.output));
        let after = CategoryTokens::collect(tx.outputs.iter());
        for (category, created) in after {
            if Some(category) == genesis {
                continue;
            }
            let Some(spent) = before.get(&category) else {
                return Err(Rejection::TokenUnauthorized { category });
            };
            if created.fungible > spent.fungible {
                return Err(Rejection::FungibleInflation {
                    category,
                    inputs: u64::try_from(spent.fungible).unwrap_or(u64::MAX),
                    outputs: u64::try_from(created.fungible).unwrap_or(u64::MAX),
                });
            }
            spent.authorize(category, &created.nfts)?;
        }
        Ok(())
    }
}

/// Fungible total and NFTs of one category on one side of a transaction
#[derive(Debug, Default)]
struct CategoryTokens<'a> {
    fungible: u128,
    nfts: Vec<&'a Nft>,
}

impl<'a> CategoryTokens<'a> {
    fn collect(outputs: impl Iterator<Item = &'a Output>) -> BTreeMap<CategoryId, Self> {
        let mut totals: BTreeMap<CategoryId, Self> = BTreeMap::new();
        for output in outputs {
            if let Some(token) = &output.token {
                let entry = totals.entry(token.category).or_default();
                entry.fungible += u128::from(token.amount);
                entry.nfts.extend(token.nft.as_ref());
            }
        }
        totals
    }

    fn has_minting(&self) -> bool {
        self.nfts
            .iter()
            .any(|nft| nft.capability == Capability::Minting)
    }

    /// Check that `created` NFTs are backed by these spent ones
    fn authorize(&self, category: CategoryId, created: &[&Nft]) -> Result<(), Rejection> {
        if self.has_minting() {
            return Ok(());
        }
        let mut available: Vec<&Nft> = self.nfts.clone();
        for nft in created {
            let Some(index) = available.iter().position(|spent| *spent == *nft) else {
                let reason = if nft.capability == Capability::Minting {
                    "minting capability without a minting input"
                } else if self.nfts.iter().any(|spent| *spent == *nft) {
                    "immutable NFT duplicated"
                } else {
                    "commitment does not match any input"
                };
                return Err(Rejection::NftUnauthorized { category, reason });
            };
            available.swap_remove(index);
        }
        Ok(())
    }
}

/// Ledger held entirely in memory, shared behind a tokio mutex
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    pub fn new(time: u32) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                time,
                ..LedgerState::default()
            }),
        }
    }

    /// Seed an output outside any transaction
    pub async fn mint(&self, utxo: Utxo) {
        self.state
            .lock()
            .await
            .unspent
            .insert(utxo.outpoint, utxo.output);
    }

    pub async fn set_time(&self, time: u32) {
        self.state.lock().await.time = time;
    }

    pub async fn advance_time(&self, secs: u32) {
        let mut state = self.state.lock().await;
        state.time = state.time.saturating_add(secs);
    }

    /// Number of transactions accepted so far
    pub async fn accepted(&self) -> u64 {
        self.state.lock().await.accepted
    }

    pub async fn is_unspent(&self, outpoint: &Outpoint) -> bool {
        self.state.lock().await.unspent.contains_key(outpoint)
    }

    /// Every unspent output, in outpoint order
    pub async fn snapshot(&self) -> Vec<Utxo> {
        self.state
            .lock()
            .await
            .unspent
            .iter()
            .map(|(outpoint, output)| Utxo::new(*outpoint, output.clone()))
            .collect()
    }

    async fn filter(&self, keep: impl Fn(&Output) -> bool) -> Vec<Utxo> {
        self.state
            .lock()
            .await
            .unspent
            .iter()
            .filter(|(_, output)| keep(output))
            .map(|(outpoint, output)| Utxo::new(*outpoint, output.clone()))
            .collect()
    }
}

#[async_trait]
impl ChainQuery for MemoryLedger {
    async fn unspent_by_category(&self, category: &CategoryId) -> ChainResult<Vec<Utxo>> {
        Ok(self
            .filter(|output| output.category().as_ref() == Some(category))
            .await)
    }

    async fn unspent_for(&self, destination: &Destination) -> ChainResult<Vec<Utxo>> {
        Ok(self
            .filter(|output| output.destination == *destination)
            .await)
    }

    async fn current_time(&self) -> ChainResult<u32> {
        Ok(self.state.lock().await.time)
    }
}

#[async_trait]
impl Broadcaster for MemoryLedger {
    async fn broadcast(&self, tx: &Transaction) -> ChainResult<TxId> {
        let id = txid(tx)?;
        let mut state = self.state.lock().await;
        state.check(tx)?;

        for input in &tx.inputs {
            state.unspent.remove(&input.outpoint);
        }
        for (vout, output) in tx.outputs.iter().enumerate() {
            state
                .unspent
                .insert(Outpoint::new(id, vout as u32), output.clone());
        }
        state.accepted += 1;
        debug!(
            txid = %id,
            inputs = tx.inputs.len(),
            outputs = tx.outputs.len(),
            "Transaction accepted"
        );
        Ok(id)
    }
}

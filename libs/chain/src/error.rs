//! Service-layer errors
//!
//! Covenant errors are terminal. Of the ledger rejections only
//! [`Rejection::InputsSpent`] is worth retrying: it means another submission
//! consumed the same state first.

use facet_types::{CategoryId, CovenantError, Outpoint};
use thiserror::Error;

/// Why the ledger refused a transaction
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// An input is unknown or already spent
    #[error("Input {outpoint} is not unspent")]
    InputsSpent { outpoint: Outpoint },

    #[error("Input {outpoint} spent twice in one transaction")]
    DuplicateInput { outpoint: Outpoint },

    #[error("Transaction has no inputs")]
    NoInputs,

    #[error("Native value not conserved: inputs={inputs}, outputs={outputs}, fee={fee}")]
    ValueMismatch { inputs: u64, outputs: u64, fee: u64 },

    /// Token output of a category with no input of that category and no genesis
    #[error("Category {category} created without authority")]
    TokenUnauthorized { category: CategoryId },

    /// NFT created, rewritten or upgraded without a minting input of its category
    #[error("NFT of {category} not backed by an input: {reason}")]
    NftUnauthorized {
        category: CategoryId,
        reason: &'static str,
    },

    #[error("Fungible supply of {category} inflated from {inputs} to {outputs}")]
    FungibleInflation {
        category: CategoryId,
        inputs: u64,
        outputs: u64,
    },

    #[error("Transaction could not be encoded: {0}")]
    Encoding(String),
}

/// Errors surfaced by signers, ledgers and the submission loop
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Covenant rejected the transition: {0}")]
    Covenant(#[from] CovenantError),

    #[error("Ledger rejected the transaction: {0}")]
    Rejected(#[from] Rejection),

    #[error("Signer failure: {0}")]
    Signer(String),

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Rejection },
}

impl ChainError {
    /// Lost a race against another submission; rebuilding may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChainError::Rejected(Rejection::InputsSpent { .. }))
    }
}

pub type ChainResult<T> = std::result::Result<T, ChainError>;

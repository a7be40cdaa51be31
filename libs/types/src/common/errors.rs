//! Canonical error kinds for commitment decoding and transition validation
//!
//! Every failure is a local, synchronous validation failure: nothing here is
//! retryable, and construction of the transaction stops at the first error.
//! Network-level rejections (double spends, fee floors) belong to the
//! submission layer and never appear in this enum.

use thiserror::Error;

use super::identifiers::CategoryId;

/// Flat set of covenant validation errors with diagnostic context
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CovenantError {
    /// Commitment has the wrong width or carries an invalid state flag
    #[error("Malformed {kind} commitment: {reason}")]
    MalformedCommitment { kind: &'static str, reason: String },

    /// Numeric field does not fit its fixed byte width
    #[error("Value {value} for field '{field}' is out of range")]
    OutOfRange { field: &'static str, value: i128 },

    /// Admin-only operation without a valid signature from the configured key
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// Principal and yield halves with different expiries
    #[error("Incompatible expiry: principal token expires at {principal_expiry}, yield token at {yield_expiry}")]
    IncompatibleExpiry {
        principal_expiry: u32,
        yield_expiry: u32,
    },

    /// Time-gated operation attempted before its expiry
    #[error("Not yet matured: current time {now} is before expiry {expiry}")]
    NotYetMatured { now: u32, expiry: u32 },

    /// Swap output below the caller's minimum
    #[error("Slippage exceeded: amount out {amount_out} is below minimum {min_amount_out}")]
    SlippageExceeded { amount_out: u64, min_amount_out: u64 },

    /// Pooled reserve cannot cover the requested debit
    #[error("Insufficient reserve: {available} available, {required} required")]
    InsufficientReserve { available: u64, required: u64 },

    /// Tick bounds not ordered or outside the configured domain
    #[error("Invalid tick range [{tick_lower}, {tick_upper})")]
    InvalidTickRange { tick_lower: i32, tick_upper: i32 },

    /// Token claims membership of a facet whose category it does not carry
    #[error("Category mismatch: expected {expected}, found {found}")]
    CategoryMismatch {
        expected: CategoryId,
        found: CategoryId,
    },

    /// Amount below a configured minimum
    #[error("Amount {amount} for '{field}' is below the minimum {minimum}")]
    BelowMinimum {
        field: &'static str,
        amount: u64,
        minimum: u64,
    },

    /// Funding inputs cannot cover the transaction's shortfall
    #[error("Insufficient funds: {available} available, {required} required")]
    InsufficientFunds { available: u64, required: u64 },

    /// Native value not conserved across the transaction
    #[error("Value mismatch: inputs={inputs}, outputs={outputs}, fee={fee}")]
    ValueMismatch { inputs: u64, outputs: u64, fee: u64 },

    /// Fungible balance of a category not conserved
    #[error("Fungible mismatch for {category}: inputs={inputs}, outputs={outputs}")]
    FungibleMismatch {
        category: CategoryId,
        inputs: u64,
        outputs: u64,
    },

    /// Supply of a category changed without its minting token on both sides
    #[error("Minting authority for {category} missing: {reason}")]
    MintingAuthorityMissing { category: CategoryId, reason: String },

    /// Operation requires a state token that was not supplied
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Input supplied that the operation does not consume
    #[error("Unexpected input: {0}")]
    UnexpectedInput(String),

    /// Facet registry is paused
    #[error("Facet '{facet}' is paused")]
    Paused { facet: &'static str },

    /// Merge policy refuses to discard accrued yield
    #[error("Unclaimed yield of {accrued} must be claimed before merging")]
    UnclaimedYield { accrued: u64 },

    /// Option can no longer be exercised
    #[error("Option expired at {expiry}, current time {now}")]
    Expired { now: u32, expiry: u32 },

    /// Exercise requested for an option that is not in the money
    #[error("Option out of the money: strike {strike}, price {price}")]
    OutOfTheMoney { strike: u32, price: u64 },

    /// Expiry requested for an option that is still in the money
    #[error("Option in the money: strike {strike}, price {price}")]
    InTheMoney { strike: u32, price: u64 },

    /// Oracle price older than the configured maximum age
    #[error("Stale price: published at {published_at}, now {now}, max age {max_age}")]
    StalePrice {
        published_at: u32,
        now: u32,
        max_age: u32,
    },

    /// Any other illegal transition
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl CovenantError {
    /// Create MalformedCommitment for a width mismatch
    pub fn wrong_width(kind: &'static str, expected: usize, got: usize) -> Self {
        Self::MalformedCommitment {
            kind,
            reason: format!("expected {} bytes, got {}", expected, got),
        }
    }

    /// Create OutOfRange from any integer that converts into i128
    pub fn out_of_range(field: &'static str, value: impl Into<i128>) -> Self {
        Self::OutOfRange {
            field,
            value: value.into(),
        }
    }

    /// Create OutOfRange for a wide unsigned intermediate, saturating the report
    pub fn out_of_range_wide(field: &'static str, value: u128) -> Self {
        Self::OutOfRange {
            field,
            value: i128::try_from(value).unwrap_or(i128::MAX),
        }
    }

    /// Create InvalidTransition with context
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidTransition(reason.into())
    }
}

/// Result type for covenant operations
pub type CovenantResult<T> = std::result::Result<T, CovenantError>;

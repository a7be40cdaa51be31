//! # Facet AMM - Integer Pricing Engine for the Pool Facet
//!
//! ## Purpose
//!
//! Deterministic integer arithmetic for the pool facet: tick-range validation,
//! liquidity from deposited amounts, fee-adjusted swap quoting and per-position
//! fee accounting. Every function is pure; the same inputs produce the same
//! outputs bit-for-bit whether evaluated by a wallet constructing a
//! transaction or by the covenant verifying one.
//!
//! ## Integration Points
//!
//! - **Input**: the decoded [`PoolState`](facet_codec::PoolState), [`Position`](facet_codec::Position)
//!   and [`FeeCheckpoint`](facet_codec::FeeCheckpoint) commitments
//! - **Output**: successor commitments plus the exact amounts that move between
//!   the pool registry and the caller
//! - **Errors**: `InvalidTickRange`, `OutOfRange`, `InsufficientReserve`,
//!   `SlippageExceeded` from [`facet_types::CovenantError`]
//!
//! ## Pricing Model
//!
//! The shipped [`LinearFeeModel`] is fee-only: `liquidity = min(amount0, amount1)`
//! and `amount_out = amount_in - floor(amount_in * fee_bps / 10000)`. There is no
//! price curve and ticks only bound a position. Swapping a different curve in
//! means implementing [`PricingModel`]; the ledger code never inspects the model.
//!
//! ## Fee Accounting
//!
//! ```text
//! swap fee ──► fee pot (registry balance above tracked reserve)
//!          └─► fee_growth += fee · 2^32 / total_liquidity
//! collect  ──► owed = liquidity · (fee_growth − checkpoint) / 2^32
//! ```
//!
//! Flooring on both sides keeps the sum of everything owed at or below the pot.

pub mod fees;
pub mod pool;
pub mod pricing;
pub mod ticks;

pub use fees::{fees_owed, growth_increment, FEE_GROWTH_SHIFT};
pub use pool::{Collection, Deposit, PoolLedger, SwapOutcome, Withdrawal};
pub use pricing::{
    liquidity_from_amounts, swap_output, LinearFeeModel, PricingModel, SwapQuote,
    BPS_DENOMINATOR,
};
pub use ticks::{TickDomain, MAX_TICK, MIN_TICK};

/// Common types for reporting rates
pub use rust_decimal::Decimal;

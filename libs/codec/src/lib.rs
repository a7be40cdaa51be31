//! # Facet Commitment Codec
//!
//! ## Purpose
//!
//! Fixed-width binary (de)serialization for every state-token kind. A
//! commitment is the only place application state lives on this ledger, so
//! these layouts are the wire format: bit-exact, big-endian, no
//! variable-length fields.
//!
//! ## Contract
//!
//! - `encode` produces exactly [`CommitmentKind::width`] bytes
//! - `decode` of any other width, or of an undefined state flag, is
//!   [`CovenantError::MalformedCommitment`](facet_types::CovenantError)
//! - wide inputs are narrowed through [`range`]; overflow is
//!   [`CovenantError::OutOfRange`](facet_types::CovenantError), never wraparound
//! - `decode(encode(x)) == x` for every valid `x`
//!
//! ## Layouts
//!
//! ```text
//! Registry       facet u8 | code hash [32] | version u16 | flags u8          36
//! StakeReceipt   amount u64                                                   8
//! Principal      principal u64 | expiry u32                                  12
//! Yield          accrued u64 | expiry u32                                    12
//! Position       tick lower i32 | tick upper i32 | liquidity u64             16
//! PoolState      reserve0 | reserve1 | liquidity | growth0 | growth1 (u64)   40
//! FeeCheckpoint  tick lower | tick upper | liquidity | growth0 | growth1     32
//! Option         asset [32] | strike u32 | expiry u32 | is-call u8           41
//! PriceFeed      price u64 | published-at u32                                12
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Which kinds may appear in which transactions (belongs in `facet-covenant`)
//! - Any arithmetic beyond range narrowing

pub mod commitments;
pub mod layout;
pub mod range;
mod wire;

pub use commitments::{
    FeeCheckpoint, OptionContract, PoolState, Position, PriceFeed, PrincipalToken,
    RegistryEntry, StakeReceipt, YieldToken,
};
pub use layout::{Commitment, CommitmentKind, CommitmentLayout, Facet};

//! # Facet Types - Ledger Model for Covenant State Tokens
//!
//! ## Purpose
//!
//! Shared vocabulary for every Facet crate: token categories, NFT capabilities,
//! transaction outputs and the single flat error enum all validation reports.
//! The ledger has no contract storage, so application state only ever exists
//! as commitments carried by unspent outputs modelled here.
//!
//! ## Integration Points
//!
//! - **Codec**: commitments are opaque `Vec<u8>` here; `facet-codec` gives them meaning
//! - **Covenant**: drafts and validates [`Transaction`] values built from these types
//! - **Chain**: the in-memory ledger and submission loop move these values around
//!
//! ## Architecture Role
//!
//! ```text
//! libs/types → codec / amm / accrual → covenant → chain
//!     ↑                                   ↓
//! Pure Data                      Validated Transactions
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Commitment layouts (belongs in `facet-codec`)
//! - Transition rules (belongs in `facet-covenant`)
//! - Any I/O

pub mod common;
pub mod ledger;

pub use common::errors::{CovenantError, CovenantResult};
pub use common::identifiers::{CategoryId, CodeHash, KeyHash, Outpoint, TxId};
pub use ledger::{Capability, Destination, Nft, Output, TokenData, Transaction, Utxo};

//! # Facet Covenant - State Machine for Token-Carried Application State
//!
//! ## Purpose
//!
//! The ledger has no contract storage and no inter-contract calls, so every
//! piece of application state lives in a commitment carried by an NFT, and
//! every state change is a transaction that consumes tokens and recreates
//! them. This crate decides which of those transactions are legal.
//!
//! ## Integration Points
//!
//! - **Input**: current state-token outputs, caller parameters, caller-supplied time
//! - **Output**: a fully specified [`Transaction`](facet_types::Transaction) or a
//!   typed [`CovenantError`](facet_types::CovenantError)
//! - **Engines**: `facet-codec` for commitments, `facet-amm` for pool math,
//!   `facet-accrual` for yield
//! - **Upstream services**: none; signing, chain queries and broadcasting live
//!   in `facet-chain`
//!
//! ## Architecture Role
//!
//! ```text
//! state inputs ──► InputSet ──► transition ──► TransitionDraft
//!                                                   │
//!                    funding / fee / change ──► finalize ──► guard::check ──► Transaction
//! ```
//!
//! `TransitionValidator::verify` runs the same path backwards over a proposed
//! transaction, so a transaction built by anyone else is held to exactly what
//! `construct` would have produced.
//!
//! ## Concurrency
//!
//! Nothing here locks or caches. A validator evaluated against a stale view
//! simply produces a transaction whose inputs are already spent; the ledger
//! rejects it and the submission layer rebuilds against the new state.

pub mod auth;
pub mod deployment;
pub mod draft;
pub mod guard;
pub mod tokens;
pub mod transitions;
pub mod validator;

pub use auth::{admin_digest, key_hash, sign_admin, verify_admin, AdminAction, AdminAuthorization};
pub use deployment::{Deployment, FacetCategories, Params};
pub use draft::{finalize, Context, ReserveDelta, TransitionDraft, TxContext};
pub use tokens::{classify, Held, InputSet, StateKind, TokenClass};
pub use validator::{Operation, TransitionValidator};

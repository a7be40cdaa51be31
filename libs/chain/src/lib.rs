//! # Facet Chain - Service Seams and Submission
//!
//! ## Purpose
//!
//! Everything the covenant core deliberately leaves out: the admin key, the
//! unspent-output set, broadcast, and resubmission after losing a race for a
//! state token. The core stays pure; this crate owns the I/O.
//!
//! ## Integration Points
//!
//! - **Signing**: [`AdminSigner`] signs admin digests ([`LocalSigner`] in memory)
//! - **Query**: [`ChainQuery`] lists unspent outputs by category or destination
//! - **Broadcast**: [`Broadcaster`] returns a txid or a [`Rejection`]
//! - **Ledger**: [`MemoryLedger`] implements query and broadcast for tests and demos
//!
//! ## Architecture Role
//!
//! ```text
//! ChainQuery ──► Snapshot ──► TransitionPlan ──► TransitionValidator::construct
//!                    ▲                                      │
//!                    └──── Rejection::InputsSpent ◄── Broadcaster
//! ```
//!
//! A state token has exactly one current instance. Two submitters spending it
//! race; the ledger accepts one and the other rebuilds against the new state.

pub mod error;
pub mod ledger;
pub mod services;
pub mod signer;
pub mod snapshot;
pub mod submitter;

pub use error::{ChainError, ChainResult, Rejection};
pub use ledger::{txid, MemoryLedger};
pub use services::{AdminSigner, Broadcaster, ChainQuery};
pub use signer::LocalSigner;
pub use snapshot::Snapshot;
pub use submitter::{AdminPlan, AdminRequest, Prepared, RetryPolicy, Submitted, Submitter, TransitionPlan};

//! Per-operation transition rules
//!
//! Each function takes the state inputs it needs from an [`InputSet`], checks
//! its preconditions and returns the covenant side of the transaction. None of
//! them touch funding, fee or change.
//!
//! [`InputSet`]: crate::tokens::InputSet

pub mod governance;
pub mod options;
pub mod pool;
pub mod staking;
pub mod tranching;

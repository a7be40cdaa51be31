//! Identifiers and error kinds shared across the workspace

pub mod errors;
pub mod identifiers;

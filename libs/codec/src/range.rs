//! Range narrowing into commitment field widths
//!
//! Arithmetic happens in wide integers; every value is narrowed here before it
//! is written into a layout.

use facet_types::{CovenantError, CovenantResult};

/// Narrow an amount into 8 unsigned bytes
pub fn amount(field: &'static str, value: u128) -> CovenantResult<u64> {
    u64::try_from(value).map_err(|_| CovenantError::out_of_range_wide(field, value))
}

/// Narrow a tick into 4 signed bytes
pub fn tick(field: &'static str, value: i64) -> CovenantResult<i32> {
    i32::try_from(value).map_err(|_| CovenantError::out_of_range(field, value))
}

/// Narrow a time or strike into 4 unsigned bytes
pub fn word(field: &'static str, value: u64) -> CovenantResult<u32> {
    u32::try_from(value).map_err(|_| CovenantError::out_of_range(field, value))
}

//! Expiry-anchored accrual schedule for yield tokens

use facet_codec::YieldToken;
use facet_types::{CovenantError, CovenantResult};
use serde::{Deserialize, Serialize};

use crate::{accrue, term_yield};

/// Accrual rate and window length shared by every yield token of a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualSchedule {
    /// Yield per second of window, in basis points of one unit
    pub rate_bps: u32,
    /// Window length in seconds, ending at the token's expiry
    pub term: u32,
}

impl AccrualSchedule {
    pub fn new(rate_bps: u32, term: u32) -> CovenantResult<Self> {
        if term == 0 {
            return Err(CovenantError::out_of_range("yield_term", 0u8));
        }
        Ok(Self { rate_bps, term })
    }

    /// Start of the accrual window for a token expiring at `expiry`
    pub fn anchor(&self, expiry: u32) -> CovenantResult<u32> {
        expiry.checked_sub(self.term).ok_or_else(|| {
            CovenantError::invalid(format!(
                "expiry {} is shorter than the yield term {}",
                expiry, self.term
            ))
        })
    }

    /// Maximum yield a token can ever hold
    pub fn full_term_yield(&self) -> CovenantResult<u64> {
        term_yield(self.term, self.rate_bps)
    }

    /// Yield earned by `now` for a token expiring at `expiry`
    pub fn target(&self, expiry: u32, now: u32) -> CovenantResult<u64> {
        let anchor = self.anchor(expiry)?;
        accrue(
            0,
            i64::from(now) - i64::from(anchor),
            self.rate_bps,
            expiry,
            anchor,
        )
    }

    /// Accrued yield recorded by a claim at `now`; never below what the token holds
    pub fn claimable(&self, token: &YieldToken, now: u32) -> CovenantResult<u64> {
        Ok(token.accrued.max(self.target(token.expiry, now)?))
    }

    /// Whether a split at `now` leaves the whole window ahead of it
    pub fn admits_split(&self, expiry: u32, now: u32) -> bool {
        expiry > now && expiry - now >= self.term
    }
}

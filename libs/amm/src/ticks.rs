//! Tick domain and range validation
//!
//! Ticks only bound a position; nothing here converts a tick into a price.

use facet_types::{CovenantError, CovenantResult};
use serde::{Deserialize, Serialize};

/// Widest tick domain, matching the usual concentrated-liquidity bounds
pub const MIN_TICK: i32 = -887272;
pub const MAX_TICK: i32 = 887272;

/// Inclusive bounds every position tick must fall within
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickDomain {
    pub min_tick: i32,
    pub max_tick: i32,
}

impl Default for TickDomain {
    fn default() -> Self {
        Self {
            min_tick: MIN_TICK,
            max_tick: MAX_TICK,
        }
    }
}

impl TickDomain {
    pub fn new(min_tick: i32, max_tick: i32) -> CovenantResult<Self> {
        if min_tick >= max_tick {
            return Err(CovenantError::InvalidTickRange {
                tick_lower: min_tick,
                tick_upper: max_tick,
            });
        }
        Ok(Self { min_tick, max_tick })
    }

    pub fn contains(&self, tick: i32) -> bool {
        (self.min_tick..=self.max_tick).contains(&tick)
    }

    /// Accept `[tick_lower, tick_upper)` only when ordered and inside the domain
    pub fn validate_range(&self, tick_lower: i32, tick_upper: i32) -> CovenantResult<()> {
        if tick_lower >= tick_upper || !self.contains(tick_lower) || !self.contains(tick_upper) {
            return Err(CovenantError::InvalidTickRange {
                tick_lower,
                tick_upper,
            });
        }
        Ok(())
    }
}

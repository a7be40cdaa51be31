//! Default values for every configuration section

/// Ledger defaults
pub mod ledger {
    /// Native value carried by each non-registry state token
    pub const TOKEN_DUST: u64 = 0;
}

/// Staking defaults
pub mod staking {
    /// Smallest accepted stake
    pub const MIN_STAKE: u64 = 10_000;
}

/// Yield accrual defaults
pub mod accrual {
    /// Yield per second of window, in basis points of one unit
    pub const RATE_BPS: u32 = 1;

    /// Accrual window ending at each yield token's expiry (30 days)
    pub const TERM_SECS: u32 = 30 * 24 * 60 * 60;
}

/// Pool defaults
pub mod amm {
    /// Swap fee (30 = 0.3%)
    pub const FEE_BPS: u32 = 30;

    pub use facet_amm::{MAX_TICK, MIN_TICK};
}

/// Options defaults
pub mod options {
    /// Collateral locked per written contract
    pub const COLLATERAL_PER_CONTRACT: u64 = 100_000;
}

/// Oracle defaults
pub mod oracle {
    /// Oldest price an exercise will accept
    pub const MAX_PRICE_AGE_SECS: u32 = 3_600;
}

/// Submission loop defaults
pub mod submission {
    /// Rebuild-and-resubmit attempts after a lost race
    pub const MAX_RETRIES: u32 = 3;

    /// Base backoff between attempts (milliseconds), doubled each retry
    pub const BACKOFF_MS: u64 = 250;
}

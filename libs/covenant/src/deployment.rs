//! Typed deployment parameters
//!
//! Everything a transition needs to know about the deployed facets: which
//! category each one owns, the admin key, and the economic parameters. Built
//! once from [`FacetConfig`] at the configuration boundary.

use anyhow::{Context, Result};
use facet_accrual::AccrualSchedule;
use facet_amm::{LinearFeeModel, PoolLedger, TickDomain};
use facet_codec::Facet;
use facet_config::{FacetConfig, MergePolicy};
use facet_types::{CategoryId, Destination, KeyHash};

/// Category owned by each facet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetCategories {
    pub staking: CategoryId,
    pub principal: CategoryId,
    pub yield_token: CategoryId,
    pub pool: CategoryId,
    pub options: CategoryId,
    pub oracle: CategoryId,
}

impl FacetCategories {
    pub fn category(&self, facet: Facet) -> CategoryId {
        match facet {
            Facet::Staking => self.staking,
            Facet::Principal => self.principal,
            Facet::Yield => self.yield_token,
            Facet::Pool => self.pool,
            Facet::Options => self.options,
            Facet::Oracle => self.oracle,
        }
    }

    /// Facet owning `category`, if any
    pub fn facet_of(&self, category: &CategoryId) -> Option<Facet> {
        Facet::ALL
            .into_iter()
            .find(|facet| self.category(*facet) == *category)
    }
}

/// Economic parameters shared by every transition
#[derive(Debug, Clone)]
pub struct Params {
    pub token_dust: u64,
    pub min_stake: u64,
    pub schedule: AccrualSchedule,
    pub merge_policy: MergePolicy,
    pub pool: PoolLedger<LinearFeeModel>,
    pub collateral_per_contract: u64,
    pub writer: Destination,
    pub max_price_age: u32,
}

/// A deployed family of facets
#[derive(Debug, Clone)]
pub struct Deployment {
    pub categories: FacetCategories,
    /// Fungible category traded against the native unit in the pool
    pub quote: CategoryId,
    /// Asset priced by the oracle
    pub oracle_asset: CategoryId,
    pub admin_key: KeyHash,
    pub params: Params,
}

impl Deployment {
    pub fn from_config(config: &FacetConfig) -> Result<Self> {
        config.validate()?;
        let resolved = config.categories.resolve()?;

        let schedule = AccrualSchedule::new(config.accrual.rate_bps, config.accrual.term_secs)
            .context("Invalid yield schedule")?;
        let model = LinearFeeModel::new(config.amm.fee_bps).context("Invalid amm.fee_bps")?;
        let domain: TickDomain = config.amm.tick_domain()?;

        Ok(Self {
            categories: FacetCategories {
                staking: resolved.staking,
                principal: resolved.principal,
                yield_token: resolved.yield_token,
                pool: resolved.pool,
                options: resolved.options,
                oracle: resolved.oracle,
            },
            quote: resolved.quote,
            oracle_asset: resolved.oracle_asset,
            admin_key: config.admin.key_hash()?,
            params: Params {
                token_dust: config.ledger.token_dust,
                min_stake: config.staking.min_stake,
                schedule,
                merge_policy: config.accrual.merge_policy,
                pool: PoolLedger::new(model, domain),
                collateral_per_contract: config.options.collateral_per_contract,
                writer: Destination::Holder(config.options.writer_bytecode()?),
                max_price_age: config.oracle.max_price_age_secs,
            },
        })
    }

    pub fn category(&self, facet: Facet) -> CategoryId {
        self.categories.category(facet)
    }
}

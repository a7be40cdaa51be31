//! Facet Configuration Module
//!
//! Loads deployment configuration from TOML files with environment-specific
//! overrides and `FACET__` environment variables.

use anyhow::{bail, ensure, Context, Result};
use config_crate::{Config, Environment, File};
use facet_amm::TickDomain;
use facet_types::{CategoryId, KeyHash};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::defaults;

/// Complete deployment configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct FacetConfig {
    pub ledger: LedgerConfig,
    pub admin: AdminConfig,
    pub categories: CategoryConfig,
    pub staking: StakingConfig,
    #[serde(rename = "yield")]
    pub accrual: YieldConfig,
    pub amm: AmmConfig,
    pub options: OptionsConfig,
    pub oracle: OracleConfig,
    pub submission: SubmissionConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    pub token_dust: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            token_dust: defaults::ledger::TOKEN_DUST,
        }
    }
}

/// Governance key
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Hex SHA-256 of the admin Ed25519 public key
    pub key_hash: String,
}

impl AdminConfig {
    pub fn key_hash(&self) -> Result<KeyHash> {
        KeyHash::from_hex(&self.key_hash).context("Invalid admin.key_hash")
    }
}

/// Hex category ids of the deployed facets and the external categories they use
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct CategoryConfig {
    pub staking: String,
    pub principal: String,
    #[serde(rename = "yield")]
    pub yield_token: String,
    pub pool: String,
    pub options: String,
    pub oracle: String,
    /// Fungible category traded against the native unit in the pool
    pub quote: String,
    /// Asset the oracle prices and options are written on
    pub oracle_asset: String,
}

/// Parsed [`CategoryConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedCategories {
    pub staking: CategoryId,
    pub principal: CategoryId,
    pub yield_token: CategoryId,
    pub pool: CategoryId,
    pub options: CategoryId,
    pub oracle: CategoryId,
    pub quote: CategoryId,
    pub oracle_asset: CategoryId,
}

fn parse_category(name: &str, value: &str) -> Result<CategoryId> {
    CategoryId::from_hex(value).with_context(|| format!("Invalid categories.{}: {:?}", name, value))
}

impl CategoryConfig {
    pub fn resolve(&self) -> Result<ResolvedCategories> {
        let resolved = ResolvedCategories {
            staking: parse_category("staking", &self.staking)?,
            principal: parse_category("principal", &self.principal)?,
            yield_token: parse_category("yield", &self.yield_token)?,
            pool: parse_category("pool", &self.pool)?,
            options: parse_category("options", &self.options)?,
            oracle: parse_category("oracle", &self.oracle)?,
            quote: parse_category("quote", &self.quote)?,
            oracle_asset: parse_category("oracle_asset", &self.oracle_asset)?,
        };

        let owned = [
            resolved.staking,
            resolved.principal,
            resolved.yield_token,
            resolved.pool,
            resolved.options,
            resolved.oracle,
        ];
        for (i, a) in owned.iter().enumerate() {
            for b in &owned[i + 1..] {
                ensure!(a != b, "Two facets share category {}", a);
            }
            ensure!(
                *a != resolved.quote,
                "Quote category {} is owned by a facet",
                a
            );
        }
        Ok(resolved)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct StakingConfig {
    pub min_stake: u64,
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            min_stake: defaults::staking::MIN_STAKE,
        }
    }
}

/// What merging a PT/YT pair does with yield the YT has accrued
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Pay the accrued yield to the holder from the yield reserve
    #[default]
    Payout,
    /// Discard it
    Forfeit,
    /// Refuse the merge until the yield is claimed
    Reject,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct YieldConfig {
    pub rate_bps: u32,
    pub term_secs: u32,
    pub merge_policy: MergePolicy,
}

impl Default for YieldConfig {
    fn default() -> Self {
        Self {
            rate_bps: defaults::accrual::RATE_BPS,
            term_secs: defaults::accrual::TERM_SECS,
            merge_policy: MergePolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AmmConfig {
    pub fee_bps: u32,
    pub min_tick: i32,
    pub max_tick: i32,
}

impl Default for AmmConfig {
    fn default() -> Self {
        Self {
            fee_bps: defaults::amm::FEE_BPS,
            min_tick: defaults::amm::MIN_TICK,
            max_tick: defaults::amm::MAX_TICK,
        }
    }
}

impl AmmConfig {
    pub fn tick_domain(&self) -> Result<TickDomain> {
        TickDomain::new(self.min_tick, self.max_tick).context("Invalid amm tick domain")
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct OptionsConfig {
    pub collateral_per_contract: u64,
    /// Hex locking bytecode that receives returned collateral
    pub writer: String,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            collateral_per_contract: defaults::options::COLLATERAL_PER_CONTRACT,
            writer: String::new(),
        }
    }
}

impl OptionsConfig {
    pub fn writer_bytecode(&self) -> Result<Vec<u8>> {
        let trimmed = self.writer.strip_prefix("0x").unwrap_or(&self.writer);
        let bytes = hex::decode(trimmed).context("Invalid options.writer")?;
        ensure!(!bytes.is_empty(), "options.writer must not be empty");
        Ok(bytes)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct OracleConfig {
    pub max_price_age_secs: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            max_price_age_secs: defaults::oracle::MAX_PRICE_AGE_SECS,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SubmissionConfig {
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::submission::MAX_RETRIES,
            backoff_ms: defaults::submission::BACKOFF_MS,
        }
    }
}

impl FacetConfig {
    /// Load configuration from files with environment overrides
    ///
    /// Environment files live next to the base file under `environments/`.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let default_path = default_config_path();
        let base = base_path.unwrap_or(&default_path);

        let mut builder = Config::builder().add_source(File::from(base).required(true));

        if let Some(env) = environment {
            let env_file = base
                .parent()
                .unwrap_or(Path::new("."))
                .join("environments")
                .join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Override with environment variables (FACET__SECTION__KEY)
        builder = builder.add_source(
            Environment::with_prefix("FACET")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        debug!(base = ?base, "Configuration loaded");
        Ok(config)
    }

    /// Parse a single TOML document without file or environment layering
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject inconsistent values
    pub fn validate(&self) -> Result<()> {
        self.admin.key_hash()?;
        self.categories.resolve()?;
        self.amm.tick_domain()?;
        self.options.writer_bytecode()?;

        if self.amm.fee_bps > 10_000 {
            bail!("amm.fee_bps {} exceeds 10000", self.amm.fee_bps);
        }
        ensure!(self.accrual.term_secs > 0, "yield.term_secs must be positive");
        ensure!(
            self.options.collateral_per_contract > 0,
            "options.collateral_per_contract must be positive"
        );
        ensure!(
            self.oracle.max_price_age_secs > 0,
            "oracle.max_price_age_secs must be positive"
        );
        if self.accrual.merge_policy == MergePolicy::Forfeit {
            warn!("Merge policy 'forfeit' discards accrued yield on merge");
        }
        Ok(())
    }
}

/// Resolve the base file path, honouring `FACET_CONFIG` when set
pub fn default_config_path() -> PathBuf {
    std::env::var_os("FACET_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config/facet.toml"))
}

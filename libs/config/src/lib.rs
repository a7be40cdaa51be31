//! # Facet Configuration
//!
//! Layered configuration for a Facet deployment: a base TOML file, an optional
//! environment-specific override file, then `FACET__SECTION__KEY` environment
//! variables. Values are plain serde data; the covenant crate turns them into
//! typed deployment parameters.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use facet_config::FacetConfig;
//! use std::path::Path;
//!
//! let config = FacetConfig::load(Some(Path::new("config/facet.toml")), Some("testnet"))?;
//! let categories = config.categories.resolve()?;
//! println!("staking category {}", categories.staking);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod defaults;
pub mod facet_config;

pub use facet_config::{
    default_config_path, AdminConfig, AmmConfig, CategoryConfig, FacetConfig, LedgerConfig, MergePolicy,
    OptionsConfig, OracleConfig, ResolvedCategories, StakingConfig, SubmissionConfig,
    YieldConfig,
};

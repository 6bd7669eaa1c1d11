//! Engine configuration
//!
//! Tunables for every analysis pass, loaded from TOML.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a layered resolution:
//! 1. An explicit path, when given and present
//! 2. Override in data dir (~/.local/share/finflow/config/engine.toml)
//! 3. Embedded defaults (compiled into binary)
//!
//! Keys missing from a file keep their default value.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/engine.toml");

/// Categorizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizerConfig {
    /// Descriptions per external classification request
    pub batch_size: usize,
}

impl Default for CategorizerConfig {
    fn default() -> Self {
        Self { batch_size: 10 }
    }
}

/// Anomaly detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// Percentile (0, 1] used as the per-category threshold
    pub percentile: f64,
    /// Description fragments that mark a transfer/bill payment
    pub payment_keywords: Vec<String>,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            percentile: 0.90,
            payment_keywords: vec![
                "credit card payment".to_string(),
                "cc payment".to_string(),
                "payment - credit card".to_string(),
                "cc pmt".to_string(),
            ],
        }
    }
}

/// Duplicate detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateConfig {
    /// Maximum distance in days between duplicates (0 = same calendar day)
    pub window_days: u32,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self { window_days: 0 }
    }
}

/// Recurrence detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringConfig {
    /// Description prefix length used in the bucket key
    pub prefix_len: usize,
}

impl Default for RecurringConfig {
    fn default() -> Self {
        Self { prefix_len: 15 }
    }
}

/// Budget evaluation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Usage percentage at which a budget is "near limit"
    pub near_limit_percent: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            near_limit_percent: 90.0,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub categorizer: CategorizerConfig,
    pub anomaly: AnomalyConfig,
    pub duplicates: DuplicateConfig,
    pub recurring: RecurringConfig,
    pub budget: BudgetConfig,
}

impl EngineConfig {
    /// Load using the default resolution (data dir override, then embedded)
    pub fn load() -> Result<Self> {
        load_config(None)
    }

    /// Load from an explicit path, falling back to the default resolution
    pub fn load_from(path: &Path) -> Result<Self> {
        load_config(Some(path))
    }

    /// Parse from TOML content, layering it over the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        parse_config(content)
    }

    fn validate(&self) -> Result<()> {
        if !(self.anomaly.percentile > 0.0 && self.anomaly.percentile <= 1.0) {
            return Err(Error::Config(format!(
                "anomaly.percentile must be in (0, 1], got {}",
                self.anomaly.percentile
            )));
        }
        if self.recurring.prefix_len == 0 {
            return Err(Error::Config("recurring.prefix_len must be > 0".into()));
        }
        if !(self.budget.near_limit_percent > 0.0 && self.budget.near_limit_percent <= 100.0) {
            return Err(Error::Config(format!(
                "budget.near_limit_percent must be in (0, 100], got {}",
                self.budget.near_limit_percent
            )));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("finflow").join("config").join("engine.toml"))
}

fn load_config(override_path: Option<&Path>) -> Result<EngineConfig> {
    let candidate = override_path
        .filter(|p| p.exists())
        .map(Path::to_path_buf)
        .or_else(|| default_config_path().filter(|p| p.exists()));

    let content = match candidate {
        Some(path) => {
            debug!(path = %path.display(), "Loading engine config");
            fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?
        }
        None => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    categorizer: Option<RawCategorizer>,
    anomaly: Option<RawAnomaly>,
    duplicates: Option<RawDuplicates>,
    recurring: Option<RawRecurring>,
    budget: Option<RawBudget>,
}

#[derive(Debug, Deserialize)]
struct RawCategorizer {
    batch_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawAnomaly {
    percentile: Option<f64>,
    payment_keywords: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawDuplicates {
    window_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawRecurring {
    prefix_len: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawBudget {
    near_limit_percent: Option<f64>,
}

fn parse_config(content: &str) -> Result<EngineConfig> {
    let raw: RawConfig = toml::from_str(content)?;
    let mut config = EngineConfig::default();

    if let Some(categorizer) = raw.categorizer {
        if let Some(batch_size) = categorizer.batch_size {
            config.categorizer.batch_size = batch_size;
        }
    }

    if let Some(anomaly) = raw.anomaly {
        if let Some(percentile) = anomaly.percentile {
            config.anomaly.percentile = percentile;
        }
        if let Some(keywords) = anomaly.payment_keywords {
            config.anomaly.payment_keywords = keywords;
        }
    }

    if let Some(duplicates) = raw.duplicates {
        if let Some(window_days) = duplicates.window_days {
            config.duplicates.window_days = window_days;
        }
    }

    if let Some(recurring) = raw.recurring {
        if let Some(prefix_len) = recurring.prefix_len {
            config.recurring.prefix_len = prefix_len;
        }
    }

    if let Some(budget) = raw.budget {
        if let Some(near_limit) = budget.near_limit_percent {
            config.budget.near_limit_percent = near_limit;
        }
    }

    config.validate()?;
    Ok(config)
}

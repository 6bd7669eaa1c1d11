//! Budget evaluation against caller-supplied limits

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::BudgetConfig;
use crate::error::{Error, Result};
use crate::models::{Category, Transaction};

/// Category → spending limit
pub type BudgetLimits = HashMap<Category, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    Normal,
    NearLimit,
    Over,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::NearLimit => "near_limit",
            Self::Over => "over",
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetEntry {
    pub category: Category,
    /// 0 when no limit was supplied
    pub limit: f64,
    pub spent: f64,
    /// Only when limit > 0
    pub percentage_used: Option<f64>,
    /// Only when limit > 0; negative when over
    pub remaining: Option<f64>,
    pub status: BudgetStatus,
}

/// Compares per-category expense totals with limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetEvaluator {
    near_limit_percent: f64,
}

impl Default for BudgetEvaluator {
    fn default() -> Self {
        Self::from_config(&BudgetConfig::default())
    }
}

impl BudgetEvaluator {
    pub fn from_config(config: &BudgetConfig) -> Self {
        Self {
            near_limit_percent: config.near_limit_percent,
        }
    }

    /// One entry per category with spend or a limit, ordered by category label
    pub fn evaluate(&self, transactions: &[Transaction], limits: &BudgetLimits) -> Vec<BudgetEntry> {
        let mut spent: BTreeMap<&'static str, (Category, f64)> = BTreeMap::new();

        for tx in transactions {
            if let Some(amount) = tx.expense_amount() {
                spent
                    .entry(tx.category.as_str())
                    .or_insert((tx.category, 0.0))
                    .1 += amount;
            }
        }
        for category in limits.keys() {
            spent.entry(category.as_str()).or_insert((*category, 0.0));
        }

        let entries: Vec<BudgetEntry> = spent
            .into_values()
            .map(|(category, spent)| {
                let limit = limits.get(&category).copied().unwrap_or(0.0);
                self.entry(category, limit, spent)
            })
            .collect();

        debug!("Evaluated {} budget entries", entries.len());
        entries
    }

    fn entry(&self, category: Category, limit: f64, spent: f64) -> BudgetEntry {
        let percentage_used = (limit > 0.0).then(|| spent / limit * 100.0);

        let status = match percentage_used {
            _ if limit > 0.0 && spent > limit => BudgetStatus::Over,
            Some(pct) if pct >= self.near_limit_percent && pct < 100.0 => BudgetStatus::NearLimit,
            _ => BudgetStatus::Normal,
        };

        BudgetEntry {
            category,
            limit,
            spent,
            percentage_used,
            remaining: (limit > 0.0).then(|| limit - spent),
            status,
        }
    }
}

/// Evaluate with the default near-limit threshold
pub fn evaluate_budgets(transactions: &[Transaction], limits: &BudgetLimits) -> Vec<BudgetEntry> {
    BudgetEvaluator::default().evaluate(transactions, limits)
}

/// Read limits from a JSON object keyed by category label
///
/// `{ "Groceries": 300, "Food & Drink": 150 }`
pub fn read_limits<R: Read>(reader: R) -> Result<BudgetLimits> {
    let raw: HashMap<String, f64> = serde_json::from_reader(reader)?;

    let mut limits = BudgetLimits::new();
    for (label, amount) in raw {
        let category: Category = label.parse().map_err(Error::InvalidInput)?;
        if !amount.is_finite() {
            return Err(Error::InvalidInput(format!(
                "limit for {} is not a finite number",
                label
            )));
        }
        if amount <= 0.0 {
            warn!(category = %category, amount, "Non-positive limit is treated as no limit");
        }
        limits.insert(category, amount);
    }

    Ok(limits)
}

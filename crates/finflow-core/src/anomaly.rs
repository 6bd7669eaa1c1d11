//! Per-category outlier detection
//!
//! Thresholds are a percentile of absolute expense amounts within each
//! category, always computed from the full transaction set.

use std::collections::HashMap;

use tracing::debug;

use crate::config::AnomalyConfig;
use crate::models::{Category, Transaction};

/// Recognises transfers and card bill payments, which are never outliers
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentFilter {
    keywords: Vec<String>,
}

impl PaymentFilter {
    pub fn new<K: Into<String>>(keywords: impl IntoIterator<Item = K>) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn is_payment(&self, description: &str) -> bool {
        let lower = description.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

impl Default for PaymentFilter {
    fn default() -> Self {
        Self::new(AnomalyConfig::default().payment_keywords)
    }
}

/// Flags expenses above their category's percentile threshold
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyDetector {
    thresholds: HashMap<Category, f64>,
    filter: PaymentFilter,
}

impl AnomalyDetector {
    /// Compute thresholds from the full set
    pub fn new(transactions: &[Transaction], config: &AnomalyConfig) -> Self {
        let filter = PaymentFilter::new(config.payment_keywords.iter().cloned());

        let mut amounts: HashMap<Category, Vec<f64>> = HashMap::new();
        for tx in transactions {
            if let Some(amount) = eligible_amount(tx, &filter) {
                amounts.entry(tx.category).or_default().push(amount);
            }
        }

        let thresholds: HashMap<Category, f64> = amounts
            .into_iter()
            .map(|(category, mut values)| {
                values.sort_by(|a, b| a.total_cmp(b));
                (category, percentile_value(&values, config.percentile))
            })
            .collect();

        debug!("Computed anomaly thresholds for {} categories", thresholds.len());

        Self { thresholds, filter }
    }

    /// Threshold for a category; +∞ when it has no qualifying expenses
    pub fn threshold(&self, category: Category) -> f64 {
        self.thresholds
            .get(&category)
            .copied()
            .unwrap_or(f64::INFINITY)
    }

    pub fn thresholds(&self) -> &HashMap<Category, f64> {
        &self.thresholds
    }

    pub fn is_unusual(&self, tx: &Transaction) -> bool {
        match eligible_amount(tx, &self.filter) {
            Some(amount) => amount > self.threshold(tx.category),
            None => false,
        }
    }

    /// One flag per transaction, in input order
    pub fn flags(&self, transactions: &[Transaction]) -> Vec<bool> {
        transactions.iter().map(|tx| self.is_unusual(tx)).collect()
    }
}

/// Absolute amount of an expense that is not a payment
fn eligible_amount(tx: &Transaction, filter: &PaymentFilter) -> Option<f64> {
    if filter.is_payment(&tx.description) {
        return None;
    }
    tx.expense_amount()
}

/// Value at index floor(p * n), clamped to the last element
fn percentile_value(sorted: &[f64], percentile: f64) -> f64 {
    if sorted.is_empty() {
        return f64::INFINITY;
    }
    let idx = ((percentile * sorted.len() as f64).floor() as usize).min(sorted.len() - 1);
    sorted[idx]
}

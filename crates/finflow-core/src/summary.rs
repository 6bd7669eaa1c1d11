//! Dashboard totals

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::models::{Category, Transaction};

/// Income/expense totals for a transaction set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpendingSummary {
    /// Sum of positive amounts
    pub income: f64,
    /// Sum of absolute negative amounts
    pub expenses: f64,
    pub net: f64,
    pub count: usize,
    /// Transactions whose amount did not parse (counted as 0)
    pub malformed: usize,
}

pub fn summarize(transactions: &[Transaction]) -> SpendingSummary {
    let mut summary = SpendingSummary {
        count: transactions.len(),
        ..Default::default()
    };

    for tx in transactions {
        match tx.amount_value() {
            Ok(amount) if amount > 0.0 => summary.income += amount,
            Ok(amount) => summary.expenses += amount.abs(),
            Err(e) => {
                debug!(error = %e, "Amount excluded from totals");
                summary.malformed += 1;
            }
        }
    }

    summary.net = summary.income - summary.expenses;
    summary
}

/// Absolute amount per category, largest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
    pub count: usize,
}

pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<Category, (f64, usize)> = HashMap::new();
    for tx in transactions {
        let amount = tx.amount_value().map(f64::abs).unwrap_or(0.0);
        let entry = totals.entry(tx.category).or_default();
        entry.0 += amount;
        entry.1 += 1;
    }

    let mut breakdown: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category,
            total,
            count,
        })
        .collect();
    // Ties fall back to label order so output is stable
    breakdown.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });
    breakdown
}

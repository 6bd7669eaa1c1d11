//! Recurring charge detection
//!
//! Expenses are bucketed by a heuristic key (description prefix plus rounded
//! amount). A bucket with two or more dated members whose average gap falls
//! inside a cadence band becomes a [`RecurringGroup`].
//!
//! The default key is deliberately coarse: two different merchants sharing a
//! 15-character prefix and a rounded amount land in the same bucket.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::config::RecurringConfig;
use crate::models::Transaction;

/// Billing cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Cadence {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Cadence {
    /// Classify an average gap in days using inclusive bands
    pub fn classify(avg_gap_days: f64) -> Option<Self> {
        match avg_gap_days {
            d if (6.0..=8.0).contains(&d) => Some(Self::Weekly),
            d if (25.0..=35.0).contains(&d) => Some(Self::Monthly),
            d if (85.0..=95.0).contains(&d) => Some(Self::Quarterly),
            d if (350.0..=380.0).contains(&d) => Some(Self::Yearly),
            _ => None,
        }
    }

    /// Multiplier from one charge to a monthly cost
    pub fn monthly_factor(&self) -> f64 {
        match self {
            Self::Weekly => 4.33,
            Self::Monthly => 1.0,
            Self::Quarterly => 1.0 / 3.0,
            Self::Yearly => 1.0 / 12.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Quarterly => "Quarterly",
            Self::Yearly => "Yearly",
        }
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Maps an expense to its grouping key
pub trait BucketStrategy {
    /// `None` keeps the transaction out of every bucket
    fn bucket_key(&self, description: &str, abs_amount: f64) -> Option<String>;
}

/// Lower-cased, trimmed description prefix plus the rounded absolute amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixAmountBucket {
    pub prefix_len: usize,
}

impl Default for PrefixAmountBucket {
    fn default() -> Self {
        Self {
            prefix_len: RecurringConfig::default().prefix_len,
        }
    }
}

impl BucketStrategy for PrefixAmountBucket {
    fn bucket_key(&self, description: &str, abs_amount: f64) -> Option<String> {
        let prefix: String = description
            .trim()
            .to_lowercase()
            .chars()
            .take(self.prefix_len)
            .collect();
        Some(format!("{}_{}", prefix, abs_amount.round() as i64))
    }
}

/// A detected recurring charge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringGroup {
    /// Description of the earliest member
    pub description: String,
    /// Absolute amount of the earliest member
    pub amount: f64,
    pub cadence: Cadence,
    /// Members sorted by date ascending
    pub transactions: Vec<Transaction>,
    pub next_charge_date: NaiveDate,
    pub monthly_equivalent: f64,
}

impl RecurringGroup {
    pub fn yearly_equivalent(&self) -> f64 {
        self.monthly_equivalent * 12.0
    }
}

/// Groups expenses into recurring charges
#[derive(Debug, Clone, Default)]
pub struct RecurrenceDetector<B = PrefixAmountBucket> {
    strategy: B,
}

impl RecurrenceDetector<PrefixAmountBucket> {
    pub fn from_config(config: &RecurringConfig) -> Self {
        Self::new(PrefixAmountBucket {
            prefix_len: config.prefix_len,
        })
    }
}

impl<B: BucketStrategy> RecurrenceDetector<B> {
    pub fn new(strategy: B) -> Self {
        Self { strategy }
    }

    /// Detect recurring groups, ordered by bucket key
    pub fn detect(&self, transactions: &[Transaction]) -> Vec<RecurringGroup> {
        let mut buckets: BTreeMap<String, Vec<(NaiveDate, &Transaction)>> = BTreeMap::new();

        for tx in transactions {
            let Some(abs_amount) = tx.expense_amount() else {
                continue;
            };
            // Undated expenses cannot contribute to interval math
            let Ok(date) = tx.parsed_date() else {
                continue;
            };
            if let Some(key) = self.strategy.bucket_key(&tx.description, abs_amount) {
                buckets.entry(key).or_default().push((date, tx));
            }
        }

        let groups: Vec<RecurringGroup> = buckets
            .into_values()
            .filter(|members| members.len() >= 2)
            .filter_map(build_group)
            .collect();

        debug!("Detected {} recurring groups", groups.len());
        groups
    }
}

fn build_group(mut members: Vec<(NaiveDate, &Transaction)>) -> Option<RecurringGroup> {
    // Stable: same-day members keep input order
    members.sort_by_key(|(date, _)| *date);

    let gaps: Vec<i64> = members
        .windows(2)
        .map(|w| (w[1].0 - w[0].0).num_days())
        .collect();
    let avg_gap = gaps.iter().sum::<i64>() as f64 / gaps.len() as f64;
    let cadence = Cadence::classify(avg_gap)?;

    let (_, first) = members.first()?;
    let (last_date, _) = members.last()?;
    let amount = first.expense_amount()?;

    Some(RecurringGroup {
        description: first.description.clone(),
        amount,
        cadence,
        next_charge_date: *last_date + Duration::days(avg_gap.round() as i64),
        monthly_equivalent: amount * cadence.monthly_factor(),
        transactions: members.into_iter().map(|(_, tx)| tx.clone()).collect(),
    })
}

/// Detect with the default bucket strategy
pub fn detect_recurring(transactions: &[Transaction]) -> Vec<RecurringGroup> {
    RecurrenceDetector::<PrefixAmountBucket>::default().detect(transactions)
}

/// Sum of monthly equivalents
pub fn total_monthly_cost(groups: &[RecurringGroup]) -> f64 {
    groups.iter().map(|g| g.monthly_equivalent).sum()
}

/// Per-transaction hint that a charge repeats unusually soon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "days", rename_all = "snake_case")]
pub enum RecurrenceWarning {
    /// Fewer than 14 days since the previous similar charge
    ShortInterval(i64),
    /// 14 to 29 days since the previous similar charge
    PossiblyBiweekly,
}

impl std::fmt::Display for RecurrenceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShortInterval(days) => write!(f, "{}d", days),
            Self::PossiblyBiweekly => write!(f, "bi-weekly?"),
        }
    }
}

/// Recurrence warning for every transaction, in input order
///
/// Similar transactions share a case-insensitive description and have absolute
/// amounts less than 1.00 apart.
pub fn recurrence_warnings(transactions: &[Transaction]) -> Vec<Option<RecurrenceWarning>> {
    let keyed: Vec<Option<(String, f64, NaiveDate)>> = transactions
        .iter()
        .map(|tx| {
            let amount = tx.amount_value().ok()?.abs();
            let date = tx.parsed_date().ok()?;
            Some((tx.description.to_lowercase(), amount, date))
        })
        .collect();

    keyed
        .iter()
        .map(|target| {
            let (description, amount, date) = target.as_ref()?;

            let similar: Vec<NaiveDate> = keyed
                .iter()
                .flatten()
                .filter(|(d, a, _)| d == description && (a - amount).abs() < 1.0)
                .map(|(_, _, date)| *date)
                .collect();
            if similar.len() < 2 {
                return None;
            }

            let previous = similar.iter().filter(|d| *d < date).max()?;
            warning_for_gap((*date - *previous).num_days())
        })
        .collect()
}

fn warning_for_gap(days: i64) -> Option<RecurrenceWarning> {
    match days {
        d if d < 14 => Some(RecurrenceWarning::ShortInterval(d)),
        14..=29 => Some(RecurrenceWarning::PossiblyBiweekly),
        _ => None,
    }
}

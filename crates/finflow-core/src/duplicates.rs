//! Duplicate charge detection
//!
//! Two transactions are duplicates when their descriptions match
//! case-insensitively, their amount text matches exactly and their dates fall
//! within `window_days` of each other.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::config::DuplicateConfig;
use crate::models::Transaction;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicateDetector {
    window_days: u32,
}

impl DuplicateDetector {
    pub fn new(window_days: u32) -> Self {
        Self { window_days }
    }

    pub fn from_config(config: &DuplicateConfig) -> Self {
        Self::new(config.window_days)
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    /// One flag per transaction, in input order
    pub fn flags(&self, transactions: &[Transaction]) -> Vec<bool> {
        self.matches(transactions)
            .into_iter()
            .map(|m| m.is_some())
            .collect()
    }

    /// Index of the nearest matching transaction, per transaction
    ///
    /// Ties go to the earlier date. A transaction with an unparsable date never
    /// matches anything.
    pub fn matches(&self, transactions: &[Transaction]) -> Vec<Option<usize>> {
        let mut groups: HashMap<(String, &str), Vec<(NaiveDate, usize)>> = HashMap::new();
        for (idx, tx) in transactions.iter().enumerate() {
            let Ok(date) = tx.parsed_date() else {
                continue;
            };
            groups
                .entry((tx.description.to_lowercase(), tx.amount.as_str()))
                .or_default()
                .push((date, idx));
        }

        let mut result = vec![None; transactions.len()];

        for members in groups.values_mut().filter(|m| m.len() > 1) {
            members.sort();

            for pos in 0..members.len() {
                let (date, idx) = members[pos];
                let gap = |other: usize| (members[other].0 - date).num_days().unsigned_abs();

                let prev = pos.checked_sub(1).map(|p| (gap(p), p));
                let next = (pos + 1 < members.len()).then(|| (gap(pos + 1), pos + 1));

                let nearest = match (prev, next) {
                    (Some(p), Some(n)) => Some(if n.0 < p.0 { n } else { p }),
                    (p, n) => p.or(n),
                };

                if let Some((days, other)) = nearest {
                    if days <= u64::from(self.window_days) {
                        result[idx] = Some(members[other].1);
                    }
                }
            }
        }

        debug!(
            "Flagged {} possible duplicates",
            result.iter().filter(|m| m.is_some()).count()
        );
        result
    }
}

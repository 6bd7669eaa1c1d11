//! End-to-end analysis
//!
//! Normalize, categorize, then run every read-only pass over the categorized
//! snapshot. Each pass sees the same data and none depends on another.

use serde::Serialize;
use tracing::info;

use crate::ai::AIClient;
use crate::anomaly::AnomalyDetector;
use crate::budget::{BudgetEntry, BudgetEvaluator, BudgetLimits};
use crate::categorize::{BatchWarning, CategorizeOutcome, CategorySource, Categorizer, KeywordTable};
use crate::config::EngineConfig;
use crate::duplicates::DuplicateDetector;
use crate::error::Result;
use crate::models::Transaction;
use crate::normalize::{Normalizer, RawTable, RejectedRow, SignConvention};
use crate::recurring::{
    recurrence_warnings, total_monthly_cost, RecurrenceDetector, RecurrenceWarning,
    RecurringGroup,
};
use crate::summary::{category_breakdown, summarize, CategoryTotal, SpendingSummary};

/// Per-transaction flags
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Annotation {
    pub is_unusual: bool,
    pub is_duplicate: bool,
    /// Index of the nearest duplicate
    pub duplicate_of: Option<usize>,
    pub recurrence_warning: Option<RecurrenceWarning>,
}

/// Annotate a categorized snapshot; output is parallel to the input
pub fn annotate_transactions(transactions: &[Transaction], config: &EngineConfig) -> Vec<Annotation> {
    let anomalies = AnomalyDetector::new(transactions, &config.anomaly).flags(transactions);
    let duplicates = DuplicateDetector::from_config(&config.duplicates).matches(transactions);
    let warnings = recurrence_warnings(transactions);

    anomalies
        .into_iter()
        .zip(duplicates)
        .zip(warnings)
        .map(|((is_unusual, duplicate_of), recurrence_warning)| Annotation {
            is_unusual,
            is_duplicate: duplicate_of.is_some(),
            duplicate_of,
            recurrence_warning,
        })
        .collect()
}

/// Everything one analysis run produces
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub transactions: Vec<Transaction>,
    /// Parallel to `transactions`
    pub sources: Vec<CategorySource>,
    /// Parallel to `transactions`
    pub annotations: Vec<Annotation>,
    pub recurring: Vec<RecurringGroup>,
    pub recurring_monthly_total: f64,
    pub budgets: Vec<BudgetEntry>,
    pub summary: SpendingSummary,
    pub breakdown: Vec<CategoryTotal>,
    pub rejected_rows: Vec<RejectedRow>,
    pub warnings: Vec<BatchWarning>,
}

impl AnalysisReport {
    pub fn unusual_count(&self) -> usize {
        self.annotations.iter().filter(|a| a.is_unusual).count()
    }

    pub fn duplicate_count(&self) -> usize {
        self.annotations.iter().filter(|a| a.is_duplicate).count()
    }
}

/// Runs the whole engine with one configuration
#[derive(Clone)]
pub struct Analyzer {
    config: EngineConfig,
    categorizer: Categorizer,
}

impl Analyzer {
    pub fn new(config: EngineConfig) -> Self {
        let categorizer =
            Categorizer::new(KeywordTable::builtin()).with_batch_size(config.categorizer.batch_size);
        Self {
            config,
            categorizer,
        }
    }

    pub fn with_classifier(mut self, classifier: AIClient) -> Self {
        self.categorizer = self.categorizer.with_classifier(classifier);
        self
    }

    pub fn with_keywords(mut self, table: KeywordTable) -> Self {
        let categorizer = Categorizer::new(table).with_batch_size(self.categorizer.batch_size());
        self.categorizer = match self.categorizer.classifier() {
            Some(classifier) => categorizer.with_classifier(classifier.clone()),
            None => categorizer,
        };
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn categorizer(&self) -> &Categorizer {
        &self.categorizer
    }

    /// Normalize and categorize only
    pub async fn categorize(
        &self,
        table: &RawTable,
        sign: SignConvention,
    ) -> Result<(CategorizeOutcome, Vec<RejectedRow>)> {
        let normalized = Normalizer::new(sign).normalize(table)?;
        let outcome = self.categorizer.categorize(normalized.transactions).await;
        Ok((outcome, normalized.rejected))
    }

    /// Full pipeline
    ///
    /// Only a header set without date, description and amount columns fails;
    /// everything else degrades and is reported in the result.
    pub async fn analyze(
        &self,
        table: &RawTable,
        sign: SignConvention,
        limits: &BudgetLimits,
    ) -> Result<AnalysisReport> {
        let (outcome, rejected_rows) = self.categorize(table, sign).await?;
        let report = self.analyze_categorized(outcome, rejected_rows, limits);

        info!(
            transactions = report.transactions.len(),
            rejected = report.rejected_rows.len(),
            unusual = report.unusual_count(),
            duplicates = report.duplicate_count(),
            recurring = report.recurring.len(),
            "Analysis complete"
        );
        Ok(report)
    }

    /// Run the read-only passes over an already categorized snapshot
    pub fn analyze_categorized(
        &self,
        outcome: CategorizeOutcome,
        rejected_rows: Vec<RejectedRow>,
        limits: &BudgetLimits,
    ) -> AnalysisReport {
        let CategorizeOutcome {
            transactions,
            sources,
            warnings,
        } = outcome;

        let annotations = annotate_transactions(&transactions, &self.config);
        let recurring = RecurrenceDetector::from_config(&self.config.recurring).detect(&transactions);
        let budgets = BudgetEvaluator::from_config(&self.config.budget).evaluate(&transactions, limits);

        AnalysisReport {
            recurring_monthly_total: total_monthly_cost(&recurring),
            summary: summarize(&transactions),
            breakdown: category_breakdown(&transactions),
            transactions,
            sources,
            annotations,
            recurring,
            budgets,
            rejected_rows,
            warnings,
        }
    }
}

//! FinFlow Core Library
//!
//! Transaction intelligence engine for the FinFlow personal finance tool:
//! - Statement normalization (column aliases, sign conventions)
//! - Keyword categorization with a batched external classifier fallback
//! - Per-category anomaly thresholds
//! - Duplicate and recurring charge detection
//! - Budget evaluation against caller-supplied limits
//! - Free-form statement questions answered by the AI backend

pub mod ai;
pub mod analyze;
pub mod anomaly;
pub mod budget;
pub mod categorize;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod insights;
pub mod models;
pub mod normalize;
pub mod recurring;
pub mod summary;

/// Test utilities including mock classifier server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, MockBackend, OpenAICompatibleBackend};
pub use analyze::{annotate_transactions, AnalysisReport, Analyzer, Annotation};
pub use anomaly::{AnomalyDetector, PaymentFilter};
pub use budget::{
    evaluate_budgets, read_limits, BudgetEntry, BudgetEvaluator, BudgetLimits, BudgetStatus,
};
pub use categorize::{
    BatchWarning, CategorizeOutcome, CategorySource, Categorizer, KeywordTable,
};
pub use config::EngineConfig;
pub use duplicates::DuplicateDetector;
pub use error::{Error, Result};
pub use insights::{ask_insights, InsightAnswer};
pub use models::{Category, Transaction};
pub use normalize::{read_csv, Normalizer, RawRow, RawTable, RejectedRow, SignConvention};
pub use recurring::{
    detect_recurring, recurrence_warnings, total_monthly_cost, BucketStrategy, Cadence,
    PrefixAmountBucket, RecurrenceDetector, RecurrenceWarning, RecurringGroup,
};
pub use summary::{category_breakdown, summarize, CategoryTotal, SpendingSummary};

//! Category assignment
//!
//! Two tiers:
//! 1. Keyword table: lower-cased description scanned against an ordered
//!    keyword → category list; the first hit wins.
//! 2. External classifier: descriptions the table misses are sent in fixed-size
//!    batches. A failed or misaligned batch degrades to "Other" on its own;
//!    neighbouring batches are unaffected.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ai::{AIBackend, AIClient};
use crate::error::Error;
use crate::models::{Category, Transaction};

/// Default batch size for external classification
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Built-in keyword table. Order is significant: first match wins.
const DEFAULT_KEYWORDS: &[(&str, Category)] = &[
    ("starbucks", Category::FoodAndDrink),
    ("walmart", Category::Shopping),
    ("uber", Category::Transport),
    ("netflix", Category::Entertainment),
    ("apple", Category::Shopping),
    ("salary", Category::Income),
    ("domino", Category::FoodAndDrink),
    ("amazon", Category::Shopping),
    ("shell", Category::Transport),
    ("spotify", Category::Entertainment),
    ("target", Category::Groceries),
    ("electric", Category::Utilities),
    ("rent", Category::Rent),
    ("freelance", Category::Income),
    ("kfc", Category::FoodAndDrink),
    ("mcdonald", Category::FoodAndDrink),
    ("costco", Category::Groceries),
    ("airbnb", Category::Travel),
    ("youtube", Category::Entertainment),
    ("stripe", Category::Income),
    ("water", Category::Utilities),
    ("bus", Category::Transport),
    ("insurance", Category::Bills),
    ("lyft", Category::Transport),
    ("google", Category::Services),
    ("cloud", Category::Services),
];

/// Immutable, ordered keyword → category table
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordTable {
    rules: Vec<(String, Category)>,
}

impl KeywordTable {
    /// Build a table; keywords are matched case-insensitively
    pub fn new<K: Into<String>>(rules: impl IntoIterator<Item = (K, Category)>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|(k, c)| (k.into().to_lowercase(), c))
                .filter(|(k, _)| !k.is_empty())
                .collect(),
        }
    }

    /// The built-in table
    pub fn builtin() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().map(|(k, c)| (*k, *c)))
    }

    /// First matching rule's category
    pub fn lookup(&self, description: &str) -> Option<Category> {
        let lower = description.to_lowercase();
        self.rules
            .iter()
            .find(|(keyword, _)| lower.contains(keyword.as_str()))
            .map(|(_, category)| *category)
    }

    pub fn rules(&self) -> &[(String, Category)] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Where a transaction's category came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CategorySource {
    Keyword,
    Classifier,
    /// No rule matched, no classifier, or the classifier batch failed
    Fallback,
}

impl CategorySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Classifier => "classifier",
            Self::Fallback => "fallback",
        }
    }
}

/// Soft warning for a degraded classification batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchWarning {
    /// Zero-based batch number
    pub batch: usize,
    /// Descriptions in the batch (all set to "Other")
    pub size: usize,
    pub reason: String,
}

/// Result of categorizing a collection
#[derive(Debug, Clone, Default)]
pub struct CategorizeOutcome {
    pub transactions: Vec<Transaction>,
    /// Parallel to `transactions`
    pub sources: Vec<CategorySource>,
    pub warnings: Vec<BatchWarning>,
}

impl CategorizeOutcome {
    /// How many transactions got their category from `source`
    pub fn source_count(&self, source: CategorySource) -> usize {
        self.sources.iter().filter(|s| **s == source).count()
    }
}

/// Assigns categories via keywords with an optional classifier fallback
#[derive(Clone)]
pub struct Categorizer {
    table: KeywordTable,
    classifier: Option<AIClient>,
    batch_size: usize,
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new(KeywordTable::builtin())
    }
}

impl Categorizer {
    pub fn new(table: KeywordTable) -> Self {
        Self {
            table,
            classifier: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_classifier(mut self, classifier: AIClient) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Set the batch size (0 is treated as 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn table(&self) -> &KeywordTable {
        &self.table
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn classifier(&self) -> Option<&AIClient> {
        self.classifier.as_ref()
    }

    /// Keyword tier only
    pub fn keyword_category(&self, description: &str) -> Option<Category> {
        self.table.lookup(description)
    }

    /// Keyword tier only, in place. Misses become "Other".
    pub fn categorize_keywords(&self, transactions: &mut [Transaction]) {
        for tx in transactions.iter_mut() {
            tx.category = self
                .keyword_category(&tx.description)
                .unwrap_or(Category::Other);
        }
    }

    /// Both tiers
    ///
    /// Never fails: classifier trouble is reported through `warnings`.
    pub async fn categorize(&self, mut transactions: Vec<Transaction>) -> CategorizeOutcome {
        let mut sources = Vec::with_capacity(transactions.len());
        let mut pending = Vec::new();

        for (idx, tx) in transactions.iter_mut().enumerate() {
            match self.keyword_category(&tx.description) {
                Some(category) => {
                    tx.category = category;
                    sources.push(CategorySource::Keyword);
                }
                None => {
                    tx.category = Category::Other;
                    sources.push(CategorySource::Fallback);
                    pending.push(idx);
                }
            }
        }

        let mut warnings = Vec::new();

        if let Some(classifier) = &self.classifier {
            for (batch, chunk) in pending.chunks(self.batch_size).enumerate() {
                let descriptions: Vec<String> = chunk
                    .iter()
                    .map(|&i| transactions[i].description.clone())
                    .collect();

                match classify_aligned(classifier, batch, &descriptions).await {
                    Ok(labels) => {
                        for (&i, label) in chunk.iter().zip(labels) {
                            transactions[i].category = Category::from_label(&label);
                            sources[i] = CategorySource::Classifier;
                        }
                    }
                    Err(e) => {
                        warn!(batch, size = chunk.len(), error = %e, "Classification batch degraded to Other");
                        warnings.push(BatchWarning {
                            batch,
                            size: chunk.len(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        } else if !pending.is_empty() {
            debug!(
                "{} transactions unmatched and no classifier configured",
                pending.len()
            );
        }

        let outcome = CategorizeOutcome {
            transactions,
            sources,
            warnings,
        };

        info!(
            total = outcome.transactions.len(),
            keyword = outcome.source_count(CategorySource::Keyword),
            classified = outcome.source_count(CategorySource::Classifier),
            fallback = outcome.source_count(CategorySource::Fallback),
            degraded_batches = outcome.warnings.len(),
            "Categorization complete"
        );

        outcome
    }
}

/// One batch call whose response must line up with the request
async fn classify_aligned(
    classifier: &AIClient,
    batch: usize,
    descriptions: &[String],
) -> crate::error::Result<Vec<String>> {
    let labels = classifier
        .classify_batch(descriptions)
        .await
        .map_err(|e| Error::ClassificationBatch {
            batch,
            reason: e.to_string(),
        })?;

    if labels.len() != descriptions.len() {
        return Err(Error::ClassificationBatch {
            batch,
            reason: format!(
                "expected {} labels, got {}",
                descriptions.len(),
                labels.len()
            ),
        });
    }

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;

    fn tx(description: &str) -> Transaction {
        Transaction::new("2024-01-01", description, "-10.00")
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let categorizer = Categorizer::default();
        assert_eq!(
            categorizer.keyword_category("UBER TRIP 12345"),
            Some(Category::Transport)
        );
        assert_eq!(
            categorizer.keyword_category("Starbucks #442"),
            Some(Category::FoodAndDrink)
        );
        assert_eq!(categorizer.keyword_category("Corner Deli"), None);
    }

    #[test]
    fn test_first_match_wins() {
        // "uber eats" would be food if order were ignored
        let table = KeywordTable::new([("uber", Category::Transport), ("eats", Category::FoodAndDrink)]);
        assert_eq!(table.lookup("UBER EATS"), Some(Category::Transport));

        let reversed =
            KeywordTable::new([("eats", Category::FoodAndDrink), ("uber", Category::Transport)]);
        assert_eq!(reversed.lookup("UBER EATS"), Some(Category::FoodAndDrink));
    }

    #[test]
    fn test_builtin_order_is_contractual() {
        let table = KeywordTable::builtin();
        assert_eq!(table.lookup("Apple Store Rent-to-own"), Some(Category::Shopping));
        assert_eq!(table.lookup("Monthly rent"), Some(Category::Rent));
        assert_eq!(table.rules()[0].0, "starbucks");
        assert_eq!(table.len(), 26);
    }

    #[test]
    fn test_categorize_keywords_in_place() {
        let mut txs = vec![tx("NETFLIX.COM"), tx("Bob's Barbershop")];
        Categorizer::default().categorize_keywords(&mut txs);
        assert_eq!(txs[0].category, Category::Entertainment);
        assert_eq!(txs[1].category, Category::Other);
    }

    #[tokio::test]
    async fn test_keyword_hit_skips_classifier() {
        let mock = MockBackend::new();
        let categorizer = Categorizer::default().with_classifier(AIClient::Mock(mock.clone()));

        let outcome = categorizer.categorize(vec![tx("UBER TRIP 12345")]).await;

        assert_eq!(outcome.transactions[0].category, Category::Transport);
        assert_eq!(outcome.sources[0], CategorySource::Keyword);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_classifier_fallback_and_coercion() {
        let mock = MockBackend::new();
        let categorizer = Categorizer::default().with_classifier(AIClient::Mock(mock.clone()));

        let outcome = categorizer
            .categorize(vec![tx("Joe's Pizza"), tx("SPOTIFY"), tx("PETCO 123")])
            .await;

        assert_eq!(outcome.transactions[0].category, Category::FoodAndDrink);
        assert_eq!(outcome.sources[0], CategorySource::Classifier);
        assert_eq!(outcome.transactions[1].category, Category::Entertainment);
        // "Pets" is not a category
        assert_eq!(outcome.transactions[2].category, Category::Other);
        assert_eq!(mock.calls(), 1);
        assert!(outcome.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_failed_batch_is_isolated() {
        let mock = MockBackend::new().failing_on("boom");
        let categorizer = Categorizer::default()
            .with_classifier(AIClient::Mock(mock.clone()))
            .with_batch_size(2);

        // Batches: [pizza, boom] [hotel, cafe]
        let outcome = categorizer
            .categorize(vec![
                tx("Joe's Pizza"),
                tx("BOOM LLC"),
                tx("Hilton Hotel"),
                tx("Corner Cafe"),
            ])
            .await;

        let categories: Vec<Category> = outcome.transactions.iter().map(|t| t.category).collect();
        assert_eq!(
            categories,
            vec![
                Category::Other,
                Category::Other,
                Category::Travel,
                Category::FoodAndDrink
            ]
        );
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].batch, 0);
        assert_eq!(outcome.warnings[0].size, 2);
        assert_eq!(outcome.sources[0], CategorySource::Fallback);
        assert_eq!(outcome.source_count(CategorySource::Classifier), 2);
        assert_eq!(outcome.source_count(CategorySource::Fallback), 2);
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_misaligned_batch_degrades() {
        let mock = MockBackend::new().misaligned_on("short");
        let categorizer = Categorizer::default().with_classifier(AIClient::Mock(mock));

        let outcome = categorizer
            .categorize(vec![tx("Joe's Pizza"), tx("short response")])
            .await;

        assert_eq!(outcome.transactions[0].category, Category::Other);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].reason.contains("expected 2 labels"));
    }

    #[tokio::test]
    async fn test_batches_are_fixed_size() {
        let mock = MockBackend::new();
        let categorizer = Categorizer::default().with_classifier(AIClient::Mock(mock.clone()));

        let txs: Vec<Transaction> = (0..25).map(|i| tx(&format!("Vendor {}", i))).collect();
        let outcome = categorizer.categorize(txs).await;

        assert_eq!(outcome.transactions.len(), 25);
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_without_classifier_unmatched_is_other() {
        let outcome = Categorizer::default()
            .categorize(vec![tx("Joe's Pizza")])
            .await;
        assert_eq!(outcome.transactions[0].category, Category::Other);
        assert_eq!(outcome.sources[0], CategorySource::Fallback);
        assert_eq!(outcome.source_count(CategorySource::Classifier), 0);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_zero_batch_size_clamped() {
        assert_eq!(Categorizer::default().with_batch_size(0).batch_size(), 1);
    }
}

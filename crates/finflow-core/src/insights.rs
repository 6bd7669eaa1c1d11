//! Free-form questions about a statement
//!
//! The engine's own passes are deterministic. This is the one place where a
//! language model answers in prose, using the categorized transactions as its
//! only context.

use serde::Serialize;
use tracing::info;

use crate::ai::AIBackend;
use crate::error::{Error, Result};
use crate::models::Transaction;

/// A backend's answer to one question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightAnswer {
    pub question: String,
    pub answer: String,
    pub model: String,
}

/// Ask `backend` a question about `transactions`
///
/// Empty questions and empty statements are rejected before any call is made.
pub async fn ask_insights<B: AIBackend + ?Sized>(
    backend: &B,
    question: &str,
    transactions: &[Transaction],
) -> Result<InsightAnswer> {
    let question = question.trim();
    if question.is_empty() {
        return Err(Error::InvalidInput("question is empty".into()));
    }
    if transactions.is_empty() {
        return Err(Error::InvalidInput("no transactions to ask about".into()));
    }

    let answer = backend.answer_question(question, transactions).await?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(Error::InvalidData(format!(
            "{} returned an empty answer",
            backend.model()
        )));
    }

    info!(
        model = backend.model(),
        transactions = transactions.len(),
        "Answered question"
    );

    Ok(InsightAnswer {
        question: question.to_string(),
        answer: answer.to_string(),
        model: backend.model().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AIClient, MockBackend};
    use crate::models::Category;
    use crate::test_utils::MockClassifierServer;

    fn statement() -> Vec<Transaction> {
        vec![
            Transaction::new("2024-03-01", "Joe's Pizza", "-18.00")
                .with_category(Category::FoodAndDrink),
            Transaction::new("2024-03-05", "Hilton Hotel", "-310.00").with_category(Category::Travel),
            Transaction::new("2024-03-15", "SALARY", "2500.00").with_category(Category::Income),
        ]
    }

    #[tokio::test]
    async fn test_mock_answer_uses_transactions() {
        let client = AIClient::mock();
        let answer = ask_insights(&client, "  Where did my money go?  ", &statement())
            .await
            .unwrap();

        assert_eq!(answer.question, "Where did my money go?");
        assert_eq!(answer.model, "mock");
        assert!(answer.answer.contains("3 transactions"));
        assert!(answer.answer.contains("Hilton Hotel ($310.00)"));
    }

    #[tokio::test]
    async fn test_rejects_empty_question_without_calling() {
        let mock = MockBackend::new();
        let result = ask_insights(&mock, "   ", &statement()).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let result = ask_insights(&mock, "How much?", &[]).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let mock = MockBackend::new().failing_on("boom");
        let result = ask_insights(&mock, "boom?", &statement()).await;
        assert!(matches!(result, Err(Error::InvalidData(_))));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_answer_from_mock_server() {
        let server = MockClassifierServer::start().await;
        let client = AIClient::openai_compatible(&server.url(), "test-model");

        let answer = ask_insights(&client, "What did I spend on travel?", &statement())
            .await
            .unwrap();
        assert_eq!(answer.model, "test-model");
        assert_eq!(
            answer.answer,
            "You asked \"What did I spend on travel?\" about 3 transactions."
        );

        let failed = ask_insights(&client, "Please fail", &statement()).await;
        assert!(failed.is_err());
    }
}

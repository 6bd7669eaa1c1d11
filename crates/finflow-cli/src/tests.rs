//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;
use std::path::Path;

use finflow_core::test_utils::MockClassifierServer;
use finflow_core::{AIClient, Category, CategorySource, EngineConfig, MockBackend, SignConvention};
use tempfile::NamedTempFile;

use crate::commands::{self, truncate};

const STATEMENT: &str = "Date,Description,Amount\n\
2024-01-01,NETFLIX.COM,-15.99\n\
2024-02-01,NETFLIX.COM,-15.99\n\
2024-03-02,NETFLIX.COM,-15.99\n\
2024-03-03,SAFEWAY #1234,-82.10\n\
2024-03-03,SAFEWAY #1234,-82.10\n\
2024-03-05,Hilton Hotel,-310.00\n\
2024-03-15,SALARY,\"$2,500.00\"\n\
not a date,Corner Cafe,-4.00\n";

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn config() -> EngineConfig {
    EngineConfig::default()
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly10!", 10), "exactly10!");
    assert_eq!(truncate("this is too long", 10), "this is...");
    assert_eq!(truncate("café au lait", 6), "caf...");
}

#[test]
fn test_sign_convention() {
    assert_eq!(commands::sign_convention(false), SignConvention::Standard);
    assert_eq!(commands::sign_convention(true), SignConvention::ExpensePositive);
}

#[test]
fn test_load_limits() {
    let file = write_temp(r#"{"Groceries": 300, "Travel": 250.5}"#);
    let limits = commands::load_limits(Some(file.path())).unwrap();
    assert_eq!(limits.get(&Category::Groceries), Some(&300.0));
    assert_eq!(limits.get(&Category::Travel), Some(&250.5));

    assert!(commands::load_limits(None).unwrap().is_empty());
}

#[test]
fn test_load_limits_errors() {
    let unknown = write_temp(r#"{"Pets": 40}"#);
    assert!(commands::load_limits(Some(unknown.path())).is_err());

    let garbage = write_temp("not json");
    assert!(commands::load_limits(Some(garbage.path())).is_err());

    assert!(commands::load_limits(Some(Path::new("/nonexistent/limits.json"))).is_err());
}

#[test]
fn test_load_config() {
    let file = write_temp("[duplicates]\nwindow_days = 3\n");
    let config = commands::load_config(Some(file.path())).unwrap();
    assert_eq!(config.duplicates.window_days, 3);

    assert!(commands::load_config(Some(Path::new("/nonexistent/engine.toml"))).is_err());

    let invalid = write_temp("[budget]\nnear_limit_percent = 0\n");
    assert!(commands::load_config(Some(invalid.path())).is_err());
}

#[test]
fn test_load_statement_missing_file() {
    assert!(commands::load_statement(Path::new("/nonexistent/statement.csv")).is_err());
}

// ========== Classifier Wiring Tests ==========

#[tokio::test]
async fn test_build_analyzer_skips_unhealthy_classifier() {
    let analyzer = commands::build_analyzer(
        &config(),
        Some(AIClient::Mock(MockBackend::unhealthy())),
    )
    .await;
    assert!(analyzer.categorizer().classifier().is_none());

    let analyzer = commands::build_analyzer(&config(), Some(AIClient::mock())).await;
    assert!(analyzer.categorizer().classifier().is_some());

    let analyzer = commands::build_analyzer(&config(), None).await;
    assert!(analyzer.categorizer().classifier().is_none());
}

#[tokio::test]
async fn test_run_categorize_with_mock_server() {
    let server = MockClassifierServer::start().await;
    let statement = write_temp(STATEMENT);

    let (outcome, rejected) = commands::run_categorize(
        &config(),
        Some(AIClient::openai_compatible(&server.url(), "test-model")),
        statement.path(),
        false,
    )
    .await
    .unwrap();

    assert!(rejected.is_empty());
    assert_eq!(outcome.transactions.len(), 8);
    assert_eq!(outcome.transactions[0].category, Category::Entertainment);
    assert_eq!(outcome.sources[0], CategorySource::Keyword);
    assert_eq!(outcome.transactions[3].category, Category::Groceries);
    assert_eq!(outcome.sources[3], CategorySource::Classifier);
    assert_eq!(outcome.transactions[5].category, Category::Travel);
    // Server answers "food & drink"
    assert_eq!(outcome.transactions[7].category, Category::FoodAndDrink);
    assert!(outcome.warnings.is_empty());
}

#[tokio::test]
async fn test_run_categorize_server_failure_degrades() {
    let server = MockClassifierServer::start().await;
    let statement = write_temp("Date,Description,Amount\n2024-01-01,Failing Vendor,-10\n");

    let (outcome, _) = commands::run_categorize(
        &config(),
        Some(AIClient::openai_compatible(&server.url(), "test-model")),
        statement.path(),
        false,
    )
    .await
    .unwrap();

    assert_eq!(outcome.transactions[0].category, Category::Other);
    assert_eq!(outcome.warnings.len(), 1);
}

// ========== Command Tests ==========

#[tokio::test]
async fn test_cmd_analyze() {
    let statement = write_temp(STATEMENT);
    let limits = write_temp(r#"{"Groceries": 150, "Entertainment": 50}"#);

    let result =
        commands::cmd_analyze(&config(), None, statement.path(), false, Some(limits.path()), false)
            .await;
    assert!(result.is_ok());

    let result = commands::cmd_analyze(&config(), None, statement.path(), false, None, true).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_analyze_credit_statement() {
    let statement = write_temp("Transaction Date,Description 1,Description 2,CAD$\n01/05/2024,UBER TRIP,TORONTO,23.10\n");
    let result = commands::cmd_analyze(&config(), None, statement.path(), true, None, false).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_analyze_unusable_headers() {
    let statement = write_temp("When,What\n2024-01-01,Coffee\n");
    let result = commands::cmd_analyze(&config(), None, statement.path(), false, None, false).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_cmd_categorize() {
    let statement = write_temp(STATEMENT);
    assert!(
        commands::cmd_categorize(&config(), Some(AIClient::mock()), statement.path(), false, false)
            .await
            .is_ok()
    );
    assert!(commands::cmd_categorize(&config(), None, statement.path(), false, true)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_cmd_recurring() {
    let statement = write_temp(STATEMENT);
    assert!(commands::cmd_recurring(&config(), None, statement.path(), false, false)
        .await
        .is_ok());
    assert!(commands::cmd_recurring(&config(), None, statement.path(), false, true)
        .await
        .is_ok());

    let empty = write_temp("Date,Description,Amount\n");
    assert!(commands::cmd_recurring(&config(), None, empty.path(), false, false)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_cmd_budgets() {
    let statement = write_temp(STATEMENT);
    let limits = write_temp(r#"{"Groceries": 150}"#);

    assert!(commands::cmd_budgets(
        &config(),
        None,
        statement.path(),
        false,
        Some(limits.path()),
        false
    )
    .await
    .is_ok());
    assert!(commands::cmd_budgets(&config(), None, statement.path(), false, None, true)
        .await
        .is_ok());

    let bad_limits = write_temp(r#"{"Groceries": "lots"}"#);
    assert!(commands::cmd_budgets(
        &config(),
        None,
        statement.path(),
        false,
        Some(bad_limits.path()),
        false
    )
    .await
    .is_err());
}

#[tokio::test]
async fn test_cmd_ask() {
    let statement = write_temp(STATEMENT);

    assert!(commands::cmd_ask(
        &config(),
        Some(AIClient::mock()),
        statement.path(),
        false,
        "Where did my money go?",
        false
    )
    .await
    .is_ok());
    assert!(commands::cmd_ask(
        &config(),
        Some(AIClient::mock()),
        statement.path(),
        false,
        "Where did my money go?",
        true
    )
    .await
    .is_ok());
}

#[tokio::test]
async fn test_cmd_ask_requires_backend_and_question() {
    let statement = write_temp(STATEMENT);

    assert!(
        commands::cmd_ask(&config(), None, statement.path(), false, "Any fees?", false)
            .await
            .is_err()
    );
    assert!(commands::cmd_ask(
        &config(),
        Some(AIClient::mock()),
        statement.path(),
        false,
        "  ",
        false
    )
    .await
    .is_err());
}

#[tokio::test]
async fn test_cmd_ask_with_mock_server() {
    let server = MockClassifierServer::start().await;
    let statement = write_temp(STATEMENT);
    let client = AIClient::openai_compatible(&server.url(), "test-model");

    assert!(commands::cmd_ask(
        &config(),
        Some(client.clone()),
        statement.path(),
        false,
        "How much on groceries?",
        false
    )
    .await
    .is_ok());
    assert!(commands::cmd_ask(
        &config(),
        Some(client),
        statement.path(),
        false,
        "Make it fail",
        false
    )
    .await
    .is_err());
}

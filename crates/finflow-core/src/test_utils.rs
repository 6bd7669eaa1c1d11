//! Test utilities for finflow-core
//!
//! This module provides a mock OpenAI-compatible server that can be used for
//! development and integration tests. It answers classification prompts with
//! labels and statement questions with a canned sentence.

use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// Descriptions or questions containing this fragment make the request fail with 500
pub const FAILURE_MARKER: &str = "fail";

/// Mock OpenAI-compatible server for testing and development
pub struct MockClassifierServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockClassifierServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockClassifierServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Model listing endpoint (health check)
async fn handle_models() -> Json<Value> {
    Json(json!({
        "object": "list",
        "data": [{ "id": "test-model", "object": "model" }]
    }))
}

/// Chat completions endpoint
async fn handle_chat(Json(request): Json<Value>) -> Response {
    // Questions arrive behind a system message
    if request["messages"][0]["role"] == "system" {
        let prompt = request["messages"][1]["content"].as_str().unwrap_or_default();
        return handle_question(prompt);
    }

    let prompt = request["messages"][0]["content"].as_str().unwrap_or_default();
    let descriptions = extract_descriptions(prompt);

    if descriptions
        .iter()
        .any(|d| d.to_lowercase().contains(FAILURE_MARKER))
    {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream model crashed").into_response();
    }

    let labels: Vec<&str> = descriptions.iter().map(|d| label_for(d)).collect();
    // Real models like to chat before the payload
    let content = format!(
        "Here are the categories:\n{}",
        serde_json::to_string(&labels).unwrap()
    );

    chat_reply(&content)
}

fn handle_question(prompt: &str) -> Response {
    let question = prompt
        .lines()
        .find_map(|line| line.strip_prefix("Question:"))
        .map(str::trim)
        .unwrap_or_default();

    if question.to_lowercase().contains(FAILURE_MARKER) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream model crashed").into_response();
    }

    let count = prompt
        .find("Transactions:")
        .and_then(|start| {
            serde_json::from_str::<Vec<Value>>(prompt[start + "Transactions:".len()..].trim()).ok()
        })
        .map(|txs| txs.len())
        .unwrap_or(0);

    chat_reply(&format!(
        "You asked \"{}\" about {} transactions.",
        question, count
    ))
}

fn chat_reply(content: &str) -> Response {
    Json(json!({
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content }
        }]
    }))
    .into_response()
}

/// Pull the JSON description array out of the classification prompt
fn extract_descriptions(prompt: &str) -> Vec<String> {
    let Some(start) = prompt.find("Input:") else {
        return Vec::new();
    };
    let rest = &prompt[start + "Input:".len()..];
    let end = rest.find("Output:").unwrap_or(rest.len());
    serde_json::from_str(rest[..end].trim()).unwrap_or_default()
}

fn label_for(description: &str) -> &'static str {
    let d = description.to_lowercase();
    if d.contains("safeway") || d.contains("grocer") {
        "Groceries"
    } else if d.contains("hotel") {
        "Travel"
    } else if d.contains("cafe") {
        "food & drink"
    } else {
        "Other"
    }
}

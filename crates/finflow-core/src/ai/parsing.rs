//! JSON parsing helpers for AI backend responses
//!
//! Models often wrap the JSON payload in prose or code fences; these helpers
//! cut out the first `[` .. last `]` span before deserializing.

use crate::error::{Error, Result};

/// Truncate long responses for error messages
fn truncated(s: &str) -> String {
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s.to_string()
    }
}

/// Parse a JSON array of category labels from an AI response
pub fn parse_category_list(response: &str) -> Result<Vec<String>> {
    let response = response.trim();

    let start = response.find('[');
    let end = response.rfind(']');

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &response[s..=e];
            serde_json::from_str(json_str).map_err(|e| {
                Error::InvalidData(format!(
                    "Invalid JSON from AI: {} | Raw: {}",
                    e,
                    truncated(json_str)
                ))
            })
        }
        _ => Err(Error::InvalidData(format!(
            "No JSON array found in AI response | Raw: {}",
            truncated(response)
        ))),
    }
}

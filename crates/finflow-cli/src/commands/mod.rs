//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analyze` - Full analysis report
//! - `ask` - Free-form question about a statement
//! - `budgets` - Budget status against a limits file
//! - `categorize` - Category per transaction
//! - `recurring` - Recurring charge listing
//! - `shared` - Shared utilities (config, statement and limits loading)

pub mod analyze;
pub mod ask;
pub mod budgets;
pub mod categorize;
pub mod recurring;
pub mod shared;

// Re-export command functions for main.rs
pub use analyze::*;
pub use ask::*;
pub use budgets::*;
pub use categorize::*;
pub use recurring::*;
pub use shared::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

//! Data models for FinFlow

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Closed category enumeration shared by every pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Income,
    #[serde(rename = "Food & Drink")]
    FoodAndDrink,
    Shopping,
    Entertainment,
    Transport,
    Groceries,
    Utilities,
    Rent,
    Travel,
    Bills,
    Services,
    Other,
}

impl Default for Category {
    fn default() -> Self {
        Self::Other
    }
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::FoodAndDrink => "Food & Drink",
            Self::Shopping => "Shopping",
            Self::Entertainment => "Entertainment",
            Self::Transport => "Transport",
            Self::Groceries => "Groceries",
            Self::Utilities => "Utilities",
            Self::Rent => "Rent",
            Self::Travel => "Travel",
            Self::Bills => "Bills",
            Self::Services => "Services",
            Self::Other => "Other",
        }
    }

    /// All categories in display order
    pub fn all() -> &'static [Category] {
        &[
            Self::Income,
            Self::FoodAndDrink,
            Self::Shopping,
            Self::Entertainment,
            Self::Transport,
            Self::Groceries,
            Self::Utilities,
            Self::Rent,
            Self::Travel,
            Self::Bills,
            Self::Services,
            Self::Other,
        ]
    }

    /// Map a free-form label onto the enumeration, coercing anything unknown to `Other`
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(Self::Other)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A normalized transaction
///
/// Date and amount keep their textual form and are parsed on demand, so a row with
/// a bad date still takes part in categorization and budgeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: String,
    pub description: String,
    /// Signed decimal text: negative = expense, positive = income
    pub amount: String,
    #[serde(default)]
    pub category: Category,
}

impl Transaction {
    pub fn new(
        date: impl Into<String>,
        description: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            description: description.into(),
            amount: amount.into(),
            category: Category::Other,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Calendar date, or `UnparsableDate`
    pub fn parsed_date(&self) -> Result<NaiveDate> {
        parse_date(&self.date)
    }

    /// Signed amount, or `MalformedAmount`
    pub fn amount_value(&self) -> Result<f64> {
        parse_amount(&self.amount)
    }

    /// Absolute amount when this is an expense (amount < 0)
    pub fn expense_amount(&self) -> Option<f64> {
        match self.amount_value() {
            Ok(amount) if amount < 0.0 => Some(amount.abs()),
            _ => None,
        }
    }
}

/// Parse a statement date
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    // %y before %Y: %Y also accepts two-digit years
    let formats = [
        "%Y-%m-%d",  // 2024-01-15
        "%m/%d/%y",  // 01/15/24
        "%m/%d/%Y",  // 01/15/2024
        "%m-%d-%Y",  // 01-15-2024
        "%d/%m/%y",  // 15/01/24 (European)
        "%d/%m/%Y",  // 15/01/2024 (European)
        "%b %d, %Y", // Jan 15, 2024
        "%d %b %Y",  // 15 Jan 2024
    ];

    for fmt in formats {
        match NaiveDate::parse_from_str(s, fmt) {
            Ok(date) if date.year() >= 1000 => return Ok(date),
            _ => continue,
        }
    }

    Err(Error::UnparsableDate(s.to_string()))
}

/// Parse an already-cleaned amount
pub fn parse_amount(s: &str) -> Result<f64> {
    let trimmed = s.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(Error::MalformedAmount(trimmed.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_labels_round_trip() {
        for category in Category::all() {
            assert_eq!(Category::from_label(category.as_str()), *category);
        }
    }

    #[test]
    fn test_category_coercion() {
        assert_eq!(Category::from_label("food & drink"), Category::FoodAndDrink);
        assert_eq!(Category::from_label("  Groceries "), Category::Groceries);
        assert_eq!(Category::from_label("Dining"), Category::Other);
        assert_eq!(Category::from_label(""), Category::Other);
    }

    #[test]
    fn test_category_serde_uses_labels() {
        let json = serde_json::to_string(&Category::FoodAndDrink).unwrap();
        assert_eq!(json, "\"Food & Drink\"");
        let parsed: Category = serde_json::from_str("\"Transport\"").unwrap();
        assert_eq!(parsed, Category::Transport);
    }

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(parse_date("2024-01-15").unwrap(), expected);
        assert_eq!(parse_date("01/15/2024").unwrap(), expected);
        assert_eq!(parse_date("01/15/24").unwrap(), expected);
        assert_eq!(parse_date("Jan 15, 2024").unwrap(), expected);
        assert_eq!(parse_date("15/01/24").unwrap(), expected);
        assert_eq!(parse_date("15/01/2024").unwrap(), expected);
        // Truncated years never land in the first millennium
        assert!(parse_date("01-15-24").is_err());
        assert!(matches!(
            parse_date("yesterday"),
            Err(Error::UnparsableDate(_))
        ));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("-15.99").unwrap(), -15.99);
        assert_eq!(parse_amount(" 42 ").unwrap(), 42.0);
        assert!(matches!(parse_amount("abc"), Err(Error::MalformedAmount(_))));
        assert!(parse_amount("inf").is_err());
        assert!(parse_amount("NaN").is_err());
    }

    #[test]
    fn test_expense_amount() {
        assert_eq!(
            Transaction::new("2024-01-01", "Coffee", "-4.50").expense_amount(),
            Some(4.5)
        );
        assert_eq!(
            Transaction::new("2024-01-01", "Salary", "2000").expense_amount(),
            None
        );
        assert_eq!(
            Transaction::new("2024-01-01", "Broken", "n/a").expense_amount(),
            None
        );
    }
}

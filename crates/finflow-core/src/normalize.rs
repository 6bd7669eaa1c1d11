//! Raw statement rows → canonical transactions
//!
//! Statement exports disagree on column names ("Date" vs "Transaction Date",
//! "Amount" vs "CAD$") and on sign conventions (credit cards report charges as
//! positive numbers). Everything downstream sees one shape: positive = inflow,
//! negative = outflow.

use std::collections::HashMap;
use std::io::Read;
use std::sync::LazyLock;

use csv::ReaderBuilder;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{parse_amount, Transaction};

/// One raw record keyed by header name
pub type RawRow = HashMap<String, String>;

const DATE_ALIASES: &[&str] = &["Date", "Transaction Date"];
const DESCRIPTION_ALIASES: &[&str] = &["Description", "Description 1"];
const DESCRIPTION_EXTRA: &str = "Description 2";
const AMOUNT_ALIASES: &[&str] = &["Amount", "CAD$", "USD$"];

/// Currency symbols, thousands separators and whitespace
static AMOUNT_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Sc},\s]").expect("valid regex"));

/// Parsed tabular input: ordered headers plus rows
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// How the source account reports charges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignConvention {
    /// Bank accounts: charges are already negative
    #[default]
    Standard,
    /// Credit cards: charges are positive and must be negated
    ExpensePositive,
}

impl SignConvention {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::ExpensePositive => "expense_positive",
        }
    }
}

impl std::str::FromStr for SignConvention {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" | "bank" => Ok(Self::Standard),
            "expense_positive" | "credit" | "credit_card" => Ok(Self::ExpensePositive),
            _ => Err(format!("Unknown sign convention: {}", s)),
        }
    }
}

impl std::fmt::Display for SignConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which headers feed each canonical field, in priority order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: Vec<String>,
    pub description: Vec<String>,
    pub description_extra: Option<String>,
    pub amount: Vec<String>,
}

impl ColumnMap {
    /// Resolve canonical fields from a header set
    ///
    /// Exact aliases win; otherwise the first header containing the field name
    /// (case-insensitive) is used. Fails when any field cannot be resolved.
    pub fn resolve(headers: &[String]) -> Result<Self> {
        let date = resolve_field(headers, DATE_ALIASES, "date");
        let description = resolve_field(headers, DESCRIPTION_ALIASES, "description");
        let amount = resolve_field(headers, AMOUNT_ALIASES, "amount");

        let mut missing = Vec::new();
        if date.is_empty() {
            missing.push("date");
        }
        if description.is_empty() {
            missing.push("description");
        }
        if amount.is_empty() {
            missing.push("amount");
        }
        if !missing.is_empty() {
            return Err(Error::InvalidInput(format!(
                "no column for {} in headers [{}]",
                missing.join(", "),
                headers.join(", ")
            )));
        }

        let description_extra = headers
            .iter()
            .find(|h| h.as_str() == DESCRIPTION_EXTRA)
            .cloned();

        Ok(Self {
            date,
            description,
            description_extra,
            amount,
        })
    }
}

fn resolve_field(headers: &[String], aliases: &[&str], needle: &str) -> Vec<String> {
    let exact: Vec<String> = aliases
        .iter()
        .filter(|alias| headers.iter().any(|h| h == *alias))
        .map(|alias| alias.to_string())
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    headers
        .iter()
        .find(|h| h.to_lowercase().contains(needle))
        .cloned()
        .into_iter()
        .collect()
}

/// A row the normalizer dropped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    /// Zero-based position in the input
    pub index: usize,
    pub reason: String,
}

/// Result of normalizing a table
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    pub transactions: Vec<Transaction>,
    pub rejected: Vec<RejectedRow>,
}

/// Canonicalizes raw rows into transactions
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    sign: SignConvention,
}

impl Normalizer {
    pub fn new(sign: SignConvention) -> Self {
        Self { sign }
    }

    pub fn sign_convention(&self) -> SignConvention {
        self.sign
    }

    /// Normalize a whole table
    ///
    /// A header set that cannot supply date, description and amount is fatal.
    /// Individual rows that cannot are dropped and reported.
    pub fn normalize(&self, table: &RawTable) -> Result<NormalizeOutcome> {
        let columns = ColumnMap::resolve(&table.headers)?;
        let mut outcome = NormalizeOutcome::default();

        for (index, row) in table.rows.iter().enumerate() {
            match self.normalize_row(row, &columns) {
                Ok(tx) => outcome.transactions.push(tx),
                Err(e) => {
                    warn!(row = index, error = %e, "Dropping row");
                    outcome.rejected.push(RejectedRow {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(
            "Normalized {} rows ({} dropped)",
            outcome.transactions.len(),
            outcome.rejected.len()
        );
        Ok(outcome)
    }

    /// Normalize one row, or fail with `InvalidRow`
    pub fn normalize_row(&self, row: &RawRow, columns: &ColumnMap) -> Result<Transaction> {
        let date = first_present(row, &columns.date)
            .ok_or_else(|| Error::InvalidRow("missing date".into()))?;

        let primary = first_present(row, &columns.description)
            .ok_or_else(|| Error::InvalidRow("missing description".into()))?;
        let description = match columns
            .description_extra
            .as_ref()
            .and_then(|col| non_empty(row, col))
        {
            Some(extra) => format!("{} {}", primary, extra).trim().to_string(),
            None => primary.to_string(),
        };

        let raw_amount = first_present(row, &columns.amount)
            .ok_or_else(|| Error::InvalidRow("missing amount".into()))?;
        let amount = self.apply_sign(clean_amount(raw_amount));

        Ok(Transaction::new(date, description, amount))
    }

    fn apply_sign(&self, amount: String) -> String {
        if self.sign == SignConvention::Standard {
            return amount;
        }

        match parse_amount(&amount) {
            Ok(value) if value == 0.0 => amount,
            Ok(value) => format!("{}", -value),
            Err(_) => {
                debug!(amount = %amount, "Leaving malformed amount unsigned");
                amount
            }
        }
    }
}

fn non_empty<'a>(row: &'a RawRow, column: &str) -> Option<&'a str> {
    row.get(column)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn first_present<'a>(row: &'a RawRow, columns: &[String]) -> Option<&'a str> {
    columns.iter().find_map(|col| non_empty(row, col))
}

/// Strip currency symbols and separators; `(12.50)` becomes `-12.50`
pub fn clean_amount(raw: &str) -> String {
    let stripped = AMOUNT_NOISE.replace_all(raw.trim(), "");
    match stripped
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
    {
        Some(inner) => format!("-{}", inner),
        None => stripped.into_owned(),
    }
}

/// Read CSV text into a raw table
///
/// Rows whose fields are all empty are skipped.
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let row: RawRow = headers
            .iter()
            .enumerate()
            .filter_map(|(i, header)| record.get(i).map(|v| (header.clone(), v.to_string())))
            .collect();
        rows.push(row);
    }

    debug!("Read {} CSV rows", rows.len());
    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_clean_amount() {
        assert_eq!(clean_amount("$1,234.56"), "1234.56");
        assert_eq!(clean_amount(" -15.99 "), "-15.99");
        assert_eq!(clean_amount("(12.50)"), "-12.50");
        assert_eq!(clean_amount("€ 9.99"), "9.99");
        assert_eq!(clean_amount("N/A"), "N/A");
    }

    #[test]
    fn test_resolve_exact_aliases() {
        let columns =
            ColumnMap::resolve(&headers(&["Transaction Date", "Description 1", "Description 2", "CAD$"]))
                .unwrap();
        assert_eq!(columns.date, vec!["Transaction Date"]);
        assert_eq!(columns.description, vec!["Description 1"]);
        assert_eq!(columns.description_extra.as_deref(), Some("Description 2"));
        assert_eq!(columns.amount, vec!["CAD$"]);
    }

    #[test]
    fn test_resolve_contains_fallback() {
        let columns =
            ColumnMap::resolve(&headers(&["Posting Date", "Payee Description", "Amount (USD)"]))
                .unwrap();
        assert_eq!(columns.date, vec!["Posting Date"]);
        assert_eq!(columns.description, vec!["Payee Description"]);
        assert_eq!(columns.amount, vec!["Amount (USD)"]);
    }

    #[test]
    fn test_resolve_missing_schema_is_fatal() {
        let err = ColumnMap::resolve(&headers(&["When", "What"])).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_normalize_row_concatenates_descriptions() {
        let columns =
            ColumnMap::resolve(&headers(&["Transaction Date", "Description 1", "Description 2", "CAD$"]))
                .unwrap();
        let tx = Normalizer::default()
            .normalize_row(
                &row(&[
                    ("Transaction Date", "2024-01-05"),
                    ("Description 1", "UBER TRIP"),
                    ("Description 2", "TORONTO ON"),
                    ("CAD$", "-$23.10"),
                ]),
                &columns,
            )
            .unwrap();

        assert_eq!(tx.date, "2024-01-05");
        assert_eq!(tx.description, "UBER TRIP TORONTO ON");
        assert_eq!(tx.amount, "-23.10");
    }

    #[test]
    fn test_per_row_alias_fallback() {
        let columns = ColumnMap::resolve(&headers(&["Date", "Transaction Date", "Description", "Amount", "USD$"]))
            .unwrap();
        let tx = Normalizer::default()
            .normalize_row(
                &row(&[
                    ("Date", ""),
                    ("Transaction Date", "2024-02-01"),
                    ("Description", "Coffee"),
                    ("Amount", ""),
                    ("USD$", "-4.25"),
                ]),
                &columns,
            )
            .unwrap();
        assert_eq!(tx.date, "2024-02-01");
        assert_eq!(tx.amount, "-4.25");
    }

    #[test]
    fn test_expense_positive_negates() {
        let columns = ColumnMap::resolve(&headers(&["Date", "Description", "Amount"])).unwrap();
        let normalizer = Normalizer::new(SignConvention::ExpensePositive);

        let charge = normalizer
            .normalize_row(
                &row(&[("Date", "2024-01-01"), ("Description", "NETFLIX"), ("Amount", "15.99")]),
                &columns,
            )
            .unwrap();
        assert_eq!(charge.amount, "-15.99");

        let payment = normalizer
            .normalize_row(
                &row(&[("Date", "2024-01-02"), ("Description", "PAYMENT"), ("Amount", "-500")]),
                &columns,
            )
            .unwrap();
        assert_eq!(payment.amount, "500");

        let zero = normalizer
            .normalize_row(
                &row(&[("Date", "2024-01-03"), ("Description", "ADJ"), ("Amount", "0")]),
                &columns,
            )
            .unwrap();
        assert_eq!(zero.amount, "0");
    }

    #[test]
    fn test_missing_fields_drop_row_not_batch() {
        let table = RawTable {
            headers: headers(&["Date", "Description", "Amount"]),
            rows: vec![
                row(&[("Date", "2024-01-01"), ("Description", "Rent"), ("Amount", "-1200")]),
                row(&[("Date", ""), ("Description", "No date"), ("Amount", "-1")]),
                row(&[("Date", "2024-01-02"), ("Description", " "), ("Amount", "-1")]),
                row(&[("Date", "2024-01-03"), ("Description", "No amount")]),
                row(&[("Date", "2024-01-04"), ("Description", "Salary"), ("Amount", "2500")]),
            ],
        };

        let outcome = Normalizer::default().normalize(&table).unwrap();
        assert_eq!(outcome.transactions.len(), 2);
        let dropped: Vec<usize> = outcome.rejected.iter().map(|r| r.index).collect();
        assert_eq!(dropped, vec![1, 2, 3]);
        assert!(outcome.rejected[0].reason.contains("date"));
    }

    #[test]
    fn test_malformed_amount_is_kept() {
        let table = RawTable {
            headers: headers(&["Date", "Description", "Amount"]),
            rows: vec![row(&[("Date", "2024-01-01"), ("Description", "Odd"), ("Amount", "N/A")])],
        };
        let outcome = Normalizer::new(SignConvention::ExpensePositive)
            .normalize(&table)
            .unwrap();
        assert_eq!(outcome.transactions[0].amount, "N/A");
        assert!(outcome.transactions[0].amount_value().is_err());
    }

    #[test]
    fn test_read_csv() {
        let data = "\u{feff}Date,Description,Amount\n2024-01-01,STARBUCKS,\"-5.75\"\n,,\n2024-01-02,\"SHELL OIL\",\"-$1,040.00\"\n";
        let table = read_csv(data.as_bytes()).unwrap();
        assert_eq!(table.headers, headers(&["Date", "Description", "Amount"]));
        assert_eq!(table.rows.len(), 2);

        let outcome = Normalizer::default().normalize(&table).unwrap();
        assert_eq!(outcome.transactions[1].amount, "-1040.00");
    }

    #[test]
    fn test_sign_convention_from_str() {
        assert_eq!("credit".parse::<SignConvention>().unwrap(), SignConvention::ExpensePositive);
        assert_eq!("bank".parse::<SignConvention>().unwrap(), SignConvention::Standard);
        assert!("sideways".parse::<SignConvention>().is_err());
    }
}

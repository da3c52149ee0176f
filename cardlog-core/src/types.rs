use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One entry of the portal's `posted-transactions` response.
///
/// Only the fields the ledger needs are kept; everything else the portal sends
/// (reference numbers, merchant category, etc.) is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub description: String,
    pub amount: f64,
    pub transaction_date: String,
}

/// Body of `GET .../v1/credit-card-accounts/{account}/posted-transactions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsPayload {
    pub credit_card_transactions: Vec<RawTransaction>,
}

impl TransactionsPayload {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("parse posted-transactions payload")
    }

    pub fn from_json_value(v: serde_json::Value) -> Result<Self> {
        serde_json::from_value(v).context("parse posted-transactions payload")
    }

    /// Read a response body saved to disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_json_str(&s).with_context(|| format!("parsing {}", path.display()))
    }
}

/// A normalized ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Merchant or label text as the portal reports it
    pub description: String,
    /// Signed amount after the sign convention has been applied
    pub amount: f64,
    /// Native portal date string; compared lexicographically, never parsed
    pub transaction_date: String,
}

impl Transaction {
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        transaction_date: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            transaction_date: transaction_date.into(),
        }
    }
}

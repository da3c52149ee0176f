//! Turn a raw posted-transactions payload into an ordered ledger.
//!
//! The live-capture and manual-feed tools historically disagreed on two
//! details: whether the portal amount is a cost as-is or must be negated, and
//! whether descriptions are trimmed before the payment check. Both are
//! explicit options here instead of being baked in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{Transaction, TransactionsPayload};

/// Description the portal uses for payments made to the card.
pub const PAYMENT_SENTINEL: &str = "ONLINE PAYMENT THANK YOU";

/// How the portal amount maps onto the ledger amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignConvention {
    /// Keep the portal amount (purchases are positive costs)
    AsReported,
    /// Flip the portal amount
    Negated,
}

impl SignConvention {
    pub fn apply(self, amount: f64) -> f64 {
        match self {
            SignConvention::AsReported => amount,
            // Subtracting from zero keeps a zero amount unsigned.
            SignConvention::Negated => 0.0 - amount,
        }
    }
}

impl fmt::Display for SignConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignConvention::AsReported => f.write_str("as-reported"),
            SignConvention::Negated => f.write_str("negated"),
        }
    }
}

impl FromStr for SignConvention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "as-reported" | "as_reported" | "asis" => Ok(SignConvention::AsReported),
            "negated" | "negate" => Ok(SignConvention::Negated),
            other => Err(format!(
                "unknown sign convention '{other}' (expected as-reported or negated)"
            )),
        }
    }
}

/// How a description is compared against [`PAYMENT_SENTINEL`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DescriptionMatch {
    Exact,
    /// Ignore leading/trailing whitespace
    Trimmed,
}

impl DescriptionMatch {
    pub fn is_payment(self, description: &str) -> bool {
        match self {
            DescriptionMatch::Exact => description == PAYMENT_SENTINEL,
            DescriptionMatch::Trimmed => description.trim() == PAYMENT_SENTINEL,
        }
    }
}

impl fmt::Display for DescriptionMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptionMatch::Exact => f.write_str("exact"),
            DescriptionMatch::Trimmed => f.write_str("trimmed"),
        }
    }
}

impl FromStr for DescriptionMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(DescriptionMatch::Exact),
            "trimmed" | "trim" => Ok(DescriptionMatch::Trimmed),
            other => Err(format!(
                "unknown description match '{other}' (expected exact or trimmed)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    pub sign: SignConvention,
    pub matching: DescriptionMatch,
}

impl NormalizeOptions {
    /// Conventions of the browser-capture tool: amounts are costs, descriptions trimmed.
    pub fn live_capture() -> Self {
        Self {
            sign: SignConvention::AsReported,
            matching: DescriptionMatch::Trimmed,
        }
    }

    /// Conventions of the saved-file tool: amounts negated, exact match.
    pub fn manual_feed() -> Self {
        Self {
            sign: SignConvention::Negated,
            matching: DescriptionMatch::Exact,
        }
    }
}

/// Filter payments out, apply the sign convention, and order most recent first.
///
/// Dates are compared as strings, which is only chronological for fixed-width
/// formats such as `YYYY-MM-DD`.
pub fn normalize(payload: &TransactionsPayload, opts: NormalizeOptions) -> Vec<Transaction> {
    let mut txns: Vec<Transaction> = payload
        .credit_card_transactions
        .iter()
        .filter(|raw| {
            let skip = opts.matching.is_payment(&raw.description);
            if skip {
                log::debug!("skipping payment entry dated {}", raw.transaction_date);
            }
            !skip
        })
        .map(|raw| {
            log::debug!("{:?}", raw);
            Transaction::new(
                raw.description.clone(),
                opts.sign.apply(raw.amount),
                raw.transaction_date.clone(),
            )
        })
        .collect();

    txns.sort_by(|a, b| a.transaction_date.cmp(&b.transaction_date));
    txns.reverse();
    txns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawTransaction;

    fn raw(description: &str, amount: f64, date: &str) -> RawTransaction {
        RawTransaction {
            description: description.to_string(),
            amount,
            transaction_date: date.to_string(),
        }
    }

    fn payload(entries: Vec<RawTransaction>) -> TransactionsPayload {
        TransactionsPayload {
            credit_card_transactions: entries,
        }
    }

    fn scenario() -> TransactionsPayload {
        payload(vec![
            raw("COFFEE SHOP", 4.50, "2024-01-02"),
            raw("ONLINE PAYMENT THANK YOU", 100.00, "2024-01-03"),
            raw("GROCERY", 32.10, "2024-01-01"),
        ])
    }

    #[test]
    fn test_scenario_drops_payment_and_orders_recent_first() {
        let txns = normalize(&scenario(), NormalizeOptions::live_capture());
        assert_eq!(
            txns,
            vec![
                Transaction::new("COFFEE SHOP", 4.5, "2024-01-02"),
                Transaction::new("GROCERY", 32.1, "2024-01-01"),
            ]
        );
    }

    #[test]
    fn test_negated_convention_flips_amounts() {
        let txns = normalize(&scenario(), NormalizeOptions::manual_feed());
        assert_eq!(txns[0].amount, -4.5);
        assert_eq!(txns[1].amount, -32.1);
    }

    #[test]
    fn test_negating_zero_stays_positive_zero() {
        let v = SignConvention::Negated.apply(0.0);
        assert!(v == 0.0 && v.is_sign_positive());
    }

    #[test]
    fn test_trimmed_match_catches_padded_sentinel() {
        let p = payload(vec![
            raw("  ONLINE PAYMENT THANK YOU ", -250.0, "2024-02-01"),
            raw("BOOKSTORE", 12.0, "2024-02-02"),
        ]);

        let trimmed = normalize(
            &p,
            NormalizeOptions {
                sign: SignConvention::AsReported,
                matching: DescriptionMatch::Trimmed,
            },
        );
        assert_eq!(trimmed.len(), 1);
        assert_eq!(trimmed[0].description, "BOOKSTORE");

        let exact = normalize(
            &p,
            NormalizeOptions {
                sign: SignConvention::AsReported,
                matching: DescriptionMatch::Exact,
            },
        );
        assert_eq!(exact.len(), 2);
    }

    #[test]
    fn test_keeps_every_non_payment_entry_once() {
        let p = payload(vec![
            raw("A", 1.0, "2024-03-05"),
            raw("ONLINE PAYMENT THANK YOU", 10.0, "2024-03-04"),
            raw("B", 2.0, "2024-03-01"),
            raw("A", 1.0, "2024-03-05"),
            raw("ONLINE PAYMENT THANK YOU", 20.0, "2024-03-09"),
            raw("C", 3.0, "2024-03-07"),
        ]);

        let txns = normalize(&p, NormalizeOptions::live_capture());
        assert_eq!(txns.len(), 4);
        assert!(txns.iter().all(|t| t.description != PAYMENT_SENTINEL));
        assert_eq!(txns.iter().filter(|t| t.description == "A").count(), 2);
        assert!(
            txns.windows(2)
                .all(|w| w[0].transaction_date >= w[1].transaction_date)
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let p = scenario();
        let first = normalize(&p, NormalizeOptions::manual_feed());
        let second = normalize(&p, NormalizeOptions::manual_feed());
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_payload() {
        assert!(normalize(&payload(vec![]), NormalizeOptions::live_capture()).is_empty());
    }

    #[test]
    fn test_parse_conventions() {
        assert_eq!("negated".parse::<SignConvention>().unwrap(), SignConvention::Negated);
        assert_eq!("As-Reported".parse::<SignConvention>().unwrap(), SignConvention::AsReported);
        assert_eq!("trimmed".parse::<DescriptionMatch>().unwrap(), DescriptionMatch::Trimmed);
        assert!("sideways".parse::<SignConvention>().is_err());
        assert_eq!(SignConvention::AsReported.to_string(), "as-reported");
    }
}

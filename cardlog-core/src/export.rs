//! Ledger renderers: a CSV file for budgeting tools and plain lines for copy/paste.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use crate::types::Transaction;

/// Constant `payment` column value: the account the money left from.
pub const PAYMENT_ACCOUNT: &str = "FNBO Card";

pub const CSV_HEADER: [&str; 5] = ["date", "payment", "cost", "category", "payee"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Text,
}

impl ExportFormat {
    pub fn render<W: Write>(self, writer: W, txns: &[Transaction]) -> Result<()> {
        match self {
            ExportFormat::Csv => write_csv(writer, txns),
            ExportFormat::Text => write_text(writer, txns),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => f.write_str("csv"),
            ExportFormat::Text => f.write_str("text"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "text" | "txt" => Ok(ExportFormat::Text),
            other => Err(format!("unknown format '{other}' (expected csv or text)")),
        }
    }
}

/// Render an amount the way a spreadsheet round-trips it: whole numbers keep a
/// trailing `.0` so the column never looks like an integer count.
pub fn format_amount(amount: f64) -> String {
    if amount.is_finite() && amount.fract() == 0.0 {
        format!("{amount:.1}")
    } else {
        amount.to_string()
    }
}

/// Write the header plus one row per transaction, in the given order.
pub fn write_csv<W: Write>(writer: W, txns: &[Transaction]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);

    wtr.write_record(CSV_HEADER).context("write csv header")?;
    for t in txns {
        let amount = format_amount(t.amount);
        wtr.write_record([
            t.transaction_date.as_str(),
            PAYMENT_ACCOUNT,
            amount.as_str(),
            "",
            t.description.as_str(),
        ])
        .with_context(|| format!("write csv row for {}", t.transaction_date))?;
    }
    wtr.flush().context("flush csv output")?;
    Ok(())
}

/// Create (or truncate) `path` and write the CSV ledger into it.
pub fn write_csv_file(path: impl AsRef<Path>, txns: &[Transaction]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_csv(file, txns).with_context(|| format!("write {}", path.display()))
}

/// `date,amount,description` per line, no header, no quoting.
pub fn write_text<W: Write>(mut writer: W, txns: &[Transaction]) -> Result<()> {
    for t in txns {
        writeln!(
            writer,
            "{},{},{}",
            t.transaction_date,
            format_amount(t.amount),
            t.description
        )
        .context("write transaction line")?;
    }
    writer.flush().context("flush text output")?;
    Ok(())
}

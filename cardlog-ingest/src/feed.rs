//! Saved-response input: the operator opens the transactions URL in their own
//! signed-in browser, saves the JSON, and hands us the file.

use anyhow::{Context, Result};
use cardlog_core::TransactionsPayload;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::prompt::prompt_required;
use crate::source::TransactionSource;

/// `{portal}/v1/credit-card-accounts/{account}/posted-transactions?nextKey=0&pageSize={n}`
pub fn transactions_url(portal_url: &str, account: &str, page_size: u32) -> String {
    format!(
        "{}/v1/credit-card-accounts/{}/posted-transactions?nextKey=0&pageSize={}",
        portal_url.trim_end_matches('/'),
        account,
        page_size
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualFeed {
    pub data_file: PathBuf,
}

impl ManualFeed {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            data_file: path.into(),
        }
    }

    /// Work out which file to read, asking the operator for whatever is missing.
    ///
    /// With `data_file` set nothing is asked. Otherwise the account is prompted
    /// for (when absent), the URL to open is printed, and the saved path is read.
    pub fn resolve<R: BufRead, W: Write>(
        portal_url: &str,
        account: Option<String>,
        data_count: u32,
        data_file: Option<PathBuf>,
        input: &mut R,
        output: &mut W,
    ) -> Result<Self> {
        if let Some(path) = data_file {
            return Ok(Self::from_file(path));
        }

        let account = match account {
            Some(a) => a,
            None => prompt_required(input, output, "Account")?,
        };

        writeln!(output, "Open this URL in your signed-in browser and save the response:")?;
        writeln!(output, "{}", transactions_url(portal_url, &account, data_count))?;

        let path = prompt_required(input, output, "Path of the saved JSON file")?;
        Ok(Self::from_file(path))
    }
}

impl TransactionSource for ManualFeed {
    fn describe(&self) -> String {
        format!("saved file {}", self.data_file.display())
    }

    async fn fetch(self) -> Result<TransactionsPayload> {
        TransactionsPayload::from_path(&self.data_file)
            .with_context(|| format!("loading {}", self.describe()))
    }
}

use anyhow::Result;
use cardlog_core::TransactionsPayload;

/// Anything that can hand over one posted-transactions payload.
///
/// Consumed on use: a live source owns a browser session that must not outlive
/// the fetch.
#[allow(async_fn_in_trait)]
pub trait TransactionSource: Sized {
    /// Short human label for logs ("saved file foo.json", "live capture")
    fn describe(&self) -> String;

    async fn fetch(self) -> Result<TransactionsPayload>;
}

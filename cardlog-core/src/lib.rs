//! cardlog-core: transaction model, normalization conventions, and ledger exporters

pub mod export;
pub mod normalize;
pub mod types;

pub use export::{ExportFormat, write_csv, write_csv_file, write_text};
pub use normalize::{DescriptionMatch, NormalizeOptions, PAYMENT_SENTINEL, SignConvention, normalize};
pub use types::{RawTransaction, Transaction, TransactionsPayload};

//! cardlog-ingest: where the raw transactions payload comes from.
//!
//! Two sources share one output shape: a response saved to disk by the operator
//! ([`feed::ManualFeed`]) and a live browser session whose background request is
//! intercepted and replayed ([`capture::LiveCapture`]).

pub mod capture;
pub mod error;
pub mod feed;
pub mod prompt;
pub mod source;
pub mod wait;

pub use capture::{CaptureSettings, Credentials, LiveCapture, WebDriverSettings};
pub use error::CaptureError;
pub use feed::{ManualFeed, transactions_url};
pub use source::TransactionSource;
pub use wait::{PollSpec, poll_until};

use std::time::Duration;
use thiserror::Error;

/// Failures of the live capture flow that callers may want to tell apart.
///
/// Everything else (I/O, JSON shape) travels as plain `anyhow` context.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("timed out after {}s waiting for {what}", .after.as_secs_f64())]
    Timeout { what: String, after: Duration },

    #[error("webdriver {command} failed ({status}): {error}: {message}")]
    WebDriver {
        command: String,
        status: u16,
        error: String,
        message: String,
    },

    #[error("unexpected webdriver response to {command}: {detail}")]
    UnexpectedResponse { command: String, detail: String },

    #[error("replayed transactions request failed with {status}: {body}")]
    ReplayFailed { status: u16, body: String },
}

impl CaptureError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CaptureError::Timeout { .. })
    }

    /// W3C error code `no such element`
    pub fn is_no_such_element(&self) -> bool {
        matches!(self, CaptureError::WebDriver { error, .. } if error == "no such element")
    }
}

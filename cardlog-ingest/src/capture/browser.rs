use anyhow::Result;
use serde::Deserialize;

/// Opaque handle to a DOM element inside the remote browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(pub String);

/// One record of Chrome's `performance` log as chromedriver returns it.
///
/// `message` is itself a JSON document wrapping a DevTools protocol event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub level: String,
    pub message: String,
    #[serde(default)]
    pub timestamp: f64,
}

/// The browser operations the capture flow needs.
///
/// Implemented over WebDriver for real runs; tests drive the flow with an
/// in-memory browser.
#[allow(async_fn_in_trait)]
pub trait Browser {
    async fn goto(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    /// `Ok(None)` when nothing matches the CSS selector yet.
    async fn find_element(&self, css: &str) -> Result<Option<ElementRef>>;

    async fn clear(&self, element: &ElementRef) -> Result<()>;

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()>;

    async fn submit(&self, form: &ElementRef) -> Result<()>;

    /// Drain performance log entries recorded since the previous call.
    async fn performance_log(&self) -> Result<Vec<LogEntry>>;

    async fn quit(&self) -> Result<()>;
}

/// Run `body` against `browser`, then quit the browser no matter how `body` ended.
///
/// The body's result is returned unchanged; a failure to quit is only logged so
/// it never masks the original error.
pub async fn with_session<B, T, F>(browser: B, body: F) -> Result<T>
where
    B: Browser,
    F: AsyncFnOnce(&B) -> Result<T>,
{
    let outcome = body(&browser).await;

    match browser.quit().await {
        Ok(()) => log::debug!("browser session closed"),
        Err(e) => log::warn!("failed to close browser session: {e:#}"),
    }

    outcome
}

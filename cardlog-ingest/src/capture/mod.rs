//! Live capture: sign in through a real browser, wait for the page to fetch
//! its own transactions, then replay that request for one large page.

pub mod browser;
pub mod chromedriver;
pub mod network_log;
pub mod replay;
pub mod webdriver;

use anyhow::{Context, Result, anyhow};
use cardlog_core::TransactionsPayload;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use browser::{Browser, ElementRef, LogEntry, with_session};
pub use network_log::{InterceptedRequest, find_request};
pub use replay::{replay, rewrite_query};
pub use webdriver::{WebDriverClient, WebDriverSession, chrome_capabilities};

use crate::source::TransactionSource;
use crate::wait::{PollSpec, poll_until};

/// How often page-render conditions are re-checked
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Portal locations, selectors, and time limits of the capture flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub portal_url: String,
    pub sign_in_url: String,
    /// Regex the browser URL must match once sign-in has gone through
    pub accounts_url_pattern: String,
    pub transactions_path_suffix: String,
    pub username_selector: String,
    pub password_selector: String,
    pub form_selector: String,
    pub sign_in_timeout_secs: u64,
    pub navigation_timeout_secs: u64,
    /// Upper bound on waiting for the page's transactions request
    pub request_timeout_secs: u64,
    pub poll_interval_secs: u64,
    pub page_size: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            portal_url: "https://www.transaction.card.fnbo.com".to_string(),
            sign_in_url: "https://www.transaction.card.fnbo.com/".to_string(),
            accounts_url_pattern: r"^https://www\.transaction\.card\.fnbo\.com/accounts/".to_string(),
            transactions_path_suffix: "/posted-transactions".to_string(),
            username_selector: "#okta-signin-username".to_string(),
            password_selector: "#okta-signin-password".to_string(),
            form_selector: "#form32".to_string(),
            sign_in_timeout_secs: 20,
            navigation_timeout_secs: 120,
            request_timeout_secs: 300,
            poll_interval_secs: 10,
            page_size: 300,
        }
    }
}

impl CaptureSettings {
    pub fn sign_in_wait(&self) -> PollSpec {
        PollSpec::from_secs(self.sign_in_timeout_secs, ELEMENT_POLL_INTERVAL)
    }

    pub fn navigation_wait(&self) -> PollSpec {
        PollSpec::from_secs(self.navigation_timeout_secs, ELEMENT_POLL_INTERVAL)
    }

    /// Never polls the performance log faster than page elements are polled.
    pub fn request_wait(&self) -> PollSpec {
        PollSpec::from_secs(
            self.request_timeout_secs,
            Duration::from_secs(self.poll_interval_secs).max(ELEMENT_POLL_INTERVAL),
        )
    }
}

/// Where the browser comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverSettings {
    pub url: String,
    /// chromedriver to launch when `url` is not answering; PATH lookup when unset
    pub chromedriver_command: Option<String>,
    pub headless: bool,
    pub browser_args: Vec<String>,
    pub startup_timeout_secs: u64,
}

impl Default for WebDriverSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:9515".to_string(),
            chromedriver_command: None,
            headless: false,
            browser_args: Vec::new(),
            startup_timeout_secs: 15,
        }
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

async fn wait_for_element<B: Browser>(browser: &B, css: &str, spec: PollSpec) -> Result<ElementRef> {
    poll_until(&format!("element {css}"), spec, async || browser.find_element(css).await).await
}

async fn require_element<B: Browser>(browser: &B, css: &str) -> Result<ElementRef> {
    browser
        .find_element(css)
        .await?
        .ok_or_else(|| anyhow!("sign-in form has no element matching {css}"))
}

/// Fill and submit the sign-in form, then wait for the accounts page.
pub async fn sign_in<B: Browser>(browser: &B, creds: &Credentials, settings: &CaptureSettings) -> Result<()> {
    let accounts = Regex::new(&settings.accounts_url_pattern)
        .with_context(|| format!("invalid accounts_url_pattern {}", settings.accounts_url_pattern))?;

    log::info!("Opening {} to sign in", settings.sign_in_url);
    browser.goto(&settings.sign_in_url).await?;

    let username = wait_for_element(browser, &settings.username_selector, settings.sign_in_wait()).await?;
    browser.clear(&username).await?;
    browser.send_keys(&username, &creds.username).await?;

    let password = require_element(browser, &settings.password_selector).await?;
    browser.clear(&password).await?;
    browser.send_keys(&password, &creds.password).await?;

    let form = require_element(browser, &settings.form_selector).await?;
    browser.submit(&form).await?;

    let landed = poll_until("the accounts page", settings.navigation_wait(), async || {
        let url = browser.current_url().await?;
        Ok(accounts.is_match(&url).then_some(url))
    })
    .await?;
    log::info!("Signed in; now at {landed}");
    Ok(())
}

/// Poll the performance log until the page has requested its transactions.
pub async fn wait_for_transactions_request<B: Browser>(
    browser: &B,
    settings: &CaptureSettings,
) -> Result<InterceptedRequest> {
    poll_until("the transactions request", settings.request_wait(), async || {
        let entries = browser.performance_log().await?;
        log::debug!("read {} performance log entries", entries.len());
        find_request(&entries, &settings.transactions_path_suffix)
    })
    .await
}

/// The whole sequence against an already started browser.
pub async fn capture_payload<B: Browser>(
    browser: &B,
    http: &reqwest::Client,
    creds: &Credentials,
    settings: &CaptureSettings,
) -> Result<TransactionsPayload> {
    sign_in(browser, creds, settings).await?;

    log::info!("Watching network traffic for the transactions request");
    let request = wait_for_transactions_request(browser, settings).await?;

    let url = rewrite_query(&request.url, settings.page_size)?;
    replay(http, url, &request.headers).await
}

/// Browser-backed [`TransactionSource`]; owns the session and closes it after the fetch.
pub struct LiveCapture<B> {
    browser: B,
    http: reqwest::Client,
    credentials: Credentials,
    settings: CaptureSettings,
}

impl<B: Browser> LiveCapture<B> {
    pub fn new(browser: B, credentials: Credentials, settings: CaptureSettings) -> Self {
        Self::with_http_client(browser, reqwest::Client::new(), credentials, settings)
    }

    pub fn with_http_client(
        browser: B,
        http: reqwest::Client,
        credentials: Credentials,
        settings: CaptureSettings,
    ) -> Self {
        Self {
            browser,
            http,
            credentials,
            settings,
        }
    }
}

impl<B: Browser> TransactionSource for LiveCapture<B> {
    fn describe(&self) -> String {
        format!("live capture from {}", self.settings.portal_url)
    }

    async fn fetch(self) -> Result<TransactionsPayload> {
        let LiveCapture {
            browser,
            http,
            credentials,
            settings,
        } = self;

        with_session(browser, async |b: &B| {
            capture_payload(b, &http, &credentials, &settings).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_accounts_pattern() {
        let re = Regex::new(&CaptureSettings::default().accounts_url_pattern).unwrap();
        assert!(re.is_match("https://www.transaction.card.fnbo.com/accounts/123/summary"));
        assert!(!re.is_match("https://www.transaction.card.fnbo.com/"));
        assert!(!re.is_match("https://evil.example/?r=https://www.transaction.card.fnbo.com/accounts/"));
    }

    #[test]
    fn test_request_wait_uses_configured_interval() {
        let s = CaptureSettings {
            request_timeout_secs: 60,
            poll_interval_secs: 3,
            ..CaptureSettings::default()
        };
        assert_eq!(
            s.request_wait(),
            PollSpec::new(Duration::from_secs(60), Duration::from_secs(3))
        );
    }

    #[test]
    fn test_request_wait_interval_has_a_floor() {
        let s = CaptureSettings {
            poll_interval_secs: 0,
            ..CaptureSettings::default()
        };
        assert_eq!(s.request_wait().interval, ELEMENT_POLL_INTERVAL);
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let c = Credentials {
            username: "me".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{c:?}").contains("hunter2"));
    }

    #[test]
    fn test_settings_fill_missing_fields_from_defaults() {
        let s: CaptureSettings = serde_json::from_str(r#"{"page_size": 500}"#).unwrap();
        assert_eq!(s.page_size, 500);
        assert_eq!(s.sign_in_timeout_secs, 20);
    }
}

//! Find the page's own transactions request in Chrome's performance log.
//!
//! Each log entry wraps a DevTools event; the interesting one is
//! `Network.requestWillBeSent`, whose `params.request` carries the URL and the
//! headers (including the session's bearer token) the page used.

use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::browser::LogEntry;

pub const REQUEST_WILL_BE_SENT: &str = "Network.requestWillBeSent";

/// A request the page issued, as DevTools saw it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InterceptedRequest {
    pub url: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct Envelope {
    message: DevtoolsEvent,
}

#[derive(Deserialize)]
struct DevtoolsEvent {
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Deserialize)]
struct RequestWillBeSent {
    request: InterceptedRequest,
}

fn path_matches(url: &str, suffix: &str) -> bool {
    match Url::parse(url) {
        Ok(u) => u.path().ends_with(suffix),
        Err(_) => false,
    }
}

/// First `requestWillBeSent` whose URL path ends with `path_suffix`.
///
/// A log entry that is not valid DevTools JSON is an error; events of other
/// kinds are skipped.
pub fn find_request(entries: &[LogEntry], path_suffix: &str) -> Result<Option<InterceptedRequest>> {
    for entry in entries {
        let envelope: Envelope =
            serde_json::from_str(&entry.message).context("parse performance log message")?;
        let event = envelope.message;
        if event.method != REQUEST_WILL_BE_SENT {
            continue;
        }

        let sent: RequestWillBeSent =
            serde_json::from_value(event.params).context("parse requestWillBeSent params")?;
        if path_matches(&sent.request.url, path_suffix) {
            log::debug!("intercepted {} {}", sent.request.method, sent.request.url);
            return Ok(Some(sent.request));
        }
    }
    Ok(None)
}

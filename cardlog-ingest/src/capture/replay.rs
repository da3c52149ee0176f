//! Re-issue the intercepted transactions request for one large page.

use anyhow::{Context, Result};
use cardlog_core::TransactionsPayload;
use reqwest::Url;
use reqwest::header::{ACCEPT_ENCODING, HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;

use crate::error::CaptureError;

pub const PAGE_SIZE_PARAM: &str = "pageSize";
pub const CURSOR_PARAM: &str = "nextKey";
pub const FIRST_PAGE_CURSOR: &str = "0";

/// Set `pageSize` and reset `nextKey`, leaving every other parameter in place.
///
/// Parameters keep their original order; either one is appended when the
/// original URL lacks it, and duplicates of it collapse to a single value.
pub fn rewrite_query(url: &str, page_size: u32) -> Result<Url> {
    let mut url = Url::parse(url).with_context(|| format!("parse intercepted url {url}"))?;
    let page_size = page_size.to_string();

    let mut pairs: Vec<(String, String)> = Vec::new();
    let (mut has_size, mut has_cursor) = (false, false);
    for (k, v) in url.query_pairs().into_owned() {
        if k == PAGE_SIZE_PARAM {
            if !has_size {
                has_size = true;
                pairs.push((k, page_size.clone()));
            }
        } else if k == CURSOR_PARAM {
            if !has_cursor {
                has_cursor = true;
                pairs.push((k, FIRST_PAGE_CURSOR.to_string()));
            }
        } else {
            pairs.push((k, v));
        }
    }
    if !has_cursor {
        pairs.push((CURSOR_PARAM.to_string(), FIRST_PAGE_CURSOR.to_string()));
    }
    if !has_size {
        pairs.push((PAGE_SIZE_PARAM.to_string(), page_size));
    }

    url.query_pairs_mut().clear().extend_pairs(pairs);
    Ok(url)
}

/// Turn DevTools header pairs into a request header map.
///
/// HTTP/2 pseudo-headers are dropped, and so is `Accept-Encoding` so the
/// response arrives as plain JSON.
pub fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        if name.starts_with(':') {
            continue;
        }
        let name = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("invalid captured header name {name:?}"))?;
        if name == ACCEPT_ENCODING {
            continue;
        }
        let value = HeaderValue::from_str(value)
            .with_context(|| format!("invalid captured value for header {name}"))?;
        map.append(name, value);
    }
    Ok(map)
}

/// GET `url` with the captured headers and parse the transactions payload.
pub async fn replay(
    http: &reqwest::Client,
    url: Url,
    headers: &BTreeMap<String, String>,
) -> Result<TransactionsPayload> {
    let headers = header_map(headers)?;
    log::info!("requesting {url}");

    let resp = http
        .get(url)
        .headers(headers)
        .send()
        .await
        .context("replay transactions request")?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(CaptureError::ReplayFailed {
            status: status.as_u16(),
            body,
        }
        .into());
    }

    let body: serde_json::Value = resp.json().await.context("parse transactions response")?;
    TransactionsPayload::from_json_value(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(url: &Url) -> Vec<(String, String)> {
        url.query_pairs().into_owned().collect()
    }

    #[test]
    fn test_overrides_only_cursor_and_page_size() {
        let url = rewrite_query(
            "https://www.transaction.card.fnbo.com/v1/credit-card-accounts/77/posted-transactions?locale=en-US&nextKey=MjU%3D&pageSize=25&filter=all",
            300,
        )
        .unwrap();

        assert_eq!(url.path(), "/v1/credit-card-accounts/77/posted-transactions");
        assert_eq!(
            query(&url),
            vec![
                ("locale".to_string(), "en-US".to_string()),
                ("nextKey".to_string(), "0".to_string()),
                ("pageSize".to_string(), "300".to_string()),
                ("filter".to_string(), "all".to_string()),
            ]
        );
    }

    #[test]
    fn test_adds_missing_parameters() {
        let url = rewrite_query("https://portal.example/x/posted-transactions?sort=desc", 50).unwrap();
        assert_eq!(url.query(), Some("sort=desc&nextKey=0&pageSize=50"));
    }

    #[test]
    fn test_duplicate_parameters_collapse() {
        let url = rewrite_query(
            "https://portal.example/p?pageSize=10&nextKey=5&pageSize=20&tag=a&tag=b",
            300,
        )
        .unwrap();
        assert_eq!(url.query(), Some("pageSize=300&nextKey=0&tag=a&tag=b"));
    }

    #[test]
    fn test_rejects_unparseable_url() {
        assert!(rewrite_query("not a url", 300).is_err());
    }

    #[test]
    fn test_header_map_keeps_auth_and_drops_pseudo_and_encoding() {
        let mut captured = BTreeMap::new();
        captured.insert("Authorization".to_string(), "Bearer abc".to_string());
        captured.insert("X-Client-Id".to_string(), "web".to_string());
        captured.insert(":authority".to_string(), "portal.example".to_string());
        captured.insert("Accept-Encoding".to_string(), "gzip, br".to_string());

        let map = header_map(&captured).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["authorization"], "Bearer abc");
        assert_eq!(map["x-client-id"], "web");
    }

    #[test]
    fn test_header_map_rejects_bad_values() {
        let mut captured = BTreeMap::new();
        captured.insert("X-Bad".to_string(), "line\nbreak".to_string());
        assert!(header_map(&captured).is_err());
    }
}

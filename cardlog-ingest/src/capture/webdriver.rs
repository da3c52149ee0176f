//! Minimal W3C WebDriver client over `reqwest`, covering exactly what sign-in
//! and network-log capture use.

use anyhow::{Context, Result};
use reqwest::{Method, Url};
use serde_json::{Value, json};

use super::browser::{Browser, ElementRef, LogEntry};
use crate::error::CaptureError;

/// Key W3C uses for element references in JSON.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const SUBMIT_SCRIPT: &str = "var f = arguments[0]; \
if (typeof f.requestSubmit === 'function') { f.requestSubmit(); } else { f.submit(); }";

/// Chrome capabilities with DevTools performance logging switched on.
pub fn chrome_capabilities(headless: bool, extra_args: &[String]) -> Value {
    let mut args: Vec<String> = Vec::new();
    if headless {
        args.push("--headless=new".to_string());
    }
    args.extend(extra_args.iter().cloned());

    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:loggingPrefs": { "performance": "ALL" },
                "goog:chromeOptions": { "args": args }
            }
        }
    })
}

/// Send one WebDriver command and unwrap the `value` member of the reply.
async fn send_command(
    http: &reqwest::Client,
    method: Method,
    url: Url,
    body: Option<Value>,
    command: &str,
) -> Result<Value> {
    let mut req = http.request(method, url);
    if let Some(body) = body {
        req = req.json(&body);
    }

    let resp = req
        .send()
        .await
        .with_context(|| format!("webdriver {command} request"))?;
    let status = resp.status();
    let text = resp
        .text()
        .await
        .with_context(|| format!("read webdriver {command} response"))?;

    let mut reply: Value = serde_json::from_str(&text).map_err(|e| CaptureError::UnexpectedResponse {
        command: command.to_string(),
        detail: format!("{status}: {e}: {text}"),
    })?;
    let value = reply.get_mut("value").map(Value::take).unwrap_or(Value::Null);

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        return Err(CaptureError::WebDriver {
            command: command.to_string(),
            status: status.as_u16(),
            error: error.to_string(),
            message: value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }
        .into());
    }
    if !status.is_success() {
        return Err(CaptureError::UnexpectedResponse {
            command: command.to_string(),
            detail: format!("{status}: {text}"),
        }
        .into());
    }

    Ok(value)
}

/// Entry point of a WebDriver server such as chromedriver
#[derive(Debug, Clone)]
pub struct WebDriverClient {
    http: reqwest::Client,
    base: Url,
}

impl WebDriverClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url).with_context(|| format!("parse webdriver url {base_url}"))?;
        // Joins below are relative; without the slash the last segment is replaced.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("build webdriver url for {path}"))
    }

    /// `GET /status` reports `ready: true`. Connection failures count as not ready.
    pub async fn is_ready(&self) -> bool {
        let url = match self.endpoint("status") {
            Ok(u) => u,
            Err(_) => return false,
        };
        match send_command(&self.http, Method::GET, url, None, "status").await {
            Ok(v) => v.get("ready").and_then(Value::as_bool).unwrap_or(false),
            Err(e) => {
                log::debug!("webdriver not ready: {e:#}");
                false
            }
        }
    }

    pub async fn new_session(&self, capabilities: Value) -> Result<WebDriverSession> {
        let value = send_command(
            &self.http,
            Method::POST,
            self.endpoint("session")?,
            Some(capabilities),
            "new session",
        )
        .await?;

        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| CaptureError::UnexpectedResponse {
                command: "new session".to_string(),
                detail: format!("no sessionId in {value}"),
            })?
            .to_string();

        log::info!("started browser session {id}");
        Ok(WebDriverSession {
            http: self.http.clone(),
            base: self.base.clone(),
            id,
        })
    }
}

/// A live browser session; closed with [`Browser::quit`].
#[derive(Debug, Clone)]
pub struct WebDriverSession {
    http: reqwest::Client,
    base: Url,
    id: String,
}

impl WebDriverSession {
    async fn command(&self, method: Method, path: &str, body: Option<Value>, command: &str) -> Result<Value> {
        let url = self
            .base
            .join(&format!("session/{}{}", self.id, path))
            .with_context(|| format!("build webdriver url for {command}"))?;
        send_command(&self.http, method, url, body, command).await
    }

    fn element_json(element: &ElementRef) -> Value {
        json!({ ELEMENT_KEY: element.0 })
    }
}

fn element_from_value(value: &Value) -> Option<ElementRef> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(|id| ElementRef(id.to_string()))
}

impl Browser for WebDriverSession {
    async fn goto(&self, url: &str) -> Result<()> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })), "navigate")
            .await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let v = self.command(Method::GET, "/url", None, "get url").await?;
        v.as_str().map(str::to_string).ok_or_else(|| {
            CaptureError::UnexpectedResponse {
                command: "get url".to_string(),
                detail: v.to_string(),
            }
            .into()
        })
    }

    async fn find_element(&self, css: &str) -> Result<Option<ElementRef>> {
        let body = json!({ "using": "css selector", "value": css });
        match self.command(Method::POST, "/element", Some(body), "find element").await {
            Ok(v) => element_from_value(&v).map(Some).ok_or_else(|| {
                CaptureError::UnexpectedResponse {
                    command: "find element".to_string(),
                    detail: v.to_string(),
                }
                .into()
            }),
            Err(e)
                if e
                    .downcast_ref::<CaptureError>()
                    .is_some_and(CaptureError::is_no_such_element) =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn clear(&self, element: &ElementRef) -> Result<()> {
        let path = format!("/element/{}/clear", element.0);
        self.command(Method::POST, &path, Some(json!({})), "element clear")
            .await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()> {
        let path = format!("/element/{}/value", element.0);
        self.command(Method::POST, &path, Some(json!({ "text": text })), "element send keys")
            .await?;
        Ok(())
    }

    async fn submit(&self, form: &ElementRef) -> Result<()> {
        let body = json!({ "script": SUBMIT_SCRIPT, "args": [Self::element_json(form)] });
        self.command(Method::POST, "/execute/sync", Some(body), "submit form")
            .await?;
        Ok(())
    }

    async fn performance_log(&self) -> Result<Vec<LogEntry>> {
        let v = self
            .command(Method::POST, "/se/log", Some(json!({ "type": "performance" })), "get log")
            .await?;
        serde_json::from_value(v).context("parse performance log entries")
    }

    async fn quit(&self) -> Result<()> {
        let url = self
            .base
            .join(&format!("session/{}", self.id))
            .context("build webdriver url for delete session")?;
        send_command(&self.http, Method::DELETE, url, None, "delete session").await?;
        log::info!("closed browser session {}", self.id);
        Ok(())
    }
}

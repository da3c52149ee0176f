//! Locate or start the WebDriver server the capture talks to.

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use super::WebDriverSettings;
use super::webdriver::WebDriverClient;
use crate::wait::{PollSpec, poll_until};

const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A chromedriver we launched ourselves; killed when dropped.
#[derive(Debug)]
pub struct DriverProcess {
    child: tokio::process::Child,
    program: PathBuf,
}

impl DriverProcess {
    pub async fn shutdown(mut self) {
        match self.child.kill().await {
            Ok(()) => log::debug!("stopped {}", self.program.display()),
            Err(e) => log::warn!("failed to stop {}: {e}", self.program.display()),
        }
    }
}

fn chromedriver_program(settings: &WebDriverSettings) -> Option<PathBuf> {
    match &settings.chromedriver_command {
        Some(cmd) => Some(PathBuf::from(cmd)),
        None => which::which("chromedriver").ok(),
    }
}

/// Connect to the configured WebDriver endpoint, launching chromedriver on its
/// port when nothing is listening yet.
pub async fn connect(settings: &WebDriverSettings) -> Result<(WebDriverClient, Option<DriverProcess>)> {
    let client = WebDriverClient::new(&settings.url)?;
    if client.is_ready().await {
        log::info!("using WebDriver at {}", client.base_url());
        return Ok((client, None));
    }

    let Some(program) = chromedriver_program(settings) else {
        bail!(
            "no WebDriver server at {} and chromedriver was not found on PATH \
(install it or set webdriver.chromedriver_command in the config)",
            settings.url
        );
    };
    let port = client
        .base_url()
        .port_or_known_default()
        .context("webdriver url has no port")?;

    log::info!("starting {} on port {port}", program.display());
    let child = tokio::process::Command::new(&program)
        .arg(format!("--port={port}"))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("spawning {}", program.display()))?;
    let process = DriverProcess { child, program };

    poll_until(
        "chromedriver to become ready",
        PollSpec::from_secs(settings.startup_timeout_secs, STARTUP_POLL_INTERVAL),
        async || Ok(client.is_ready().await.then_some(())),
    )
    .await?;

    Ok((client, Some(process)))
}

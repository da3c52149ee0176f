use anyhow::{Context, Result};
use cardlog_core::{DescriptionMatch, ExportFormat, NormalizeOptions, SignConvention};
use cardlog_ingest::{CaptureSettings, WebDriverSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{default_config_path, ensure_cardlog_home};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub portal: CaptureSettings,
    pub webdriver: WebDriverSettings,
    pub capture: ToolSection,
    pub feed: ToolSection,
}

/// Per-tool output conventions; unset fields fall back to the tool's built-in default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSection {
    pub sign: Option<SignConvention>,
    #[serde(rename = "match")]
    pub matching: Option<DescriptionMatch>,
    pub format: Option<ExportFormat>,
    pub output_file: Option<PathBuf>,
}

impl ToolSection {
    fn filled(opts: NormalizeOptions, format: ExportFormat, output_file: Option<&str>) -> Self {
        Self {
            sign: Some(opts.sign),
            matching: Some(opts.matching),
            format: Some(format),
            output_file: output_file.map(PathBuf::from),
        }
    }

    /// Flag value, else this section, else the tool's built-in format.
    pub fn export_format(&self, base: ExportFormat, flag: Option<ExportFormat>) -> ExportFormat {
        flag.or(self.format).unwrap_or(base)
    }

    /// Flag value, else this section, else `base`.
    pub fn normalize_options(
        &self,
        base: NormalizeOptions,
        sign: Option<SignConvention>,
        matching: Option<DescriptionMatch>,
    ) -> NormalizeOptions {
        NormalizeOptions {
            sign: sign.or(self.sign).unwrap_or(base.sign),
            matching: matching.or(self.matching).unwrap_or(base.matching),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            portal: CaptureSettings::default(),
            webdriver: WebDriverSettings::default(),
            capture: ToolSection::filled(
                NormalizeOptions::live_capture(),
                ExportFormat::Csv,
                Some("output.csv"),
            ),
            feed: ToolSection::filled(NormalizeOptions::manual_feed(), ExportFormat::Text, None),
        }
    }
}

pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => default_config_path(),
    }
}

pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let p = config_path(explicit)?;
    if !p.exists() {
        log::debug!("no config at {}, using defaults", p.display());
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(explicit: Option<&Path>) -> Result<()> {
    let p = match explicit {
        Some(p) => p.to_path_buf(),
        None => ensure_cardlog_home()?.join("config.toml"),
    };
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}

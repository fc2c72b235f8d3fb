use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use reembolso_storage::SheetLayout;
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "reembolso.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen: String,
    /// Blank reimbursement template (.xlsx).
    pub template_path: PathBuf,
    /// Filled copy; created from the template on first use.
    pub destination_path: PathBuf,
    pub sheet: SheetLayout,
    pub ocr: OcrConfig,
    pub twilio: TwilioConfig,
    /// Timeout for media downloads and NFC-e page fetches.
    pub http_timeout_secs: u64,
    /// Unfinished intake sessions idle this long are forgotten.
    pub intake_idle_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub lang: String,
    pub tessdata: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:5000".to_string(),
            template_path: PathBuf::from("planilha_reembolso_branco.xlsx"),
            destination_path: PathBuf::from("reembolso_preenchido.xlsx"),
            sheet: SheetLayout::default(),
            ocr: OcrConfig::default(),
            twilio: TwilioConfig::default(),
            http_timeout_secs: 60,
            intake_idle_secs: 24 * 60 * 60,
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self { lang: "por".to_string(), tessdata: None }
    }
}

impl Config {
    /// Reads `$REEMBOLSO_CONFIG` (or `reembolso.toml`) if present, then
    /// applies environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("REEMBOLSO_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = get("TWILIO_ACCOUNT_SID") {
            self.twilio.account_sid = v;
        }
        if let Some(v) = get("TWILIO_AUTH_TOKEN") {
            self.twilio.auth_token = v;
        }
        if let Some(v) = get("REEMBOLSO_LISTEN") {
            self.listen = v;
        }
    }

    pub fn intake_idle(&self) -> Duration {
        Duration::from_secs(self.intake_idle_secs)
    }

    /// Media URLs are only downloadable with the account credentials.
    pub fn require_credentials(&self) -> anyhow::Result<()> {
        if self.twilio.account_sid.trim().is_empty() || self.twilio.auth_token.trim().is_empty() {
            bail!("TWILIO_ACCOUNT_SID and TWILIO_AUTH_TOKEN must be set (environment or .env)");
        }
        Ok(())
    }
}

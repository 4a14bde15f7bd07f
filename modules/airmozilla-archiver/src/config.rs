use anyhow::{Context, Result};
use chrono::Duration;
use serde::Deserialize;
use std::path::Path;

use vidly_client::{VidlyOptions, DEFAULT_API_URL};

const DEFAULT_PROVIDER_MARKER: &str = "Vid.ly";
const DEFAULT_PESTER_INTERVAL_DAYS: i64 = 1;

/// Secrets and environment-specific values loaded from environment variables.
/// Everything else lives in the TOML FileConfig.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Database
    pub database_url: String,

    // Vid.ly
    pub vidly_api_url: String,
    pub vidly_user_id: String,
    pub vidly_user_key: String,

    // Outbound mail
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL is required")?,
            vidly_api_url: std::env::var("VIDLY_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            vidly_user_id: std::env::var("VIDLY_USER_ID").context("VIDLY_USER_ID is required")?,
            vidly_user_key: std::env::var("VIDLY_USER_KEY")
                .context("VIDLY_USER_KEY is required")?,
            smtp_host: std::env::var("SMTP_HOST").ok().filter(|s| !s.is_empty()),
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .map(|p| p.parse())
                .transpose()
                .context("SMTP_PORT must be a number")?,
            smtp_username: std::env::var("SMTP_USERNAME").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        };

        config.log_keys();
        Ok(config)
    }

    pub fn vidly_options(&self) -> VidlyOptions {
        VidlyOptions {
            api_url: self.vidly_api_url.clone(),
            user_id: self.vidly_user_id.clone(),
            user_key: self.vidly_user_key.clone(),
        }
    }

    fn log_keys(&self) {
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => preview(v),
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  VIDLY_API_URL: {}", self.vidly_api_url);
        tracing::info!("  VIDLY_USER_ID: {}", self.vidly_user_id);
        tracing::info!("  VIDLY_USER_KEY: {}", preview(&self.vidly_user_key));
        tracing::info!("  SMTP_HOST: {}", self.smtp_host.as_deref().unwrap_or("<not set>"));
        tracing::info!("  SMTP_PASSWORD: {}", preview_opt(&self.smtp_password));
    }
}

/// First three characters and the length, for logging secrets.
fn preview(val: &str) -> String {
    let head: String = val.chars().take(3).collect();
    format!("{}...({} chars)", head, val.chars().count())
}

/// TOML-backed configuration loaded from disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub archiver: ArchiverSection,
    #[serde(default)]
    pub administrators: Vec<Administrator>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiverSection {
    /// Base URL of the management site, used to build edit links.
    pub site_url: String,
    pub from_address: String,
    #[serde(default = "default_provider_marker")]
    pub provider_marker: String,
    #[serde(default = "default_pester_interval_days")]
    pub pester_interval_days: i64,
}

fn default_provider_marker() -> String {
    DEFAULT_PROVIDER_MARKER.to_string()
}

fn default_pester_interval_days() -> i64 {
    DEFAULT_PESTER_INTERVAL_DAYS
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Administrator {
    pub name: String,
    pub email: String,
}

/// Settings handed to the reconciler at construction.
#[derive(Debug, Clone)]
pub struct ArchiverConfig {
    pub administrators: Vec<Administrator>,
    /// Delay between `watch` sweeps. Event age plays no part in reconciliation.
    pub pester_interval: Duration,
    pub site_url: String,
    pub provider_marker: String,
}

impl ArchiverConfig {
    pub fn new(administrators: Vec<Administrator>, site_url: &str) -> Self {
        Self {
            administrators,
            pester_interval: Duration::days(DEFAULT_PESTER_INTERVAL_DAYS),
            site_url: site_url.trim_end_matches('/').to_string(),
            provider_marker: DEFAULT_PROVIDER_MARKER.to_string(),
        }
    }

    pub fn admin_addresses(&self) -> Vec<String> {
        self.administrators.iter().map(|a| a.email.clone()).collect()
    }

    /// Management page for an event.
    pub fn event_edit_url(&self, event_id: i64) -> String {
        format!("{}/manage/events/{}/", self.site_url, event_id)
    }
}

impl TryFrom<&FileConfig> for ArchiverConfig {
    type Error = anyhow::Error;

    fn try_from(file: &FileConfig) -> Result<Self> {
        Ok(Self {
            administrators: file.administrators.clone(),
            pester_interval: pester_interval(file.archiver.pester_interval_days)?,
            site_url: file.archiver.site_url.trim_end_matches('/').to_string(),
            provider_marker: file.archiver.provider_marker.clone(),
        })
    }
}

fn pester_interval(days: i64) -> Result<Duration> {
    if days < 1 {
        anyhow::bail!("pester_interval_days must be at least 1");
    }
    Duration::try_days(days)
        .with_context(|| format!("pester_interval_days is out of range: {days}"))
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn parse_config(content: &str) -> Result<FileConfig> {
    let config: FileConfig = toml::from_str(content)?;
    pester_interval(config.archiver.pester_interval_days)?;
    if config.administrators.is_empty() {
        anyhow::bail!("at least one [[administrators]] entry is required");
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[archiver]
site_url = "https://air.example.com/"
from_address = "archiver@example.com"
pester_interval_days = 3

[[administrators]]
name = "F"
email = "foo@bar.com"

[[administrators]]
name = "B"
email = "bar@foo.com"
"#;

    #[test]
    fn file_config_builds_archiver_config() {
        let file = parse_config(SAMPLE).unwrap();
        let config = ArchiverConfig::try_from(&file).unwrap();

        assert_eq!(config.provider_marker, "Vid.ly");
        assert_eq!(config.pester_interval, Duration::days(3));
        assert_eq!(config.admin_addresses(), vec!["foo@bar.com", "bar@foo.com"]);
        assert_eq!(
            config.event_edit_url(7),
            "https://air.example.com/manage/events/7/"
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let bad = SAMPLE.replace("pester_interval_days = 3", "pester_days = 3");
        assert!(parse_config(&bad).is_err());
    }

    #[test]
    fn zero_pester_interval_is_rejected() {
        let bad = SAMPLE.replace("pester_interval_days = 3", "pester_interval_days = 0");
        assert!(parse_config(&bad).is_err());
    }

    #[test]
    fn oversized_pester_interval_is_rejected() {
        let bad = SAMPLE.replace(
            "pester_interval_days = 3",
            "pester_interval_days = 9223372036854775807",
        );
        let err = parse_config(&bad).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn empty_administrators_are_rejected() {
        let bad = SAMPLE
            .split("[[administrators]]")
            .next()
            .unwrap()
            .to_string();
        let err = parse_config(&bad).unwrap_err();
        assert!(err.to_string().contains("administrators"));
    }

    #[test]
    fn preview_keeps_multibyte_secrets_intact() {
        assert_eq!(preview("ünïcode-key"), "ünï...(11 chars)");
        assert_eq!(preview("ab"), "ab...(2 chars)");
    }
}

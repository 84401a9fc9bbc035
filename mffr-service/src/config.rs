use serde::Deserialize;
use std::{fs, path::PathBuf};

use anyhow::{anyhow, bail, Context};
use chrono_tz::Tz;

use crate::transform::SettlementParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    Http,
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub kind: FeedKind,
    pub url: Option<String>,
    pub path: Option<PathBuf>,
    /// Optional fixed bounds passed to the feed endpoint.
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettlementConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(flatten)]
    pub params: SettlementParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub bind_addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    pub feed: FeedConfig,
    #[serde(default)]
    pub settlement: SettlementConfig,
    #[serde(default)]
    pub api: ApiConfig,
    pub metrics: Option<MetricsConfig>,
}

fn default_timezone() -> String {
    "Europe/Tallinn".to_string()
}

fn default_limit() -> u32 {
    mffr_client::feed::slot_queries::DEFAULT_LIMIT
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_refresh_interval_secs() -> u64 {
    60
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("MFFR_CONFIG").unwrap_or_else(|_| "mffr-config.toml".to_string());
        let contents =
            fs::read_to_string(&path).with_context(|| format!("failed to read config {path}"))?;
        Self::from_toml_str(&contents).with_context(|| format!("invalid config {path}"))
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn zone(&self) -> anyhow::Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("invalid timezone '{}': {e}", self.timezone))
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.zone()?;

        match self.feed.kind {
            FeedKind::Http if self.feed.url.is_none() => bail!("feed.url is required for kind = \"http\""),
            FeedKind::File if self.feed.path.is_none() => bail!("feed.path is required for kind = \"file\""),
            _ => {}
        }
        if self.feed.refresh_interval_secs == 0 {
            bail!("feed.refresh_interval_secs must be positive");
        }

        let share = self.settlement.params.fusebox_share;
        if !(0.0..1.0).contains(&share) {
            bail!("settlement.fusebox_share must be in [0, 1), got {share}");
        }
        Ok(())
    }
}

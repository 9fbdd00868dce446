use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable that overrides `[api].base_url`.
pub const API_URL_ENV: &str = "MDASH_API_URL";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout. Unset leaves the HTTP client's default in place.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5001".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_health_poll_ms")]
    pub health_poll_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            health_poll_ms: default_health_poll_ms(),
        }
    }
}

fn default_health_poll_ms() -> u64 {
    30_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_document_limit")]
    pub document_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            document_limit: default_document_limit(),
        }
    }
}

fn default_document_limit() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_subtitle")]
    pub subtitle: String,
    #[serde(default = "default_banner")]
    pub banner: String,
    #[serde(default = "default_data_sources")]
    pub data_sources: Vec<String>,
    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            subtitle: default_subtitle(),
            banner: default_banner(),
            data_sources: default_data_sources(),
            color: default_color(),
        }
    }
}

fn default_title() -> String {
    "ZZZ Accounting".to_string()
}
fn default_subtitle() -> String {
    "Merger Integration Platform".to_string()
}
fn default_banner() -> String {
    "ZZZ + AAA + BBB Integration".to_string()
}
fn default_data_sources() -> Vec<String> {
    vec![
        "ZZZ Accounting".to_string(),
        "AAA Accounting".to_string(),
        "BBB Construction".to_string(),
    ]
}
fn default_color() -> String {
    "auto".to_string()
}

impl UiConfig {
    /// Short brand shown when the sidebar is collapsed ("ZZZ").
    pub fn short_title(&self) -> &str {
        self.title.split_whitespace().next().unwrap_or(&self.title)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "warn".to_string()
}

/// Load and validate a config file.
///
/// The `MDASH_API_URL` environment variable, when set and non-empty,
/// replaces `[api].base_url`.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    apply_env(&mut config);
    validate(&config)?;
    Ok(config)
}

/// Load the config file if it exists, otherwise fall back to defaults.
///
/// A file that exists but fails to parse is still an error.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        return load_config(path);
    }
    let mut config = Config::default();
    apply_env(&mut config);
    validate(&config)?;
    Ok(config)
}

fn apply_env(config: &mut Config) {
    if let Ok(url) = std::env::var(API_URL_ENV) {
        if !url.trim().is_empty() {
            config.api.base_url = url.trim().to_string();
        }
    }
}

pub fn validate(config: &Config) -> Result<()> {
    let url = reqwest::Url::parse(&config.api.base_url)
        .with_context(|| format!("api.base_url is not a valid URL: {}", config.api.base_url))?;
    match url.scheme() {
        "http" | "https" => {}
        other => anyhow::bail!("api.base_url must use http or https, got '{}'", other),
    }

    if config.api.timeout_secs == Some(0) {
        anyhow::bail!("api.timeout_secs must be > 0 when set");
    }

    if config.dashboard.health_poll_ms == 0 {
        anyhow::bail!("dashboard.health_poll_ms must be > 0");
    }

    if config.search.document_limit < 1 {
        anyhow::bail!("search.document_limit must be >= 1");
    }

    match config.ui.color.as_str() {
        "auto" | "always" | "never" => {}
        other => anyhow::bail!(
            "Unknown ui.color mode: '{}'. Must be auto, always, or never.",
            other
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("mdash.toml");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn empty_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.dashboard.health_poll_ms, 30_000);
        assert_eq!(cfg.search.document_limit, 5);
        assert_eq!(cfg.ui.data_sources.len(), 3);
        assert_eq!(cfg.ui.short_title(), "ZZZ");
        assert!(cfg.api.timeout_secs.is_none());
    }

    #[test]
    fn sections_override_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r#"
[api]
base_url = "https://rag.internal:8443"
timeout_secs = 12

[dashboard]
health_poll_ms = 5000

[ui]
title = "Acme Holdings"
color = "never"
"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.api.timeout_secs, Some(12));
        assert_eq!(cfg.dashboard.health_poll_ms, 5000);
        assert_eq!(cfg.ui.short_title(), "Acme");
        assert_eq!(cfg.ui.color, "never");
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[dashboard]\nhealth_poll_ms = 0\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("health_poll_ms"));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut cfg = Config::default();
        cfg.api.base_url = "ftp://example.com".to_string();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn rejects_unknown_color_mode() {
        let mut cfg = Config::default();
        cfg.ui.color = "sometimes".to_string();
        let err = validate(&cfg).unwrap_err();
        assert!(err.to_string().contains("ui.color"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = load_or_default(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.search.document_limit, 5);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[api\nbase_url = ");
        assert!(load_or_default(&path).is_err());
    }
}

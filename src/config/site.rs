//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::helpers::{DateFormatter, Locale};

/// Environment variable overriding `prismic.endpoint`
pub const ENV_ENDPOINT: &str = "PRISMIC_API_ENDPOINT";
/// Environment variable overriding `prismic.access_token`
pub const ENV_ACCESS_TOKEN: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub source_dir: String,
    pub public_dir: String,
    pub i18n_dir: String,

    // Display
    pub date_format: String,
    pub words_per_minute: usize,

    /// Minimum seconds between regenerations of a page
    pub revalidate: u64,

    // Content API
    #[serde(default)]
    pub prismic: PrismicConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            language: "pt-BR".to_string(),
            timezone: "UTC".to_string(),

            url: "http://localhost:4000".to_string(),
            root: "/".to_string(),

            source_dir: "source".to_string(),
            public_dir: "public".to_string(),
            i18n_dir: "languages".to_string(),

            date_format: "DD MMM YYYY".to_string(),
            words_per_minute: crate::content::WORDS_PER_MINUTE,

            revalidate: 60 * 60,

            prismic: PrismicConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }

    /// Apply `PRISMIC_API_ENDPOINT` / `PRISMIC_ACCESS_TOKEN` if set
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_ENDPOINT).ok(),
            std::env::var(ENV_ACCESS_TOKEN).ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|s| !s.trim().is_empty()) {
            tracing::debug!("Using content API endpoint from {}", ENV_ENDPOINT);
            self.prismic.endpoint = endpoint;
        }
        if let Some(token) = token.filter(|s| !s.trim().is_empty()) {
            self.prismic.access_token = Some(token);
        }
    }

    /// Check the settings needed to reach the content API
    pub fn validate(&self) -> Result<()> {
        if self.prismic.endpoint.trim().is_empty() {
            anyhow::bail!(
                "prismic.endpoint is not set (set it in _config.yml or {})",
                ENV_ENDPOINT
            );
        }
        if self.prismic.page_size == 0 {
            anyhow::bail!("prismic.page_size must be at least 1");
        }
        self.tz()?;
        Ok(())
    }

    /// Display locale, falling back to pt-BR for unknown tags
    pub fn locale(&self) -> Locale {
        Locale::from_tag(&self.language).unwrap_or_else(|| {
            tracing::warn!("Unsupported language {:?}, using pt-BR", self.language);
            Locale::PtBr
        })
    }

    /// Display timezone
    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        if self.timezone.trim().is_empty() {
            return Ok(chrono_tz::UTC);
        }
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone {:?}: {}", self.timezone, e))
    }

    /// Formatter for publication dates
    pub fn date_formatter(&self) -> Result<DateFormatter> {
        Ok(DateFormatter::new(
            &self.date_format,
            self.locale(),
            self.tz()?,
        ))
    }

    /// Revalidate interval as a duration
    pub fn revalidate_interval(&self) -> Duration {
        Duration::from_secs(self.revalidate)
    }
}

/// Content API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismicConfig {
    /// API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
    pub page_size: usize,
    /// Fields requested from each document
    pub fetch: Vec<String>,
    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for PrismicConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 2,
            fetch: ["title", "subtitle", "author", "banner", "content"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "spacetraveling");
        assert_eq!(config.revalidate, 3600);
        assert_eq!(config.words_per_minute, 200);
        assert_eq!(config.prismic.page_size, 2);
        assert_eq!(config.prismic.document_type, "posts");
        assert_eq!(config.locale(), Locale::PtBr);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
language: en
timezone: America/Sao_Paulo
revalidate: 60
prismic:
  endpoint: https://blog.cdn.prismic.io/api/v2
  page_size: 5
github_username: someone
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.locale(), Locale::En);
        assert_eq!(config.revalidate_interval(), Duration::from_secs(60));
        assert_eq!(config.prismic.page_size, 5);
        assert_eq!(config.prismic.document_type, "posts");
        assert_eq!(config.prismic.fetch.len(), 5);
        assert!(config.extra.contains_key("github_username"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_endpoint_and_bad_timezone() {
        let mut config = SiteConfig::default();
        assert!(config.validate().is_err());

        config.prismic.endpoint = "https://blog.cdn.prismic.io/api/v2".into();
        config.timezone = "Mars/Olympus".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_ignore_empty_values() {
        let mut config = SiteConfig::default();
        config.prismic.endpoint = "https://a/api/v2".into();
        config.apply_overrides(Some("  ".into()), Some("secret".into()));
        assert_eq!(config.prismic.endpoint, "https://a/api/v2");
        assert_eq!(config.prismic.access_token.as_deref(), Some("secret"));

        config.apply_overrides(Some("https://b/api/v2".into()), None);
        assert_eq!(config.prismic.endpoint, "https://b/api/v2");
    }
}

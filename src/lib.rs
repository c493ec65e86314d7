//! spacetraveling: a static blog generator backed by a headless CMS
//!
//! Posts are pulled from a Prismic repository, normalized into local post
//! models and rendered with embedded Tera templates. The listing page grows
//! through a "load more" control backed by the bundled server, and pages are
//! regenerated from fresh content at most once per revalidate interval.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod pagination;
pub mod server;
pub mod source;
pub mod templates;

use anyhow::Result;
use std::path::Path;

/// The main site handle
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Static asset directory, copied verbatim
    pub source_dir: std::path::PathBuf,
    /// Public (output) directory
    pub public_dir: std::path::PathBuf,
}

impl Site {
    /// Open a site from a directory, reading `_config.yml` if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env_overrides();

        Ok(Self::with_config(base_dir, config))
    }

    /// Build a site from an already-loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let source_dir = base_dir.join(&config.source_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            source_dir,
            public_dir,
        }
    }

    /// Path of the site's config file
    pub fn config_path(&self) -> std::path::PathBuf {
        self.base_dir.join("_config.yml")
    }

    /// Content API client for this site
    pub fn content_source(&self) -> Result<source::PrismicClient> {
        self.config.validate()?;
        Ok(source::PrismicClient::new(&self.config.prismic)?)
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self, false).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}

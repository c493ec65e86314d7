//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

const CONFIG_TEMPLATE: &str = r#"# Site
title: spacetraveling
description: ''
language: pt-BR
timezone: UTC

# URL
url: http://localhost:4000
root: /

# Directory
source_dir: source
public_dir: public
i18n_dir: languages

# Posts
date_format: DD MMM YYYY
words_per_minute: 200
# Seconds before a generated page is refreshed from the API
revalidate: 3600

# Content API (PRISMIC_API_ENDPOINT / PRISMIC_ACCESS_TOKEN override these)
prismic:
  endpoint: https://your-repo.cdn.prismic.io/api/v2
  document_type: posts
  page_size: 2
  timeout: 10
"#;

const STYLESHEET: &str = r#"body {
  margin: 0;
  background: #1a1d23;
  color: #d7d7d7;
  font-family: sans-serif;
}

.container {
  max-width: 720px;
  margin: 0 auto;
  padding: 0 1rem;
}

.load-more {
  border: 0;
  background: none;
  color: #ff57b2;
  cursor: pointer;
}
"#;

/// Initialize a new site in the given directory
///
/// An existing `_config.yml` is left untouched.
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("source/css"))?;
    fs::create_dir_all(target_dir.join("languages"))?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        tracing::warn!("{:?} already exists, keeping it", config_path);
    } else {
        fs::write(&config_path, CONFIG_TEMPLATE)?;
    }

    let style_path = target_dir.join("source/css/style.css");
    if !style_path.exists() {
        fs::write(style_path, STYLESHEET)?;
    }

    Ok(())
}

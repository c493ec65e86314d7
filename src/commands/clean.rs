//! Clean the public directory

use anyhow::Result;
use std::fs;

use crate::cache::CACHE_DIR;
use crate::Site;

/// Clean the public directory and generation cache
pub fn run(site: &Site) -> Result<()> {
    if site.public_dir.exists() {
        fs::remove_dir_all(&site.public_dir)?;
        tracing::info!("Deleted: {:?}", site.public_dir);
    }

    let cache_dir = site.base_dir.join(CACHE_DIR);
    if cache_dir.exists() {
        fs::remove_dir_all(&cache_dir)?;
        tracing::info!("Deleted: {:?}", cache_dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_output_and_cache() {
        let dir = TempDir::new().unwrap();
        let site = Site::with_config(dir.path(), SiteConfig::default());
        fs::create_dir_all(site.public_dir.join("post/a")).unwrap();
        fs::write(site.public_dir.join("post/a/index.html"), "x").unwrap();
        fs::create_dir_all(dir.path().join(CACHE_DIR)).unwrap();
        fs::write(dir.path().join(CACHE_DIR).join("db.json"), "{}").unwrap();
        fs::create_dir_all(&site.source_dir).unwrap();

        run(&site).unwrap();
        assert!(!site.public_dir.exists());
        assert!(!dir.path().join(CACHE_DIR).exists());
        assert!(site.source_dir.exists());

        // Nothing left to clean is fine
        run(&site).unwrap();
    }
}

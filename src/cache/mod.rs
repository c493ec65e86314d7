//! Generation cache
//!
//! Tracks, per output route, a hash of the last rendered HTML and when it was
//! produced. The generator uses it to avoid rewriting unchanged pages; the
//! server uses the timestamps to decide when a page is due for regeneration.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Cache directory, relative to the site root
pub const CACHE_DIR: &str = ".spacetraveling-cache";

/// Cache file name
const CACHE_FILE: &str = ".spacetraveling-cache/db.json";

/// What we know about one generated route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Hash of the rendered HTML
    pub content_hash: u64,
    /// When the route was last (re)generated, unix seconds
    pub generated_at: i64,
}

/// Cache database for generated routes
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheDb {
    /// Version of the cache format
    pub version: u32,
    /// Hash of the site config (changes invalidate every route)
    pub config_hash: u64,
    /// Entries keyed by route, e.g. `/` or `/post/hello/`
    pub routes: HashMap<String, CacheEntry>,
}

impl CacheDb {
    /// Current cache format version
    const VERSION: u32 = 1;

    /// Load cache from disk, or create a new empty cache
    pub fn load(base_dir: &Path) -> Self {
        let cache_path = base_dir.join(CACHE_FILE);
        if let Ok(content) = fs::read_to_string(&cache_path) {
            match serde_json::from_str::<CacheDb>(&content) {
                Ok(cache) if cache.version == Self::VERSION => return cache,
                Ok(_) => tracing::info!("Cache version mismatch, rebuilding cache"),
                Err(e) => tracing::warn!("Ignoring unreadable cache {:?}: {}", cache_path, e),
            }
        }
        Self::new()
    }

    /// Save cache to disk
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let cache_dir = base_dir.join(CACHE_DIR);
        fs::create_dir_all(&cache_dir)?;

        let cache_path = base_dir.join(CACHE_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(cache_path, content)?;
        Ok(())
    }

    /// Create a new cache with version set
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            ..Default::default()
        }
    }

    /// Drop every route if the config hash changed; returns whether it did
    pub fn check_config(&mut self, config_hash: u64) -> bool {
        if self.config_hash == config_hash {
            return false;
        }
        if self.config_hash != 0 {
            tracing::info!("Config changed, invalidating generation cache");
        }
        self.routes.clear();
        self.config_hash = config_hash;
        true
    }

    /// Whether the cached hash for a route matches
    pub fn is_unchanged(&self, route: &str, content_hash: u64) -> bool {
        self.routes
            .get(route)
            .is_some_and(|e| e.content_hash == content_hash)
    }

    /// Record a (re)generation of a route at `now`
    pub fn record(&mut self, route: &str, content_hash: u64, now: i64) {
        self.routes.insert(
            route.to_string(),
            CacheEntry {
                content_hash,
                generated_at: now,
            },
        );
    }

    /// Forget a route
    pub fn remove(&mut self, route: &str) -> Option<CacheEntry> {
        self.routes.remove(route)
    }

    /// Whether a route is due for regeneration
    ///
    /// Routes never generated are always stale.
    pub fn is_stale(&self, route: &str, now: i64, interval: Duration) -> bool {
        match self.routes.get(route) {
            Some(entry) => now.saturating_sub(entry.generated_at) >= interval.as_secs() as i64,
            None => true,
        }
    }

    pub fn contains(&self, route: &str) -> bool {
        self.routes.contains_key(route)
    }
}

/// Calculate a hash for rendered content
pub fn hash_content(content: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

/// Calculate a hash for a file on disk, 0 if it does not exist
pub fn hash_file(path: &Path) -> Result<u64> {
    if !path.exists() {
        return Ok(0);
    }
    let content = fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

//! Generator module - renders pages from the content API into the public dir

use anyhow::{anyhow, Context as _, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tera::Context;
use walkdir::WalkDir;

use crate::cache::{self, CacheDb};
use crate::content::{detail_from_raw, summaries_from_response, PostDetail, PostSummary};
use crate::error::Error;
use crate::helpers::{is_safe_slug, post_path, url_for, DateFormatter};
use crate::i18n::I18n;
use crate::pagination::{PaginationController, PaginationState};
use crate::source::ContentSource;
use crate::templates::{
    ListingPage, PostView, SiteData, SummaryView, TemplateRenderer, POSTS_API_PATH,
};
use crate::Site;

/// Route of the listing page
pub const INDEX_ROUTE: &str = "/";

/// Route of the not-found page
pub const NOT_FOUND_ROUTE: &str = "/404.html";

/// Route of a post page
pub fn post_route(uid: &str) -> String {
    format!("/{}", post_path(uid))
}

/// Whether an error means the post does not exist (as opposed to a failure)
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<Error>().is_some_and(Error::is_not_found)
}

/// What happened to a route's output file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Summary of a full generation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateReport {
    pub posts: usize,
    pub written: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl GenerateReport {
    fn count(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Written => self.written += 1,
            WriteOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// Static site generator using Tera templates
pub struct Generator {
    site: Site,
    renderer: TemplateRenderer,
    i18n: I18n,
    dates: DateFormatter,
    cache: Mutex<CacheDb>,
    force: bool,
}

impl Generator {
    /// Create a new generator, loading the generation cache
    pub fn new(site: &Site) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;

        let mut i18n = I18n::new(&site.config.language);
        i18n.load_languages(site.base_dir.join(&site.config.i18n_dir))?;

        let dates = site.config.date_formatter()?;

        let mut cache = CacheDb::load(&site.base_dir);
        cache.check_config(cache::hash_file(&site.config_path())?);

        Ok(Self {
            site: site.clone(),
            renderer,
            i18n,
            dates,
            cache: Mutex::new(cache),
            force: false,
        })
    }

    /// Rewrite every page even when its content is unchanged
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Generate the entire site
    pub async fn generate(&self, source: &dyn ContentSource) -> Result<GenerateReport> {
        fs::create_dir_all(&self.site.public_dir)?;

        // Copy source assets (css, images, etc.)
        self.copy_source_assets()?;

        let first = source
            .query_posts()
            .await
            .context("Failed to query the first page of posts")?;
        let mut controller = PaginationController::from_response(&first);

        let mut report = GenerateReport::default();

        // The listing only ever shows the first page; later pages come
        // through the load-more control
        let index_html = self.render_index(controller.state())?;
        report.count(self.write_route(INDEX_ROUTE, &index_html)?);

        if let Err(e) = controller.load_all(source).await {
            tracing::warn!(
                "Stopped walking the listing after {} posts: {}",
                controller.items().len(),
                e
            );
        }

        for summary in controller.items() {
            report.posts += 1;
            match self.generate_post(source, &summary.uid).await {
                Ok(outcome) => report.count(outcome),
                Err(e) => {
                    tracing::warn!("Skipping post {:?}: {:#}", summary.uid, e);
                    report.failed += 1;
                }
            }
        }

        let not_found = self.render_not_found()?;
        report.count(self.write_route(NOT_FOUND_ROUTE, &not_found)?);

        self.save_cache()?;

        tracing::info!(
            "Generated {} posts ({} written, {} unchanged, {} failed)",
            report.posts,
            report.written,
            report.unchanged,
            report.failed
        );
        Ok(report)
    }

    /// Regenerate the listing page from a fresh first page
    pub async fn generate_index(&self, source: &dyn ContentSource) -> Result<WriteOutcome> {
        let first = source.query_posts().await?;
        let controller = PaginationController::from_response(&first);
        let html = self.render_index(controller.state())?;
        self.write_route(INDEX_ROUTE, &html)
    }

    /// Fetch, normalize and write a single post page
    pub async fn generate_post(
        &self,
        source: &dyn ContentSource,
        uid: &str,
    ) -> Result<WriteOutcome> {
        if !is_safe_slug(uid) {
            return Err(Error::NotFound(uid.to_string()).into());
        }

        let record = source.get_by_uid(uid).await?;
        let post = detail_from_raw(&record)?;
        if post.uid != uid {
            tracing::warn!("Lookup for {:?} returned post {:?}", uid, post.uid);
            return Err(Error::NotFound(uid.to_string()).into());
        }

        let html = self.render_post(&post)?;
        let outcome = self.write_route(&post_route(uid), &html)?;
        tracing::debug!("Generated post: {}", uid);
        Ok(outcome)
    }

    /// Delete a post page whose slug no longer resolves
    pub fn remove_post(&self, uid: &str) -> Result<()> {
        let route = post_route(uid);
        let path = self.route_file(&route);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("Failed to remove {:?}", path))?;
            tracing::info!("Removed vanished post: {}", uid);
        }
        self.lock_cache()?.remove(&route);
        Ok(())
    }

    /// Render the listing page for a pagination state
    pub fn render_index(&self, state: &PaginationState) -> Result<String> {
        let mut context = self.create_base_context();
        context.insert("posts", &self.summary_views(&state.items));
        context.insert("next_page", &state.next_page);
        context.insert("api_url", &url_for(&self.site.config, POSTS_API_PATH));
        self.renderer.render("index.html", &context)
    }

    /// Render a post page
    pub fn render_post(&self, post: &PostDetail) -> Result<String> {
        let mut context = self.create_base_context();
        let view = PostView::new(post, &self.site.config, &self.dates, &self.i18n);
        context.insert("post", &view);
        self.renderer.render("post.html", &context)
    }

    /// Render the placeholder served while a post is being resolved
    pub fn render_fallback(&self, refresh_after: u64) -> Result<String> {
        let mut context = self.create_base_context();
        context.insert("refresh_after", &refresh_after);
        self.renderer.render("fallback.html", &context)
    }

    pub fn render_not_found(&self) -> Result<String> {
        self.renderer.render("404.html", &self.create_base_context())
    }

    /// Normalize a fetched API page into the listing API payload
    pub fn listing_page(&self, response: &crate::content::RawResponse) -> ListingPage {
        let (summaries, _) = summaries_from_response(response);
        ListingPage {
            results: self.summary_views(&summaries),
            next_page: response.next_page.clone(),
        }
    }

    /// Path of the file a route is written to
    pub fn route_file(&self, route: &str) -> PathBuf {
        let clean = route.trim_start_matches('/');
        if clean.is_empty() || clean.ends_with('/') {
            self.site.public_dir.join(clean).join("index.html")
        } else {
            self.site.public_dir.join(clean)
        }
    }

    /// Whether a route is due for regeneration
    pub fn is_stale(&self, route: &str) -> bool {
        let now = chrono::Utc::now().timestamp();
        let interval = self.site.config.revalidate_interval();
        self.lock_cache()
            .map(|cache| cache.is_stale(route, now, interval))
            .unwrap_or(true)
    }

    /// Restart a route's revalidation clock without touching its output
    pub fn touch(&self, route: &str) -> Result<()> {
        let mut cache = self.lock_cache()?;
        if let Some(entry) = cache.routes.get(route).cloned() {
            cache.record(route, entry.content_hash, chrono::Utc::now().timestamp());
        }
        Ok(())
    }

    pub fn save_cache(&self) -> Result<()> {
        self.lock_cache()?.save(&self.site.base_dir)
    }

    /// Write a rendered route unless it is byte-for-byte unchanged
    ///
    /// Either way the route is re-stamped in the cache.
    fn write_route(&self, route: &str, html: &str) -> Result<WriteOutcome> {
        let output_path = self.route_file(route);
        let hash = cache::hash_content(html);
        let now = chrono::Utc::now().timestamp();

        let mut cache = self.lock_cache()?;
        let unchanged = !self.force && output_path.exists() && cache.is_unchanged(route, hash);

        if !unchanged {
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| anyhow!("Failed to create dir {:?}: {}", parent, e))?;
            }
            fs::write(&output_path, html)
                .map_err(|e| anyhow!("Failed to write {:?}: {}", output_path, e))?;
            tracing::debug!("Generated: {:?}", output_path);
        }
        cache.record(route, hash, now);

        Ok(if unchanged {
            WriteOutcome::Unchanged
        } else {
            WriteOutcome::Written
        })
    }

    fn lock_cache(&self) -> Result<std::sync::MutexGuard<'_, CacheDb>> {
        self.cache
            .lock()
            .map_err(|_| anyhow!("generation cache lock poisoned"))
    }

    /// Create a base context with common variables
    fn create_base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &SiteData::new(&self.site.config, &self.i18n));
        context
    }

    fn summary_views(&self, summaries: &[PostSummary]) -> Vec<SummaryView> {
        summaries
            .iter()
            .map(|s| SummaryView::new(s, &self.site.config, &self.dates))
            .collect()
    }

    /// Copy source assets (css, images, etc.) to public directory
    fn copy_source_assets(&self) -> Result<()> {
        let source_dir = &self.site.source_dir;
        if !source_dir.exists() {
            return Ok(());
        }

        let mut copied = 0;
        for entry in WalkDir::new(source_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(source_dir)?;
            let dest = self.site.public_dir.join(relative);

            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::copy(path, &dest)?;
            copied += 1;
        }

        tracing::debug!("Copied {} static assets", copied);
        Ok(())
    }
}

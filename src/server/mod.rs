//! Bundled server: static files, the listing API and on-demand regeneration
//!
//! Generated pages are served straight from the public directory. A page
//! older than the revalidate interval is still served, and a background
//! task regenerates it. Post slugs that were never generated are resolved
//! on first request while the visitor sees a self-refreshing placeholder.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::Error;
use crate::generator::{is_not_found, post_route, Generator, INDEX_ROUTE, NOT_FOUND_ROUTE};
use crate::helpers::{is_safe_slug, slug_from_path};
use crate::source::ContentSource;
use crate::templates::POSTS_API_PATH;

/// Seconds the placeholder page waits before reloading itself
const FALLBACK_REFRESH_SECS: u64 = 1;

/// Unknown slugs being looked up at the same time
const MAX_SLUG_LOOKUPS: usize = 8;

/// Server state
pub struct ServerState {
    generator: Generator,
    source: Arc<dyn ContentSource>,
    /// Routes with a regeneration task running
    in_flight: Mutex<HashSet<String>>,
    /// Slugs that failed to resolve, with when they failed
    missing: Mutex<HashMap<String, i64>>,
    /// Permits for resolving slugs that have no page yet
    lookups: Arc<Semaphore>,
}

impl ServerState {
    pub fn new(generator: Generator, source: Arc<dyn ContentSource>) -> Arc<Self> {
        Self::with_lookup_limit(generator, source, MAX_SLUG_LOOKUPS)
    }

    pub fn with_lookup_limit(
        generator: Generator,
        source: Arc<dyn ContentSource>,
        max_lookups: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            generator,
            source,
            in_flight: Mutex::new(HashSet::new()),
            missing: Mutex::new(HashMap::new()),
            lookups: Arc::new(Semaphore::new(max_lookups.max(1))),
        })
    }

    fn revalidate_secs(&self) -> i64 {
        self.generator.site().config.revalidate as i64
    }

    /// Whether a slug failed to resolve within the revalidate interval
    fn recently_missing(&self, slug: &str) -> bool {
        let now = chrono::Utc::now().timestamp();
        let Ok(mut missing) = self.missing.lock() else {
            return false;
        };
        prune_expired(&mut missing, now, self.revalidate_secs());
        missing.contains_key(slug)
    }

    fn mark_missing(&self, slug: &str) {
        self.mark_missing_at(slug, chrono::Utc::now().timestamp());
    }

    fn mark_missing_at(&self, slug: &str, failed_at: i64) {
        if let Ok(mut missing) = self.missing.lock() {
            prune_expired(&mut missing, chrono::Utc::now().timestamp(), self.revalidate_secs());
            missing.insert(slug.to_string(), failed_at);
        }
    }

    fn clear_missing(&self, slug: &str) {
        if let Ok(mut missing) = self.missing.lock() {
            missing.remove(slug);
        }
    }
}

/// Forget failures older than the revalidate interval
fn prune_expired(missing: &mut HashMap<String, i64>, now: i64, interval: i64) {
    missing.retain(|_, failed_at| now.saturating_sub(*failed_at) < interval);
}

/// What a background task should regenerate
#[derive(Debug, Clone, PartialEq, Eq)]
enum Refresh {
    Index,
    Post(String),
}

impl Refresh {
    fn route(&self) -> String {
        match self {
            Refresh::Index => INDEX_ROUTE.to_string(),
            Refresh::Post(uid) => post_route(uid),
        }
    }
}

/// Build the router for a site
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route(&format!("/{}", POSTS_API_PATH), get(posts_api_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(
    generator: Generator,
    source: Arc<dyn ContentSource>,
    ip: &str,
    port: u16,
    open: bool,
) -> Result<()> {
    let app = router(ServerState::new(generator, source));

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    // Open browser if requested
    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<String>,
}

/// `GET /api/posts?page=<next_page>`: fetch and normalize one more page
async fn posts_api_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<PageQuery>,
) -> Response {
    let Some(page) = query.page.filter(|p| !p.is_empty()) else {
        return api_error(StatusCode::BAD_REQUEST, "missing page parameter");
    };

    match state.source.fetch_page(&page).await {
        Ok(response) => Json(state.generator.listing_page(&response)).into_response(),
        Err(Error::RejectedUrl(url)) => {
            tracing::warn!("Refusing to proxy {}", url);
            api_error(StatusCode::BAD_REQUEST, "page is not a content API URL")
        }
        Err(e) => {
            tracing::warn!("Listing page fetch failed: {}", e);
            api_error(StatusCode::BAD_GATEWAY, "content API request failed")
        }
    }
}

fn api_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Serve generated files, resolving unknown post slugs on demand
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let path = request.uri().path().to_string();

    if let Some(slug) = slug_from_path(&path) {
        let slug = slug.to_string();
        let route = post_route(&slug);

        if !state.generator.route_file(&route).exists() {
            if !is_safe_slug(&slug) || state.recently_missing(&slug) {
                return not_found(&state).await;
            }
            match Arc::clone(&state.lookups).try_acquire_owned() {
                Ok(permit) => {
                    spawn_refresh(&state, Refresh::Post(slug), Some(permit));
                }
                Err(_) => tracing::debug!("Lookup limit reached, deferring {}", slug),
            }
            return fallback_page(&state);
        }

        if state.generator.is_stale(&route) {
            spawn_refresh(&state, Refresh::Post(slug), None);
        }
    } else if (path == "/" || path == "/index.html") && state.generator.is_stale(INDEX_ROUTE) {
        spawn_refresh(&state, Refresh::Index, None);
    }

    // Serve static file using tower-http
    let public_dir = &state.generator.site().public_dir;
    let mut service = ServeDir::new(public_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => not_found(&state).await,
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

/// Start a background regeneration unless one is already running for the route
///
/// A lookup permit, if given, is held until the task finishes. Returns
/// whether a task was started.
fn spawn_refresh(
    state: &Arc<ServerState>,
    refresh: Refresh,
    permit: Option<OwnedSemaphorePermit>,
) -> bool {
    let route = refresh.route();
    match state.in_flight.lock() {
        Ok(mut in_flight) => {
            if !in_flight.insert(route.clone()) {
                return false;
            }
        }
        Err(_) => return false,
    }

    let state = Arc::clone(state);
    tokio::spawn(async move {
        run_refresh(&state, &refresh).await;
        if let Ok(mut in_flight) = state.in_flight.lock() {
            in_flight.remove(&route);
        }
        drop(permit);
    });
    true
}

async fn run_refresh(state: &ServerState, refresh: &Refresh) {
    let generator = &state.generator;
    let source = state.source.as_ref();

    match refresh {
        Refresh::Index => match generator.generate_index(source).await {
            Ok(outcome) => tracing::info!("Revalidated listing ({:?})", outcome),
            Err(e) => {
                tracing::warn!("Failed to revalidate listing: {:#}", e);
                // Keep serving the old copy until the next interval
                if let Err(e) = generator.touch(INDEX_ROUTE) {
                    tracing::warn!("{:#}", e);
                }
            }
        },
        Refresh::Post(uid) => match generator.generate_post(source, uid).await {
            Ok(outcome) => {
                state.clear_missing(uid);
                tracing::info!("Revalidated post {} ({:?})", uid, outcome);
            }
            Err(e) if is_not_found(&e) => {
                tracing::info!("Post {} not found", uid);
                state.mark_missing(uid);
                if let Err(e) = generator.remove_post(uid) {
                    tracing::warn!("{:#}", e);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to generate post {}: {:#}", uid, e);
                let route = post_route(uid);
                if generator.route_file(&route).exists() {
                    if let Err(e) = generator.touch(&route) {
                        tracing::warn!("{:#}", e);
                    }
                } else {
                    state.mark_missing(uid);
                }
            }
        },
    }

    if let Err(e) = generator.save_cache() {
        tracing::warn!("Failed to save generation cache: {:#}", e);
    }
}

fn fallback_page(state: &ServerState) -> Response {
    match state.generator.render_fallback(FALLBACK_REFRESH_SECS) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render fallback page: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

async fn not_found(state: &ServerState) -> Response {
    let path = state.generator.route_file(NOT_FOUND_ROUTE);
    let html = match tokio::fs::read_to_string(&path).await {
        Ok(html) => html,
        Err(_) => match state.generator.render_not_found() {
            Ok(html) => html,
            Err(_) => return (StatusCode::NOT_FOUND, "Not found").into_response(),
        },
    };
    (StatusCode::NOT_FOUND, Html(html)).into_response()
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

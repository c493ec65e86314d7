//! Incremental "load more" pagination over the content API
//!
//! The listing starts from the first page fetched at build time and grows by
//! following the API's opaque `next_page` URLs. [`PaginationController`]
//! owns the accumulated state and is the only thing allowed to change it.

use serde::Serialize;
use std::collections::HashSet;

use crate::content::{summaries_from_response, PostSummary, RawResponse};
use crate::error::{Error, Result};
use crate::source::ContentSource;

/// Everything loaded so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    /// Summaries in the order the API returned them; append-only
    pub items: Vec<PostSummary>,

    /// URL of the next page, `None` once the listing is exhausted
    pub next_page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
}

/// Result of a `request_more` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and appended
    Appended { added: usize, skipped: usize },
    /// There is no next page; nothing was fetched
    Exhausted,
    /// A fetch is already in flight; nothing was fetched
    Busy,
}

/// Guards [`PaginationState`] behind an Idle/Loading state machine
#[derive(Debug)]
pub struct PaginationController {
    state: PaginationState,
    phase: Phase,
    last_error: Option<String>,
}

impl PaginationController {
    /// Start from an already-normalized first page
    pub fn new(items: Vec<PostSummary>, next_page: Option<String>) -> Self {
        Self {
            state: PaginationState { items, next_page },
            phase: Phase::Idle,
            last_error: None,
        }
    }

    /// Start from a raw first page, normalizing it
    pub fn from_response(response: &RawResponse) -> Self {
        let (items, _) = summaries_from_response(response);
        Self::new(items, response.next_page.clone())
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn items(&self) -> &[PostSummary] {
        &self.state.items
    }

    pub fn next_page(&self) -> Option<&str> {
        self.state.next_page.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Message of the most recent failed fetch, cleared by the next success
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether the "load more" control is enabled
    pub fn can_request_more(&self) -> bool {
        self.phase == Phase::Idle && self.state.next_page.is_some()
    }

    /// Whether every page has been loaded
    pub fn is_exhausted(&self) -> bool {
        self.state.next_page.is_none()
    }

    /// Enter Loading and hand out the URL to fetch
    ///
    /// Returns `None` without changing anything when a fetch is already in
    /// flight or there is no next page.
    pub fn begin_request(&mut self) -> Option<String> {
        if !self.can_request_more() {
            return None;
        }
        self.phase = Phase::Loading;
        self.state.next_page.clone()
    }

    /// Apply the result of the fetch started by [`begin_request`](Self::begin_request)
    ///
    /// On success the page is appended and `next_page` replaced. On failure
    /// the state is left exactly as it was and the error is returned.
    pub fn finish_request(&mut self, result: Result<RawResponse>) -> Result<LoadOutcome> {
        if self.phase != Phase::Loading {
            tracing::debug!("finish_request without a request in flight");
            return Ok(LoadOutcome::Busy);
        }
        self.phase = Phase::Idle;

        match result {
            Ok(response) => {
                let (summaries, skipped) = summaries_from_response(&response);
                let added = summaries.len();
                self.state.items.extend(summaries);
                self.state.next_page = response.next_page;
                self.last_error = None;
                tracing::debug!(
                    "Appended {} posts ({} skipped), {} total",
                    added,
                    skipped,
                    self.state.items.len()
                );
                Ok(LoadOutcome::Appended { added, skipped })
            }
            Err(e) => {
                tracing::warn!("Failed to load more posts: {}", e);
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch and append the next page
    pub async fn request_more(&mut self, source: &dyn ContentSource) -> Result<LoadOutcome> {
        let url = match self.begin_request() {
            Some(url) => url,
            None if self.phase == Phase::Loading => return Ok(LoadOutcome::Busy),
            None => return Ok(LoadOutcome::Exhausted),
        };

        let result = source.fetch_page(&url).await;
        self.finish_request(result)
    }

    /// Keep loading until the listing is exhausted
    ///
    /// Stops at the first failure, leaving everything loaded so far in place.
    /// A `next_page` that was already followed ends the walk without
    /// fetching it again.
    pub async fn load_all(&mut self, source: &dyn ContentSource) -> Result<()> {
        let mut visited = HashSet::new();
        loop {
            if let Some(next) = self.next_page() {
                if !visited.insert(next.to_string()) {
                    tracing::warn!("Listing links back to {}, stopping", next);
                    return Ok(());
                }
            }

            match self.request_more(source).await? {
                LoadOutcome::Appended { .. } => continue,
                LoadOutcome::Exhausted => return Ok(()),
                LoadOutcome::Busy => return Err(Error::InFlight),
            }
        }
    }

    pub fn into_state(self) -> PaginationState {
        self.state
    }
}

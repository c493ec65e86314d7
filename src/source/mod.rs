//! Content source - where post documents come from

mod prismic;

pub use prismic::PrismicClient;

use async_trait::async_trait;

use crate::content::{RawRecord, RawResponse};
use crate::error::Result;

/// A headless content API
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// First page of post documents
    async fn query_posts(&self) -> Result<RawResponse>;

    /// A single post by slug; [`crate::error::Error::NotFound`] if there is none
    async fn get_by_uid(&self, uid: &str) -> Result<RawRecord>;

    /// Follow an opaque `next_page` URL from a previous response
    async fn fetch_page(&self, url: &str) -> Result<RawResponse>;
}

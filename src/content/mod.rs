//! Content module - post models, normalization of API records, rich text and reading time

pub mod normalize;
mod post;
pub mod raw;
mod reading_time;
pub mod richtext;

pub use normalize::{detail_from_raw, summaries_from_response, summary_from_raw};
pub use post::{BlockKind, ContentSection, PostDetail, PostSummary, RichTextBlock, Span, SpanKind};
pub use raw::{RawRecord, RawResponse};
pub use reading_time::{count_words, reading_time, WORDS_PER_MINUTE};

//! Post models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post as shown in the listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Slug, unique per post
    pub uid: String,

    /// First publication date, `None` for never-published documents
    pub first_publication_date: Option<DateTime<Utc>>,

    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A post as shown on its own page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub banner_url: String,
    pub author: String,

    /// Sections in document order
    pub content: Vec<ContentSection>,
}

/// A heading and the rich-text blocks under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSection {
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

/// One rich-text block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichTextBlock {
    pub kind: BlockKind,
    pub text: String,
    pub spans: Vec<Span>,

    /// Image source or embed URL
    pub url: Option<String>,

    /// Image alt text or embed title
    pub alt: Option<String>,
}

impl RichTextBlock {
    /// A plain paragraph with no formatting
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            text: text.into(),
            spans: Vec::new(),
            url: None,
            alt: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    Paragraph,
    Preformatted,
    ListItem,
    OListItem,
    Image,
    Embed,
    Unknown,
}

impl BlockKind {
    /// Map the API's `type` string
    pub fn from_api(kind: &str) -> Self {
        match kind {
            "heading1" => BlockKind::Heading1,
            "heading2" => BlockKind::Heading2,
            "heading3" => BlockKind::Heading3,
            "heading4" => BlockKind::Heading4,
            "heading5" => BlockKind::Heading5,
            "heading6" => BlockKind::Heading6,
            "paragraph" => BlockKind::Paragraph,
            "preformatted" => BlockKind::Preformatted,
            "list-item" => BlockKind::ListItem,
            "o-list-item" => BlockKind::OListItem,
            "image" => BlockKind::Image,
            "embed" => BlockKind::Embed,
            _ => BlockKind::Unknown,
        }
    }
}

/// Inline formatting; offsets are UTF-16 code units into the block text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: SpanKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink { url: String },
    Label { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_kind_from_api() {
        assert_eq!(BlockKind::from_api("heading2"), BlockKind::Heading2);
        assert_eq!(BlockKind::from_api("o-list-item"), BlockKind::OListItem);
        assert_eq!(BlockKind::from_api("table"), BlockKind::Unknown);
    }
}

//! Projection of raw API records into the local post models
//!
//! This is the only place that knows the shape of the API's documents. The
//! generator, the listing controller and the server all go through it, so a
//! record renders the same whether it arrived at build time or at run time.

use crate::content::raw::{RawBlock, RawContentGroup, RawRecord, RawResponse, RawSpan};
use crate::content::{BlockKind, ContentSection, PostDetail, PostSummary, RichTextBlock, Span, SpanKind};
use crate::error::{Error, Result};
use crate::helpers::parse_timestamp;

/// Build a listing entry from a raw record
pub fn summary_from_raw(record: &RawRecord) -> Result<PostSummary> {
    let uid = required(record.uid.as_ref(), "", "uid")?;
    let data = &record.data;

    Ok(PostSummary {
        first_publication_date: publication_date(record, &uid)?,
        title: required(data.title.as_ref(), &uid, "data.title")?,
        subtitle: required(data.subtitle.as_ref(), &uid, "data.subtitle")?,
        author: required(data.author.as_ref(), &uid, "data.author")?,
        uid,
    })
}

/// Build a full post from a raw record
pub fn detail_from_raw(record: &RawRecord) -> Result<PostDetail> {
    let uid = required(record.uid.as_ref(), "", "uid")?;
    let data = &record.data;

    let banner_url = data
        .banner
        .as_ref()
        .and_then(|b| b.url.as_ref())
        .cloned()
        .ok_or_else(|| Error::missing(&uid, "data.banner.url"))?;

    let groups = data
        .content
        .as_ref()
        .ok_or_else(|| Error::missing(&uid, "data.content"))?;
    let content = groups
        .iter()
        .map(|group| section_from_raw(group, &uid))
        .collect::<Result<Vec<_>>>()?;

    Ok(PostDetail {
        first_publication_date: publication_date(record, &uid)?,
        title: required(data.title.as_ref(), &uid, "data.title")?,
        banner_url,
        author: required(data.author.as_ref(), &uid, "data.author")?,
        content,
        uid,
    })
}

/// Normalize a page of results in server order, skipping invalid records
///
/// Returns the summaries and the number of records that were dropped.
pub fn summaries_from_response(response: &RawResponse) -> (Vec<PostSummary>, usize) {
    let mut summaries = Vec::with_capacity(response.results.len());
    let mut skipped = 0;

    for record in &response.results {
        match summary_from_raw(record) {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                tracing::warn!("Skipping record: {}", e);
                skipped += 1;
            }
        }
    }

    (summaries, skipped)
}

fn required(value: Option<&String>, uid: &str, field: &'static str) -> Result<String> {
    value.cloned().ok_or_else(|| Error::missing(uid, field))
}

fn publication_date(
    record: &RawRecord,
    uid: &str,
) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
    match record.first_publication_date.as_deref() {
        None => Ok(None),
        Some(raw) => parse_timestamp(raw)
            .map(Some)
            .ok_or_else(|| Error::missing(uid, "first_publication_date")),
    }
}

fn section_from_raw(group: &RawContentGroup, uid: &str) -> Result<ContentSection> {
    let heading = required(group.heading.as_ref(), uid, "data.content.heading")?;
    let body = group
        .body
        .as_ref()
        .ok_or_else(|| Error::missing(uid, "data.content.body"))?
        .iter()
        .map(block_from_raw)
        .collect();

    Ok(ContentSection { heading, body })
}

fn block_from_raw(block: &RawBlock) -> RichTextBlock {
    let kind = BlockKind::from_api(&block.kind);
    if kind == BlockKind::Unknown {
        tracing::debug!("Unknown rich text block type: {}", block.kind);
    }

    let (url, alt) = match kind {
        BlockKind::Embed => {
            let embed = block.oembed.as_ref();
            (
                embed.and_then(|e| e.embed_url.clone()),
                embed.and_then(|e| e.title.clone()),
            )
        }
        _ => (block.url.clone(), block.alt.clone()),
    };

    RichTextBlock {
        kind,
        text: block.text.clone().unwrap_or_default(),
        spans: block.spans.iter().filter_map(span_from_raw).collect(),
        url,
        alt,
    }
}

fn span_from_raw(span: &RawSpan) -> Option<Span> {
    let data_str = |key: &str| {
        span.data
            .as_ref()
            .and_then(|d| d.get(key))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    let kind = match span.kind.as_str() {
        "strong" => SpanKind::Strong,
        "em" => SpanKind::Em,
        "hyperlink" => SpanKind::Hyperlink {
            url: data_str("url")?,
        },
        "label" => SpanKind::Label {
            name: data_str("label")?,
        },
        other => {
            tracing::debug!("Ignoring span type: {}", other);
            return None;
        }
    };

    if span.end <= span.start {
        return None;
    }

    Some(Span {
        start: span.start,
        end: span.end,
        kind,
    })
}

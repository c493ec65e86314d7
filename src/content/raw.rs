//! Records as returned by the content API, before normalization
//!
//! Every field is optional and leniently typed here so that the normalizer
//! can report exactly which one a record is missing instead of failing the
//! whole page at deserialization time. A value of the wrong type reads as
//! absent.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// One page of query results
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawResponse {
    #[serde(default, deserialize_with = "lenient_records")]
    pub results: Vec<RawRecord>,

    /// Opaque URL of the next page; `null`, a missing key and `""` all mean
    /// there are no more pages
    #[serde(default, deserialize_with = "empty_as_none")]
    pub next_page: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub total_results_size: Option<u64>,
}

/// A single document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub uid: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub first_publication_date: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub data: RawData,

    /// Document metadata the local model does not use (id, type, tags, ...)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// The custom-type fields of a post document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawData {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub subtitle: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub author: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub banner: Option<RawImage>,

    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<Vec<RawContentGroup>>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// An image field
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawImage {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub alt: Option<String>,
}

/// A heading plus its rich-text body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawContentGroup {
    #[serde(default, deserialize_with = "lenient")]
    pub heading: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub body: Option<Vec<RawBlock>>,
}

/// A rich-text block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBlock {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: String,

    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub spans: Vec<RawSpan>,

    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub alt: Option<String>,

    /// Embed payload (`oembed` blocks)
    #[serde(default, deserialize_with = "lenient")]
    pub oembed: Option<RawEmbed>,
}

/// Inline formatting over a range of a block's text
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSpan {
    #[serde(default, deserialize_with = "lenient")]
    pub start: usize,

    #[serde(default, deserialize_with = "lenient")]
    pub end: usize,

    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: String,

    #[serde(default, deserialize_with = "lenient")]
    pub data: Option<serde_json::Value>,
}

/// Embed metadata
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEmbed {
    #[serde(default, deserialize_with = "lenient")]
    pub embed_url: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = lenient(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Read any JSON value, falling back to the default when it has the wrong shape
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Read each result on its own; one that is not a document at all becomes an
/// empty record, which the normalizer then rejects
fn lenient_records<'de, D>(deserializer: D) -> Result<Vec<RawRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<serde_json::Value> = lenient(deserializer)?;
    Ok(values
        .into_iter()
        .map(|value| RawRecord::deserialize(value).unwrap_or_default())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_page_sentinels() {
        let null: RawResponse = serde_json::from_str(r#"{"results": [], "next_page": null}"#).unwrap();
        let missing: RawResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        let empty: RawResponse = serde_json::from_str(r#"{"results": [], "next_page": ""}"#).unwrap();
        let some: RawResponse =
            serde_json::from_str(r#"{"results": [], "next_page": "https://x/api?page=2"}"#).unwrap();

        assert!(null.next_page.is_none());
        assert!(missing.next_page.is_none());
        assert!(empty.next_page.is_none());
        assert_eq!(some.next_page.as_deref(), Some("https://x/api?page=2"));
    }

    #[test]
    fn test_unknown_fields_are_kept_aside() {
        let json = r#"{
            "id": "YF1",
            "uid": "hello",
            "type": "posts",
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "data": {"title": "Hello", "slices": []}
        }"#;
        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.uid.as_deref(), Some("hello"));
        assert!(record.extra.contains_key("id"));
        assert!(record.data.extra.contains_key("slices"));
        assert!(record.data.subtitle.is_none());
    }

    #[test]
    fn test_ill_typed_fields_read_as_absent() {
        let json = r#"{
            "results": [
                {"uid": "a", "data": {"title": "A", "subtitle": "s", "author": "Ana"}},
                {"uid": "b", "data": {"title": [{"type": "heading1", "text": "B"}], "author": 7}},
                {"uid": "c", "data": null},
                "not a document"
            ],
            "next_page": null
        }"#;
        let response: RawResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results.len(), 4);
        assert_eq!(response.results[0].data.title.as_deref(), Some("A"));

        let b = &response.results[1];
        assert_eq!(b.uid.as_deref(), Some("b"));
        assert!(b.data.title.is_none());
        assert!(b.data.author.is_none());

        assert_eq!(response.results[2].uid.as_deref(), Some("c"));
        assert!(response.results[2].data.title.is_none());
        assert!(response.results[3].uid.is_none());
    }
}

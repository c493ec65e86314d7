//! Prismic v2 REST client

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::ContentSource;
use crate::config::PrismicConfig;
use crate::content::{RawRecord, RawResponse};
use crate::error::{Error, Result};
use crate::helpers::is_safe_slug;

/// `GET {endpoint}` response, only the parts we read
#[derive(Debug, Deserialize)]
struct ApiInfo {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// Client for a Prismic repository
#[derive(Debug, Clone)]
pub struct PrismicClient {
    client: reqwest::Client,
    endpoint: Url,
    access_token: Option<String>,
    document_type: String,
    page_size: usize,
    fetch: Vec<String>,
}

impl PrismicClient {
    /// Create a client from configuration
    pub fn new(config: &PrismicConfig) -> Result<Self> {
        let endpoint = Url::parse(config.endpoint.trim())
            .map_err(|e| Error::Config(format!("invalid endpoint {:?}: {}", config.endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "endpoint {:?} is not a base URL",
                config.endpoint
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout.max(1)))
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            access_token: config.access_token.clone(),
            document_type: config.document_type.clone(),
            page_size: config.page_size.max(1),
            fetch: config.fetch.clone(),
        })
    }

    /// Whether a URL points at this repository's API (same scheme, host and port)
    pub fn allows(&self, url: &str) -> bool {
        Url::parse(url)
            .map(|u| u.origin() == self.endpoint.origin())
            .unwrap_or(false)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let shown = redact(&url);
        tracing::debug!("GET {}", shown);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| Error::Network {
                url: shown.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: shown,
                status,
            });
        }

        let body = response.text().await.map_err(|source| Error::Network {
            url: shown.clone(),
            source,
        })?;

        serde_json::from_str(&body).map_err(|source| Error::Decode {
            url: shown,
            source,
        })
    }

    /// The ref that points at currently published content
    async fn master_ref(&self) -> Result<String> {
        let mut url = self.endpoint.clone();
        if let Some(token) = &self.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }

        let info: ApiInfo = self.get_json(url).await?;
        info.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or_else(|| Error::Config("API did not report a master ref".to_string()))
    }

    /// Build a `documents/search` URL
    fn search_url(&self, reference: &str, predicate: &str, page_size: usize) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config("endpoint is not a base URL".to_string()))?
            .pop_if_empty()
            .push("documents")
            .push("search");

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("ref", reference);
            query.append_pair("q", &format!("[{}]", predicate));
            query.append_pair("pageSize", &page_size.to_string());
            if !self.fetch.is_empty() {
                let fields: Vec<String> = self
                    .fetch
                    .iter()
                    .map(|f| format!("{}.{}", self.document_type, f))
                    .collect();
                query.append_pair("fetch", &fields.join(","));
            }
            if let Some(token) = &self.access_token {
                query.append_pair("access_token", token);
            }
        }

        Ok(url)
    }

    fn type_predicate(&self) -> String {
        format!("[at(document.type,\"{}\")]", self.document_type)
    }

    fn uid_predicate(&self, uid: &str) -> String {
        format!("[at(my.{}.uid,\"{}\")]", self.document_type, uid)
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn query_posts(&self) -> Result<RawResponse> {
        let reference = self.master_ref().await?;
        let url = self.search_url(&reference, &self.type_predicate(), self.page_size)?;
        let mut response: RawResponse = self.get_json(url).await?;
        response.next_page = response.next_page.as_deref().map(without_token);
        tracing::debug!(
            "Queried {} posts (next page: {})",
            response.results.len(),
            response.next_page.is_some()
        );
        Ok(response)
    }

    async fn get_by_uid(&self, uid: &str) -> Result<RawRecord> {
        // Anything that is not a plain slug cannot name a document and must
        // not reach the query string
        if !is_safe_slug(uid) {
            return Err(Error::NotFound(uid.to_string()));
        }

        let reference = self.master_ref().await?;
        let url = self.search_url(&reference, &self.uid_predicate(uid), 1)?;
        let response: RawResponse = self.get_json(url).await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(uid.to_string()))
    }

    async fn fetch_page(&self, url: &str) -> Result<RawResponse> {
        if !self.allows(url) {
            return Err(Error::RejectedUrl(url.to_string()));
        }
        let mut url = Url::parse(url).map_err(|_| Error::RejectedUrl(url.to_string()))?;
        strip_token(&mut url);
        if let Some(token) = &self.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }

        let mut response: RawResponse = self.get_json(url).await?;
        response.next_page = response.next_page.as_deref().map(without_token);
        Ok(response)
    }
}

/// URL for logs and errors, without the access token
fn redact(url: &Url) -> String {
    let mut clean = url.clone();
    strip_token(&mut clean);
    clean.to_string()
}

/// Remove any `access_token` query parameter in place
fn strip_token(url: &mut Url) {
    if !url.query_pairs().any(|(k, _)| k == "access_token") {
        return;
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "access_token")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
}

/// A `next_page` URL safe to hand to browsers; the token is re-added per request
fn without_token(next_page: &str) -> String {
    match Url::parse(next_page) {
        Ok(mut url) => {
            strip_token(&mut url);
            url.to_string()
        }
        Err(_) => next_page.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str, token: Option<&str>) -> PrismicClient {
        let config = PrismicConfig {
            endpoint: endpoint.to_string(),
            access_token: token.map(str::to_string),
            ..PrismicConfig::default()
        };
        PrismicClient::new(&config).unwrap()
    }

    #[test]
    fn test_search_url() {
        let client = client("https://blog.cdn.prismic.io/api/v2", Some("tok"));
        let url = client
            .search_url("master-ref", &client.type_predicate(), 2)
            .unwrap();

        assert_eq!(url.path(), "/api/v2/documents/search");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("ref".into(), "master-ref".into()),
                ("q".into(), "[[at(document.type,\"posts\")]]".into()),
                ("pageSize".into(), "2".into()),
                (
                    "fetch".into(),
                    "posts.title,posts.subtitle,posts.author,posts.banner,posts.content".into()
                ),
                ("access_token".into(), "tok".into()),
            ]
        );
    }

    #[test]
    fn test_search_url_with_trailing_slash() {
        let client = client("https://blog.cdn.prismic.io/api/v2/", None);
        let url = client.search_url("r", &client.uid_predicate("hello"), 1).unwrap();
        assert_eq!(url.path(), "/api/v2/documents/search");
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "q" && v == "[[at(my.posts.uid,\"hello\")]]"));
    }

    #[test]
    fn test_allows_same_origin_only() {
        let client = client("https://blog.cdn.prismic.io/api/v2", None);
        assert!(client.allows("https://blog.cdn.prismic.io/api/v2/documents/search?page=2"));
        assert!(!client.allows("https://evil.example.com/api/v2/documents/search"));
        assert!(!client.allows("http://blog.cdn.prismic.io/api/v2/documents/search"));
        assert!(!client.allows("not a url"));
    }

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let config = PrismicConfig {
            endpoint: "nope".to_string(),
            ..PrismicConfig::default()
        };
        assert!(matches!(PrismicClient::new(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_redact_hides_token() {
        let url = Url::parse("https://x/api/v2?ref=a&access_token=secret").unwrap();
        assert_eq!(redact(&url), "https://x/api/v2?ref=a");
        let only_token = Url::parse("https://x/api/v2?access_token=secret").unwrap();
        assert_eq!(redact(&only_token), "https://x/api/v2");
    }

    #[test]
    fn test_next_page_loses_token() {
        assert_eq!(
            without_token("https://x/api/v2/documents/search?ref=a&access_token=secret&page=2"),
            "https://x/api/v2/documents/search?ref=a&page=2"
        );
        assert_eq!(
            without_token("https://x/api/v2/documents/search?page=2"),
            "https://x/api/v2/documents/search?page=2"
        );
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_foreign_urls() {
        let client = client("https://blog.cdn.prismic.io/api/v2", None);
        let err = client
            .fetch_page("https://evil.example.com/steal")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RejectedUrl(_)));
    }

    #[tokio::test]
    async fn test_unsafe_uid_is_not_found_without_request() {
        let client = client("https://blog.cdn.prismic.io/api/v2", None);
        let err = client.get_by_uid("a\") or (\"").await.unwrap_err();
        assert!(err.is_not_found());
    }
}

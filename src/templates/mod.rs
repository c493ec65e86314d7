//! Built-in page templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping stays on for every
//! template; the only markup passed through with `safe` is rich text that
//! has already been through [`crate::content::richtext::as_html`].

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{reading_time, richtext, PostDetail, PostSummary};
use crate::helpers::{full_url_for, post_path, url_for, DateFormatter};
use crate::i18n::I18n;

/// Route of the listing API served by the bundled server
pub const POSTS_API_PATH: &str = "api/posts";

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("post.html", include_str!("site/post.html")),
            ("fallback.html", include_str!("site/fallback.html")),
            ("404.html", include_str!("site/404.html")),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub language: String,
    pub root: String,
    pub url: String,
    pub i18n: HashMap<String, String>,
}

impl SiteData {
    pub fn new(config: &SiteConfig, i18n: &I18n) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            language: i18n.language().to_string(),
            root: url_for(config, ""),
            url: config.url.clone(),
            i18n: i18n.get_all_translations(),
        }
    }
}

/// A listing entry, also the JSON shape of the listing API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryView {
    pub uid: String,
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    /// Display date
    pub date: String,
    /// Machine-readable date for `<time datetime>`
    pub datetime: String,
}

impl SummaryView {
    pub fn new(summary: &PostSummary, config: &SiteConfig, dates: &DateFormatter) -> Self {
        Self {
            uid: summary.uid.clone(),
            path: url_for(config, &post_path(&summary.uid)),
            title: summary.title.clone(),
            subtitle: summary.subtitle.clone(),
            author: summary.author.clone(),
            date: dates.format_opt(summary.first_publication_date.as_ref()),
            datetime: summary
                .first_publication_date
                .map(|d| d.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

/// One page of the listing API response
#[derive(Debug, Clone, Serialize)]
pub struct ListingPage {
    pub results: Vec<SummaryView>,
    pub next_page: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub heading: String,
    /// Sanitized HTML of the section body
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub uid: String,
    pub permalink: String,
    pub title: String,
    pub banner_url: String,
    pub author: String,
    pub date: String,
    pub datetime: String,
    pub reading_time: usize,
    pub reading_time_label: String,
    pub sections: Vec<SectionView>,
}

impl PostView {
    pub fn new(post: &PostDetail, config: &SiteConfig, dates: &DateFormatter, i18n: &I18n) -> Self {
        let minutes = reading_time(&post.content, config.words_per_minute);
        Self {
            uid: post.uid.clone(),
            permalink: full_url_for(config, &post_path(&post.uid)),
            title: post.title.clone(),
            banner_url: post.banner_url.clone(),
            author: post.author.clone(),
            date: dates.format_opt(post.first_publication_date.as_ref()),
            datetime: post
                .first_publication_date
                .map(|d| d.to_rfc3339())
                .unwrap_or_default(),
            reading_time: minutes,
            reading_time_label: i18n.get_count("reading_time", minutes),
            sections: post
                .content
                .iter()
                .map(|section| SectionView {
                    heading: section.heading.clone(),
                    html: richtext::as_html(&section.body),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentSection, RichTextBlock};
    use crate::helpers::Locale;
    use chrono::{TimeZone, Utc};

    fn dates() -> DateFormatter {
        DateFormatter::new("DD MMM YYYY", Locale::PtBr, chrono_tz::UTC)
    }

    fn context(config: &SiteConfig) -> Context {
        let mut context = Context::new();
        context.insert("site", &SiteData::new(config, &I18n::new("pt-BR")));
        context
    }

    #[test]
    fn test_summary_view() {
        let config = SiteConfig::default();
        let summary = PostSummary {
            uid: "hooks".into(),
            first_publication_date: Some(Utc.with_ymd_and_hms(2021, 3, 15, 12, 0, 0).unwrap()),
            title: "Hooks".into(),
            subtitle: "Sub".into(),
            author: "Ana".into(),
        };
        let view = SummaryView::new(&summary, &config, &dates());
        assert_eq!(view.path, "/post/hooks/");
        assert_eq!(view.date, "15 mar 2021");
        assert_eq!(view.datetime, "2021-03-15T12:00:00+00:00");
    }

    #[test]
    fn test_index_escapes_titles_and_shows_button() {
        let config = SiteConfig::default();
        let renderer = TemplateRenderer::new().unwrap();
        let mut ctx = context(&config);
        let view = SummaryView {
            uid: "x".into(),
            path: "/post/x/".into(),
            title: "<b>bold</b>".into(),
            subtitle: "s".into(),
            author: "a".into(),
            date: String::new(),
            datetime: String::new(),
        };
        ctx.insert("posts", &vec![view]);
        ctx.insert("next_page", &Some("https://repo/api?page=2"));
        ctx.insert("api_url", "/api/posts");

        let html = renderer.render("index.html", &ctx).unwrap();
        assert!(html.contains("&lt;b&gt;bold&lt;&#x2F;b&gt;"));
        assert!(html.contains("Carregar mais posts"));
        assert!(html.contains("id=\"load-more\""));
    }

    #[test]
    fn test_index_hides_button_without_next_page() {
        let config = SiteConfig::default();
        let renderer = TemplateRenderer::new().unwrap();
        let mut ctx = context(&config);
        ctx.insert("posts", &Vec::<SummaryView>::new());
        ctx.insert("next_page", &None::<String>);
        ctx.insert("api_url", "/api/posts");

        let html = renderer.render("index.html", &ctx).unwrap();
        assert!(!html.contains("id=\"load-more\""));
    }

    #[test]
    fn test_post_page_renders_reading_time_and_rich_text() {
        let config = SiteConfig::default();
        let renderer = TemplateRenderer::new().unwrap();
        let post = PostDetail {
            uid: "p".into(),
            first_publication_date: Some(Utc.with_ymd_and_hms(2021, 3, 15, 0, 0, 0).unwrap()),
            title: "Título".into(),
            banner_url: "https://img/banner.png".into(),
            author: "Ana".into(),
            content: vec![ContentSection {
                heading: "Intro".into(),
                body: vec![RichTextBlock::paragraph("um <dois> três")],
            }],
        };
        let view = PostView::new(&post, &config, &dates(), &I18n::new("pt-BR"));
        assert_eq!(view.reading_time, 1);

        let mut ctx = context(&config);
        ctx.insert("post", &view);
        let html = renderer.render("post.html", &ctx).unwrap();
        assert!(html.contains("<p>um &lt;dois&gt; três</p>"));
        assert!(html.contains("1 min"));
        assert!(html.contains("15 mar 2021"));
        assert_eq!(view.permalink, "http://localhost:4000/post/p/");
    }
}

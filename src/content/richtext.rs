//! Rich text to HTML
//!
//! Post bodies come from a third party, so this renderer is the trust
//! boundary for anything marked `safe` in templates: every piece of text and
//! every attribute is escaped, only a fixed set of tags is produced, and link
//! or image targets must use an allowed scheme.

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::{BlockKind, RichTextBlock, Span, SpanKind};

/// Render blocks to sanitized HTML, grouping consecutive list items
pub fn as_html(blocks: &[RichTextBlock]) -> String {
    let mut out = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list_tag = match block.kind {
            BlockKind::ListItem => Some("ul"),
            BlockKind::OListItem => Some("ol"),
            _ => None,
        };

        if open_list != list_tag {
            if let Some(tag) = open_list {
                out.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list_tag {
                out.push_str(&format!("<{}>", tag));
            }
            open_list = list_tag;
        }

        render_block(block, &mut out);
    }

    if let Some(tag) = open_list {
        out.push_str(&format!("</{}>", tag));
    }

    out
}

fn render_block(block: &RichTextBlock, out: &mut String) {
    let tag = match block.kind {
        BlockKind::Heading1 => "h1",
        BlockKind::Heading2 => "h2",
        BlockKind::Heading3 => "h3",
        BlockKind::Heading4 => "h4",
        BlockKind::Heading5 => "h5",
        BlockKind::Heading6 => "h6",
        BlockKind::Paragraph => "p",
        BlockKind::ListItem | BlockKind::OListItem => "li",
        BlockKind::Preformatted => {
            out.push_str("<pre>");
            out.push_str(&render_inline(&block.text, &block.spans, false));
            out.push_str("</pre>");
            return;
        }
        BlockKind::Image => {
            if let Some(src) = block.url.as_deref().and_then(safe_url) {
                out.push_str(&format!(
                    r#"<p class="block-img"><img src="{}" alt="{}"></p>"#,
                    encode_double_quoted_attribute(src),
                    encode_double_quoted_attribute(block.alt.as_deref().unwrap_or(""))
                ));
            }
            return;
        }
        BlockKind::Embed => {
            if let Some(url) = block.url.as_deref().and_then(safe_url) {
                let title = block.alt.as_deref().unwrap_or(url);
                out.push_str(&format!(
                    r#"<div class="embed"><a href="{}" target="_blank" rel="noopener noreferrer">{}</a></div>"#,
                    encode_double_quoted_attribute(url),
                    encode_text(title)
                ));
            }
            return;
        }
        BlockKind::Unknown => return,
    };

    out.push_str(&format!("<{}>", tag));
    out.push_str(&render_inline(&block.text, &block.spans, true));
    out.push_str(&format!("</{}>", tag));
}

/// A span that will actually produce markup
struct Markup<'a> {
    span: &'a Span,
    open: String,
    close: &'static str,
}

fn markup(span: &Span) -> Option<Markup<'_>> {
    let (open, close) = match &span.kind {
        SpanKind::Strong => ("<strong>".to_string(), "</strong>"),
        SpanKind::Em => ("<em>".to_string(), "</em>"),
        SpanKind::Hyperlink { url } => {
            let url = safe_url(url)?;
            (
                format!(
                    r#"<a href="{}" target="_blank" rel="noopener noreferrer">"#,
                    encode_double_quoted_attribute(url)
                ),
                "</a>",
            )
        }
        SpanKind::Label { name } => (
            format!(r#"<span class="{}">"#, encode_double_quoted_attribute(name)),
            "</span>",
        ),
    };
    Some(Markup { span, open, close })
}

/// Render text with inline spans
///
/// Whenever the set of active spans changes, all open tags are closed and
/// the new set reopened, so overlapping spans still produce well-formed
/// markup.
fn render_inline(text: &str, spans: &[Span], line_breaks: bool) -> String {
    let mut markups: Vec<Markup> = spans.iter().filter_map(markup).collect();
    markups.sort_by(|a, b| {
        a.span
            .start
            .cmp(&b.span.start)
            .then(b.span.end.cmp(&a.span.end))
    });

    let mut out = String::with_capacity(text.len());
    let mut segment = String::new();
    let mut open: Vec<usize> = Vec::new();
    let mut offset = 0;

    for ch in text.chars() {
        let active: Vec<usize> = markups
            .iter()
            .enumerate()
            .filter(|(_, m)| m.span.start <= offset && offset < m.span.end)
            .map(|(i, _)| i)
            .collect();

        if active != open {
            flush(&mut segment, &mut out, line_breaks);
            for &i in open.iter().rev() {
                out.push_str(markups[i].close);
            }
            for &i in &active {
                out.push_str(&markups[i].open);
            }
            open = active;
        }

        segment.push(ch);
        offset += ch.len_utf16();
    }

    flush(&mut segment, &mut out, line_breaks);
    for &i in open.iter().rev() {
        out.push_str(markups[i].close);
    }

    out
}

fn flush(segment: &mut String, out: &mut String, line_breaks: bool) {
    if segment.is_empty() {
        return;
    }
    let escaped = encode_text(segment.as_str());
    if line_breaks {
        out.push_str(&escaped.replace('\n', "<br />"));
    } else {
        out.push_str(&escaped);
    }
    segment.clear();
}

/// Accept only web, mail and site-relative targets
fn safe_url(url: &str) -> Option<&str> {
    let trimmed = url.trim();
    let lower = trimmed.to_ascii_lowercase();
    let allowed = lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("mailto:")
        || (trimmed.starts_with('/') && !trimmed.starts_with("//"))
        || trimmed.starts_with('#');
    allowed.then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(kind: BlockKind, text: &str, spans: Vec<Span>) -> RichTextBlock {
        RichTextBlock {
            kind,
            text: text.to_string(),
            spans,
            url: None,
            alt: None,
        }
    }

    fn span(start: usize, end: usize, kind: SpanKind) -> Span {
        Span { start, end, kind }
    }

    #[test]
    fn test_paragraph_is_escaped() {
        let html = as_html(&[RichTextBlock::paragraph("<script>alert('x')</script> & co")]);
        assert_eq!(
            html,
            "<p>&lt;script&gt;alert('x')&lt;/script&gt; &amp; co</p>"
        );
    }

    #[test]
    fn test_strong_and_link_spans() {
        let html = as_html(&[block(
            BlockKind::Paragraph,
            "Leia o guia agora",
            vec![
                span(0, 4, SpanKind::Strong),
                span(7, 11, SpanKind::Hyperlink { url: "https://rust-lang.org".into() }),
            ],
        )]);
        assert_eq!(
            html,
            r#"<p><strong>Leia</strong> o <a href="https://rust-lang.org" target="_blank" rel="noopener noreferrer">guia</a> agora</p>"#
        );
    }

    #[test]
    fn test_overlapping_spans_stay_well_formed() {
        let html = as_html(&[block(
            BlockKind::Paragraph,
            "abcdef",
            vec![span(0, 4, SpanKind::Strong), span(2, 6, SpanKind::Em)],
        )]);
        assert_eq!(
            html,
            "<p><strong>ab</strong><strong><em>cd</em></strong><em>ef</em></p>"
        );
    }

    #[test]
    fn test_offsets_are_utf16() {
        // "é" is one UTF-16 unit, the emoji is two
        let html = as_html(&[block(
            BlockKind::Paragraph,
            "é😀 ok",
            vec![span(4, 6, SpanKind::Em)],
        )]);
        assert_eq!(html, "<p>é😀 <em>ok</em></p>");
    }

    #[test]
    fn test_javascript_links_are_dropped() {
        let html = as_html(&[block(
            BlockKind::Paragraph,
            "click",
            vec![span(0, 5, SpanKind::Hyperlink { url: "javascript:alert(1)".into() })],
        )]);
        assert_eq!(html, "<p>click</p>");
    }

    #[test]
    fn test_lists_are_grouped() {
        let html = as_html(&[
            block(BlockKind::ListItem, "a", vec![]),
            block(BlockKind::ListItem, "b", vec![]),
            block(BlockKind::OListItem, "c", vec![]),
            RichTextBlock::paragraph("d"),
        ]);
        assert_eq!(
            html,
            "<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol><p>d</p>"
        );
    }

    #[test]
    fn test_line_breaks_and_preformatted() {
        let html = as_html(&[
            RichTextBlock::paragraph("a\nb"),
            block(BlockKind::Preformatted, "fn main() {\n}", vec![]),
        ]);
        assert_eq!(html, "<p>a<br />b</p><pre>fn main() {\n}</pre>");
    }

    #[test]
    fn test_image_requires_safe_url() {
        let mut image = block(BlockKind::Image, "", vec![]);
        image.url = Some("https://img/a.png".into());
        image.alt = Some("a \"quote\"".into());
        assert_eq!(
            as_html(&[image.clone()]),
            r#"<p class="block-img"><img src="https://img/a.png" alt="a &quot;quote&quot;"></p>"#
        );

        image.url = Some("data:text/html,boom".into());
        assert_eq!(as_html(&[image]), "");
    }

    #[test]
    fn test_unknown_blocks_are_skipped() {
        assert_eq!(as_html(&[block(BlockKind::Unknown, "x", vec![])]), "");
    }
}

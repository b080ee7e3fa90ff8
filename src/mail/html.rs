//! HTML to plaintext conversion for message bodies.
//!
//! Conversion goes through `html2text` with wrapping effectively disabled and no
//! markdown-style decoration or table borders. Before
//! rendering, the markup is rewritten so the output reads like a mail body
//! rather than a terminal page: explicit newlines in text survive, anchors are
//! flattened to `text [href]`, and (for [`HtmlStyle::Message`]) images are dropped
//! and an href that repeats its own link text is not printed twice.

use std::sync::LazyLock;

use log::warn;
use regex::{Captures, Regex};

/// Wide enough that html2text never breaks a line on its own.
const UNWRAPPED_WIDTH: usize = 4096;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    // href may be double-quoted, single-quoted or bare.
    Regex::new(
        r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))[^>]*>(.*?)</a\s*>"#,
    )
    .unwrap()
});

static IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").unwrap());

static RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<hr\b[^>]*>").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Which rewrite rules apply before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlStyle {
    /// Declared `text/html` parts: images skipped, duplicate hrefs hidden.
    Message,
    /// Markup sniffed out of an untyped payload: newline and wrapping rules only.
    Bare,
}

pub fn html_to_text(html: &str, style: HtmlStyle) -> String {
    let mut prepared = preserve_newlines(html);
    prepared = RULE.replace_all(&prepared, "<br>").into_owned();
    if style == HtmlStyle::Message {
        prepared = IMAGE.replace_all(&prepared, "").into_owned();
    }
    prepared = flatten_anchors(&prepared, style == HtmlStyle::Message);

    let rendered = html2text::config::plain_no_decorate()
        .no_table_borders()
        .string_from_read(prepared.as_bytes(), UNWRAPPED_WIDTH);
    match rendered {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            warn!("html body could not be rendered: {e}");
            String::new()
        }
    }
}

/// Turns newlines inside text runs into `<br>` so the renderer keeps them.
/// Whitespace-only runs (indentation between tags) and preformatted blocks
/// are left alone.
fn preserve_newlines(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut verbatim_depth = 0usize;
    let mut last = 0;

    for tag in TAG.find_iter(html) {
        let text = &html[last..tag.start()];
        if verbatim_depth == 0 {
            push_text_run(&mut out, text);
        } else {
            out.push_str(text);
        }
        out.push_str(tag.as_str());
        last = tag.end();

        match tag_name(tag.as_str()) {
            Some((name, false)) if is_verbatim(&name) => verbatim_depth += 1,
            Some((name, true)) if is_verbatim(&name) => {
                verbatim_depth = verbatim_depth.saturating_sub(1)
            }
            _ => {}
        }
    }

    let tail = &html[last..];
    if verbatim_depth == 0 {
        push_text_run(&mut out, tail);
    } else {
        out.push_str(tail);
    }
    out
}

fn push_text_run(out: &mut String, text: &str) {
    let inner = text.trim();
    if inner.is_empty() || !inner.contains('\n') {
        out.push_str(text);
        return;
    }
    let start = text.len() - text.trim_start().len();
    out.push_str(&text[..start]);
    out.push_str(&inner.replace("\r\n", "\n").replace('\n', "<br>"));
    out.push_str(&text[start + inner.len()..]);
}

/// Lowercased tag name and whether it is a closing tag.
fn tag_name(tag: &str) -> Option<(String, bool)> {
    let body = tag.strip_prefix('<')?.trim_start();
    let (closing, body) = match body.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let name: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if name.is_empty() {
        None
    } else {
        Some((name.to_ascii_lowercase(), closing))
    }
}

fn is_verbatim(name: &str) -> bool {
    matches!(name, "pre" | "textarea" | "script" | "style")
}

fn flatten_anchors(html: &str, hide_same_href: bool) -> String {
    ANCHOR
        .replace_all(html, |caps: &Captures| {
            let href = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().trim())
                .unwrap_or_default();
            let inner = caps.get(4).map(|m| m.as_str()).unwrap_or_default();

            if href.is_empty() {
                return inner.to_string();
            }
            if hide_same_href && href_matches_text(href, inner) {
                return inner.to_string();
            }
            format!("{inner} [{href}]")
        })
        .into_owned()
}

fn href_matches_text(href: &str, inner: &str) -> bool {
    let visible = TAG.replace_all(inner, "");
    let visible = WHITESPACE.replace_all(visible.trim(), " ");
    let target = href.strip_prefix("mailto:").unwrap_or(href);
    visible == href || visible == target
}

//! Message text formatting
//!
//! Turns raw message text into render blocks. Text is split into paragraphs
//! on blank lines first; each paragraph is then checked for fenced code, and
//! only paragraphs without a fence get inline code substitution.

use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::sync::LazyLock;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("paragraph break pattern"));

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(.*?)```").expect("code fence pattern"));

static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("inline code pattern"));

const FENCE_MARKER: &str = "```";

/// A unit of formatted output, recomputed from a message's raw text on display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderBlock {
    Paragraph { spans: Vec<Inline> },
    CodeBlock { code: String },
}

/// Inline content of a paragraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum Inline {
    Text(String),
    Code(String),
}

impl RenderBlock {
    /// Paragraph holding `text` as-is, with no inline code detection
    pub fn plain(text: impl Into<String>) -> Self {
        RenderBlock::Paragraph {
            spans: vec![Inline::Text(text.into())],
        }
    }

    pub fn code_block(code: impl Into<String>) -> Self {
        RenderBlock::CodeBlock { code: code.into() }
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_code_block(&self) -> bool {
        matches!(self, RenderBlock::CodeBlock { .. })
    }
}

/// Format raw message text into render blocks.
///
/// Never fails and never returns an empty sequence: the empty string formats
/// to a single empty paragraph.
pub fn format_message(text: &str) -> Vec<RenderBlock> {
    let mut blocks = Vec::new();
    for segment in PARAGRAPH_BREAK.split(text) {
        if segment.contains(FENCE_MARKER) {
            push_fenced_segment(segment, &mut blocks);
        } else {
            blocks.push(RenderBlock::Paragraph {
                spans: inline_spans(segment),
            });
        }
    }
    blocks
}

/// Split a segment around its fenced spans. Text between fences is kept
/// verbatim; an unbalanced fence leaves the whole segment as plain text.
fn push_fenced_segment(segment: &str, blocks: &mut Vec<RenderBlock>) {
    let mut texts = CODE_FENCE.split(segment);
    for caps in CODE_FENCE.captures_iter(segment) {
        if let Some(text) = texts.next().filter(|t| !t.is_empty()) {
            blocks.push(RenderBlock::plain(text));
        }
        let inner = caps.get(1).map_or("", |m| m.as_str());
        blocks.push(RenderBlock::code_block(inner));
    }
    // split yields one more piece than there are matches
    blocks.extend(texts.filter(|t| !t.is_empty()).map(RenderBlock::plain));
}

fn inline_spans(segment: &str) -> Vec<Inline> {
    let mut spans = Vec::new();
    let mut texts = INLINE_CODE.split(segment);
    for caps in INLINE_CODE.captures_iter(segment) {
        if let Some(text) = texts.next().filter(|t| !t.is_empty()) {
            spans.push(Inline::Text(text.to_string()));
        }
        let inner = caps.get(1).map_or("", |m| m.as_str());
        spans.push(Inline::Code(inner.to_string()));
    }
    spans.extend(
        texts
            .filter(|t| !t.is_empty())
            .map(|t| Inline::Text(t.to_string())),
    );
    if spans.is_empty() {
        spans.push(Inline::Text(String::new()));
    }
    spans
}

/// Render blocks to the chat widget's markup.
///
/// Text is emitted unescaped, so any HTML in a message reaches the page
/// verbatim. Use [`render_html_escaped`] for untrusted content.
pub fn render_html(blocks: &[RenderBlock]) -> String {
    render_with(blocks, Cow::Borrowed)
}

/// Same markup as [`render_html`] with HTML-significant characters escaped
#[allow(dead_code)] // Opt-in for callers rendering untrusted text
pub fn render_html_escaped(blocks: &[RenderBlock]) -> String {
    render_with(blocks, escape_html)
}

fn render_with<'a>(blocks: &'a [RenderBlock], text: fn(&'a str) -> Cow<'a, str>) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            RenderBlock::Paragraph { spans } => {
                out.push_str("<p>");
                for span in spans {
                    match span {
                        Inline::Text(t) => out.push_str(&text(t)),
                        Inline::Code(c) => {
                            out.push_str("<code>");
                            out.push_str(&text(c));
                            out.push_str("</code>");
                        }
                    }
                }
                out.push_str("</p>");
            }
            RenderBlock::CodeBlock { code } => {
                out.push_str("<pre><code>");
                out.push_str(&text(code));
                out.push_str("</code></pre>");
            }
        }
    }
    out
}

fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    let mut escaped = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

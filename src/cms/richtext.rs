//! Structured rich text to HTML
//!
//! Rich text fields arrive as a list of blocks, each with plain `text` and
//! `spans` giving inline formatting as UTF-16 offsets into that text.

use serde::{Deserialize, Serialize};

use crate::helpers::{attributes, escape_html, post_path};

/// One rich text block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub spans: Vec<Span>,
    /// Image source
    pub url: Option<String>,
    pub alt: Option<String>,
    pub copyright: Option<String>,
    #[serde(rename = "linkTo")]
    pub link_to: Option<Link>,
    pub oembed: Option<Oembed>,
    pub label: Option<String>,
}

/// Inline formatting over `[start, end)`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Option<SpanData>,
}

/// Span payload: a link for hyperlinks, a label name for labels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanData {
    #[serde(flatten)]
    pub link: Link,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    /// `Web`, `Media` or `Document`
    pub link_type: Option<String>,
    pub url: Option<String>,
    pub target: Option<String>,
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    #[serde(rename = "isBroken")]
    pub is_broken: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Oembed {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub embed_url: Option<String>,
    pub provider_name: Option<String>,
    pub html: Option<String>,
}

/// Maps document links to site paths
#[derive(Debug, Clone)]
pub struct LinkResolver {
    post_type: String,
}

impl LinkResolver {
    pub fn new(post_type: &str) -> Self {
        Self {
            post_type: post_type.to_string(),
        }
    }

    /// Site path or external URL for a link
    pub fn resolve(&self, link: &Link) -> String {
        match link.link_type.as_deref() {
            Some("Document") => {
                if link.is_broken {
                    return "/".to_string();
                }
                match (&link.doc_type, &link.uid) {
                    (Some(doc_type), Some(uid)) if *doc_type == self.post_type => post_path(uid),
                    _ => "/".to_string(),
                }
            }
            _ => link.url.clone().unwrap_or_default(),
        }
    }
}

/// Render a rich text field to HTML
pub fn as_html(blocks: &[Block], resolver: &LinkResolver) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list = match block.kind.as_str() {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        };
        if open_list != list {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list {
                html.push_str(&format!("<{}>", tag));
            }
            open_list = list;
        }
        html.push_str(&serialize_block(block, resolver));
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{}>", tag));
    }
    html
}

fn serialize_block(block: &Block, resolver: &LinkResolver) -> String {
    let text = || serialize_text(&block.text, &block.spans, resolver);
    let class = block
        .label
        .as_deref()
        .map(|label| attributes(&[("class", label)]))
        .unwrap_or_default();

    match block.kind.as_str() {
        "heading1" | "heading2" | "heading3" | "heading4" | "heading5" | "heading6" => {
            let level = &block.kind["heading".len()..];
            format!("<h{level}{class}>{}</h{level}>", text())
        }
        "paragraph" => format!("<p{class}>{}</p>", text()),
        "preformatted" => format!("<pre{class}>{}</pre>", text()),
        "list-item" | "o-list-item" => format!("<li{class}>{}</li>", text()),
        "image" => {
            let img = format!(
                "<img{} />",
                attributes(&[
                    ("src", block.url.as_deref().unwrap_or_default()),
                    ("alt", block.alt.as_deref().unwrap_or_default()),
                    ("copyright", block.copyright.as_deref().unwrap_or_default()),
                ])
            );
            let img = match &block.link_to {
                Some(link) => wrap_link(link, resolver, &img),
                None => img,
            };
            format!("<p class=\"block-img\">{}</p>", img)
        }
        "embed" => {
            let Some(oembed) = &block.oembed else {
                return String::new();
            };
            format!(
                "<div{}>{}</div>",
                attributes(&[
                    ("data-oembed", oembed.embed_url.as_deref().unwrap_or_default()),
                    ("data-oembed-type", oembed.kind.as_deref().unwrap_or_default()),
                    (
                        "data-oembed-provider",
                        oembed.provider_name.as_deref().unwrap_or_default()
                    ),
                ]),
                oembed.html.as_deref().unwrap_or_default()
            )
        }
        other => {
            tracing::debug!("Skipping unsupported rich text block {:?}", other);
            String::new()
        }
    }
}

fn wrap_link(link: &Link, resolver: &LinkResolver, inner: &str) -> String {
    let href = resolver.resolve(link);
    let target = link.target.as_deref().unwrap_or_default();
    let rel = if target.is_empty() { "" } else { "noopener" };
    format!(
        "<a{}>{}</a>",
        attributes(&[("href", href.as_str()), ("target", target), ("rel", rel)]),
        inner
    )
}

/// A span within its parent, with nested spans
struct Node<'a> {
    span: Option<&'a Span>,
    start: usize,
    end: usize,
    children: Vec<Node<'a>>,
}

impl<'a> Node<'a> {
    /// Nest `[start, end)` under this node
    ///
    /// Returns the part running past this node's end, which the caller places
    /// as a sibling so the tail keeps its formatting.
    fn insert(&mut self, span: &'a Span, start: usize, end: usize) -> Option<(usize, usize)> {
        let overflow = (end > self.end).then(|| (start.max(self.end), end));
        let end = end.min(self.end);
        if start < end {
            let mut pending = Some((start, end));
            if let Some(last) = self.children.last_mut() {
                if start < last.end {
                    pending = last.insert(span, start, end);
                }
            }
            if let Some((start, end)) = pending {
                self.children.push(Node {
                    span: Some(span),
                    start,
                    end,
                    children: Vec::new(),
                });
            }
        }
        overflow
    }
}

/// Serialize block text with its spans
fn serialize_text(text: &str, spans: &[Span], resolver: &LinkResolver) -> String {
    // (utf16 offset, char)
    let chars: Vec<(usize, char)> = text
        .chars()
        .scan(0usize, |pos, c| {
            let at = *pos;
            *pos += c.len_utf16();
            Some((at, c))
        })
        .collect();
    let len = text.encode_utf16().count();

    let mut sorted: Vec<&Span> = spans.iter().filter(|s| s.start < s.end).collect();
    sorted.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut root = Node {
        span: None,
        start: 0,
        end: len,
        children: Vec::new(),
    };
    for span in sorted {
        // clamped to the text, so nothing overflows the root
        let _ = root.insert(span, span.start.min(len), span.end.min(len));
    }

    render_node(&root, &chars, resolver)
}

fn render_node(node: &Node<'_>, chars: &[(usize, char)], resolver: &LinkResolver) -> String {
    let mut inner = String::new();
    let mut cursor = node.start;
    for child in &node.children {
        inner.push_str(&plain_text(chars, cursor, child.start));
        inner.push_str(&render_node(child, chars, resolver));
        cursor = child.end;
    }
    inner.push_str(&plain_text(chars, cursor, node.end));

    let Some(span) = node.span else {
        return inner;
    };
    match span.kind.as_str() {
        "strong" => format!("<strong>{}</strong>", inner),
        "em" => format!("<em>{}</em>", inner),
        "label" => {
            let label = span
                .data
                .as_ref()
                .and_then(|d| d.label.as_deref())
                .unwrap_or_default();
            format!("<span{}>{}</span>", attributes(&[("class", label)]), inner)
        }
        "hyperlink" => match &span.data {
            Some(data) => wrap_link(&data.link, resolver, &inner),
            None => inner,
        },
        _ => inner,
    }
}

/// Escaped text in `[start, end)`, newlines as line breaks
fn plain_text(chars: &[(usize, char)], start: usize, end: usize) -> String {
    let raw: String = chars
        .iter()
        .filter(|(pos, _)| *pos >= start && *pos < end)
        .map(|(_, c)| *c)
        .collect();
    escape_html(&raw).replace('\n', "<br />")
}

// ABOUTME: Queryable page content: plain text or a parsed HTML document.
// ABOUTME: Exposes structural queries, node text, next-sibling navigation, and block-aware text lines.

//! Page content abstraction.
//!
//! Candidate extraction only needs three things from a page: find nodes by
//! structural role, read a node's text, and step to a node's next sibling.
//! The [`Queryable`] trait captures that, so callers holding some other tree
//! (an accessibility snapshot from a browser, say) can plug it in directly.
//! [`PageContent`] covers the two shapes the fetcher usually hands over.

use std::collections::HashMap;

use ego_tree::NodeId;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use crate::extractors::profile::Role;

/// A structural query against a document.
#[derive(Debug, Clone, Copy)]
pub enum NodeQuery<'a> {
    Role(Role),
    Css(&'a Selector),
}

/// Read-only access to a page for candidate extraction.
pub trait Queryable {
    /// Cheap handle to a node in the underlying document.
    type Node: Copy;

    /// Nodes matching a query, in document order. Unsupported queries yield nothing.
    fn query(&self, query: NodeQuery<'_>) -> Vec<Self::Node>;

    /// Whitespace-normalized text of a node.
    fn text(&self, node: Self::Node) -> String;

    /// Next element sibling of a node.
    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    /// Whitespace-normalized, non-empty text lines in document order.
    fn lines(&self) -> Vec<String>;
}

/// Collapses runs of whitespace into single spaces and trims.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Plain text content. Lines are its only structure.
#[derive(Debug, Clone, Default)]
pub struct TextContent {
    lines: Vec<String>,
}

impl TextContent {
    pub fn new(text: &str) -> Self {
        let lines = text
            .lines()
            .map(normalize_whitespace)
            .filter(|l| !l.is_empty())
            .collect();
        Self { lines }
    }
}

impl Queryable for TextContent {
    type Node = usize;

    fn query(&self, _query: NodeQuery<'_>) -> Vec<usize> {
        Vec::new()
    }

    fn text(&self, node: usize) -> String {
        self.lines.get(node).cloned().unwrap_or_default()
    }

    fn next_sibling(&self, node: usize) -> Option<usize> {
        (node + 1 < self.lines.len()).then_some(node + 1)
    }

    fn lines(&self) -> Vec<String> {
        self.lines.clone()
    }
}

// Elements whose text never belongs to the page body
const SKIP_TAGS: &[&str] = &["head", "script", "style", "noscript", "template", "svg"];

// Elements that start and end a text line
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "div", "dl", "dt",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tbody", "td",
    "tfoot", "th", "thead", "tr", "ul",
];

static ROLE_SELECTORS: Lazy<HashMap<Role, Selector>> = Lazy::new(|| {
    Role::ALL
        .iter()
        .map(|role| (*role, Selector::parse(role.css()).unwrap()))
        .collect()
});

/// A parsed HTML document.
pub struct HtmlContent {
    doc: Html,
}

impl HtmlContent {
    pub fn new(html: &str) -> Self {
        Self {
            doc: Html::parse_document(html),
        }
    }

    fn element(&self, node: NodeId) -> Option<ElementRef<'_>> {
        self.doc.tree.get(node).and_then(ElementRef::wrap)
    }
}

impl std::fmt::Debug for HtmlContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlContent").finish_non_exhaustive()
    }
}

impl Queryable for HtmlContent {
    type Node = NodeId;

    fn query(&self, query: NodeQuery<'_>) -> Vec<NodeId> {
        let selector = match query {
            NodeQuery::Role(role) => match ROLE_SELECTORS.get(&role) {
                Some(selector) => selector,
                None => return Vec::new(),
            },
            NodeQuery::Css(selector) => selector,
        };
        self.doc.select(selector).map(|el| el.id()).collect()
    }

    fn text(&self, node: NodeId) -> String {
        self.element(node)
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .unwrap_or_default()
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.doc
            .tree
            .get(node)?
            .next_siblings()
            .find_map(ElementRef::wrap)
            .map(|el| el.id())
    }

    fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut buf = String::new();
        collect_lines(self.doc.tree.root(), &mut buf, &mut lines);
        flush_line(&mut buf, &mut lines);
        lines
    }
}

fn flush_line(buf: &mut String, lines: &mut Vec<String>) {
    let line = normalize_whitespace(buf);
    if !line.is_empty() {
        lines.push(line);
    }
    buf.clear();
}

fn collect_lines(node: ego_tree::NodeRef<'_, Node>, buf: &mut String, lines: &mut Vec<String>) {
    match node.value() {
        Node::Text(text) => buf.push_str(&text.text),
        Node::Element(el) => {
            let name = el.name();
            if SKIP_TAGS.contains(&name) {
                return;
            }
            if name == "br" {
                flush_line(buf, lines);
                return;
            }
            let block = BLOCK_TAGS.contains(&name);
            if block {
                flush_line(buf, lines);
            }
            for child in node.children() {
                collect_lines(child, buf, lines);
            }
            if block {
                flush_line(buf, lines);
            }
        }
        _ => {
            for child in node.children() {
                collect_lines(child, buf, lines);
            }
        }
    }
}

static MARKUP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(?:!doctype|html|body|p|li|ol|ul|div|h[1-6]|table|tr|td|br|span|article|section)\b[^>]*>")
        .unwrap()
});

/// Content handed to the pipeline by a fetcher.
#[derive(Debug)]
pub enum PageContent {
    Text(TextContent),
    Html(HtmlContent),
}

impl PageContent {
    pub fn from_text(text: &str) -> Self {
        PageContent::Text(TextContent::new(text))
    }

    pub fn from_html(html: &str) -> Self {
        PageContent::Html(HtmlContent::new(html))
    }

    /// Parses as HTML when the input carries recognizable markup, else as text.
    pub fn detect(raw: &str) -> Self {
        if looks_like_html(raw) {
            Self::from_html(raw)
        } else {
            Self::from_text(raw)
        }
    }

    /// Decodes fetched bytes and picks a representation.
    ///
    /// The charset comes from the `Content-Type` value when present and known,
    /// otherwise it is detected. A content type naming html or plain text wins
    /// over sniffing.
    pub fn from_bytes(body: &[u8], content_type: Option<&str>) -> Self {
        let decoded = decode_body(body, content_type);
        match content_type.map(|ct| ct.to_lowercase()) {
            Some(ct) if ct.contains("html") => Self::from_html(&decoded),
            Some(ct) if ct.contains("text/plain") => Self::from_text(&decoded),
            _ => Self::detect(&decoded),
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, PageContent::Html(_))
    }

    /// Text lines of either representation.
    pub fn lines(&self) -> Vec<String> {
        match self {
            PageContent::Text(t) => t.lines(),
            PageContent::Html(h) => h.lines(),
        }
    }
}

impl From<&str> for PageContent {
    fn from(raw: &str) -> Self {
        PageContent::detect(raw)
    }
}

/// Returns true if the string contains common HTML tags.
pub fn looks_like_html(raw: &str) -> bool {
    MARKUP_RE.is_match(raw)
}

/// Decode body bytes to a String using the header charset or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(charset) = content_type.and_then(extract_charset) {
        if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
            let (decoded, _, _) = encoding.decode(body);
            return decoded.into_owned();
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from a Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    lower.split(';').find_map(|part| {
        part.trim()
            .strip_prefix("charset=")
            .map(|cs| cs.trim_matches('"').trim_matches('\'').to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html>
        <head><title>Best Songs - Site</title><style>.x { color: red; }</style></head>
        <body>
            <h2>1. Daft Punk - <em>One More Time</em></h2>
            <p>Blurb about the song<br>second line</p>
            <ol>
                <li>SZA - Kill Bill</li>
                <li>  Halsey:   "Nightmare" </li>
            </ol>
            <ul class="chart">
                <li><h3>Flowers</h3><span>Miley Cyrus</span></li>
            </ul>
            <script>var songs = ["ignored"];</script>
        </body>
        </html>
    "#;

    #[test]
    fn test_text_content_lines_normalized() {
        let text = TextContent::new("  1. A  -  B \n\n\t2. C - D\r\n");
        assert_eq!(text.lines(), vec!["1. A - B", "2. C - D"]);
        assert!(text.query(NodeQuery::Role(Role::ListItem)).is_empty());
        assert_eq!(text.next_sibling(0), Some(1));
        assert_eq!(text.next_sibling(1), None);
    }

    #[test]
    fn test_html_lines_break_on_blocks_and_skip_head_and_scripts() {
        let html = HtmlContent::new(SAMPLE_HTML);
        assert_eq!(
            html.lines(),
            vec![
                "1. Daft Punk - One More Time",
                "Blurb about the song",
                "second line",
                "SZA - Kill Bill",
                "Halsey: \"Nightmare\"",
                "Flowers",
                "Miley Cyrus",
            ]
        );
    }

    #[test]
    fn test_html_role_query_and_text() {
        let html = HtmlContent::new(SAMPLE_HTML);
        let items: Vec<String> = html
            .query(NodeQuery::Role(Role::OrderedListItem))
            .into_iter()
            .map(|n| html.text(n))
            .collect();
        assert_eq!(items, vec!["SZA - Kill Bill", "Halsey: \"Nightmare\""]);
    }

    #[test]
    fn test_html_next_sibling_skips_text_nodes() {
        let html = HtmlContent::new(SAMPLE_HTML);
        let selector = Selector::parse("ul.chart h3").unwrap();
        let titles = html.query(NodeQuery::Css(&selector));
        assert_eq!(titles.len(), 1);
        let artist = html.next_sibling(titles[0]).unwrap();
        assert_eq!(html.text(artist), "Miley Cyrus");
        assert!(html.next_sibling(artist).is_none());
    }

    #[test]
    fn test_every_role_has_a_selector() {
        for role in Role::ALL {
            assert!(ROLE_SELECTORS.contains_key(&role), "{:?}", role);
        }
        let html = HtmlContent::new(SAMPLE_HTML);
        assert!(html.query(NodeQuery::Role(Role::TableRow)).is_empty());
    }

    #[test]
    fn test_detect_markup() {
        assert!(PageContent::detect(SAMPLE_HTML).is_html());
        assert!(PageContent::detect("<li>A - B</li>").is_html());
        assert!(!PageContent::detect("1. A - B\n2. C - D").is_html());
        assert!(!PageContent::detect("Artist <3 - Title").is_html());
    }

    #[test]
    fn test_from_bytes_uses_header_charset() {
        // "Beyoncé - Halo" in ISO-8859-1
        let body = b"Beyonc\xe9 - Halo";
        let content = PageContent::from_bytes(body, Some("text/plain; charset=ISO-8859-1"));
        assert!(!content.is_html());
        assert_eq!(content.lines(), vec!["Beyoncé - Halo"]);
    }

    #[test]
    fn test_from_bytes_html_content_type() {
        let content = PageContent::from_bytes(b"just text", Some("text/html"));
        assert!(content.is_html());
        assert_eq!(content.lines(), vec!["just text"]);
    }

    #[test]
    fn test_extract_charset() {
        assert_eq!(
            extract_charset("text/html; charset=\"utf-8\""),
            Some("utf-8".to_string())
        );
        assert_eq!(extract_charset("text/html"), None);
    }
}

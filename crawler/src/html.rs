//! HTML cleanup, link extraction and page metadata.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

pub const SNIPPET_LIMIT: usize = 400;
pub const NO_SNIPPET: &str = "Contains links";

const BLOCK_ELEMENTS: &[&str] = &["head", "style", "script", "noscript", "svg", "nav", "header", "footer"];

lazy_static! {
    static ref COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").expect("valid regex");
    // the regex crate has no backreferences, so one pattern per element
    static ref BLOCKS: Vec<Regex> = BLOCK_ELEMENTS
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).expect("valid regex"))
        .collect();
    static ref SEL_TITLE: Selector = Selector::parse("title").expect("valid selector");
    static ref SEL_P: Selector = Selector::parse("p").expect("valid selector");
    static ref SEL_A: Selector = Selector::parse("a[href]").expect("valid selector");
}

/// Removes comments and the block elements (head, scripts, styles,
/// navigation, headers, footers) whose links and text are not page content.
pub fn strip_block_elements(html: &str) -> String {
    let mut out = COMMENT.replace_all(html, " ").into_owned();
    for block in BLOCKS.iter() {
        out = block.replace_all(&out, " ").into_owned();
    }
    out
}

/// Text of the first `<title>`, trimmed, with newlines removed.
pub fn title(doc: &Html) -> String {
    doc.select(&SEL_TITLE)
        .next()
        .map(|n| n.text().collect::<String>().replace(['\r', '\n'], "").trim().to_string())
        .unwrap_or_default()
}

/// Concatenated text of every paragraph holding 50 to 800 characters,
/// cut to [`SNIPPET_LIMIT`] characters.
pub fn snippet(doc: &Html) -> String {
    let mut text = String::new();
    for p in doc.select(&SEL_P) {
        let inner = p.text().collect::<String>();
        let len = inner.chars().count();
        if (50..=800).contains(&len) {
            text.push_str(&inner);
        }
    }
    let mut text: String = text.chars().take(SNIPPET_LIMIT).collect();
    if let Some(rest) = text.strip_prefix(", ") {
        text = rest.to_string();
    }
    if text.is_empty() {
        return NO_SNIPPET.to_string();
    }
    text
}

/// Tag-free text with entities decoded; text nodes are joined by spaces so
/// words from adjacent elements stay apart.
pub fn plain_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    doc.root_element().text().collect::<Vec<_>>().join(" ")
}

/// Canonical form of a URL: the fragment is dropped.
pub fn normalize(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

/// HTTP(S) targets of every `<a href>` in `html`, resolved against `base`
/// and normalized, in document order.
pub fn links(base: &Url, html: &str) -> Vec<Url> {
    let doc = Html::parse_document(html);
    doc.select(&SEL_A)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .map(|u| normalize(&u))
        .collect()
}

//! HTML parsing: link, image, and text extraction
//!
//! Built on `scraper`, which is lenient by construction: malformed input
//! yields an empty or partial document, never an error, so extraction can
//! always return a (possibly empty) result.

use crate::url::{classify, normalize_url, UrlClass};
use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Subtrees excluded from text extraction
const STRIPPED_TAGS: &[&str] = &["script", "style", "nav", "header", "footer"];

/// Extracts crawlable page links from an HTML document
///
/// Every anchor href is resolved against `base` and normalized; only URLs
/// classified as page candidates survive (images, video platforms, and
/// skip-listed hosts are filtered out).
pub fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Ok(url) = normalize_url(href, Some(base)) {
                    if classify(&url) == UrlClass::Page {
                        links.push(url);
                    }
                }
            }
        }
    }

    links
}

/// Extracts image references from an HTML document
///
/// Every img src is resolved against `base`; only URLs whose path carries a
/// known image extension are kept.
pub fn extract_image_refs(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut images = Vec::new();

    if let Ok(selector) = Selector::parse("img[src]") {
        for element in document.select(&selector) {
            if let Some(src) = element.value().attr("src") {
                if let Ok(url) = normalize_url(src, Some(base)) {
                    if classify(&url) == UrlClass::Image {
                        images.push(url);
                    }
                }
            }
        }
    }

    images
}

/// Extracts the readable body text of an HTML document
///
/// Concatenates the trimmed text of paragraph elements with single spaces,
/// skipping paragraphs inside navigation chrome and skipping script/style
/// content nested inside a paragraph.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut paragraphs = Vec::new();

    if let Ok(selector) = Selector::parse("p") {
        for element in document.select(&selector) {
            if inside_stripped_subtree(element) {
                continue;
            }

            let mut text = String::new();
            collect_text(*element, &mut text);
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                paragraphs.push(trimmed.to_string());
            }
        }
    }

    paragraphs.join(" ")
}

/// Counts whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn inside_stripped_subtree(element: ElementRef) -> bool {
    element.ancestors().any(|node| match node.value() {
        Node::Element(el) => STRIPPED_TAGS.contains(&el.name()),
        _ => false,
    })
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                if !STRIPPED_TAGS.contains(&el.name()) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

//! HTML to text extraction
//!
//! This module turns a fetched page into bounded plain text:
//! - `<script>` and `<style>` contents are dropped
//! - Closing block-level tags become line breaks, other tags become spaces
//! - Entities are decoded by the HTML parser
//! - Whitespace is normalized and the result truncated
//!
//! It also rejects pages that are not worth sending to the model: non-HTML
//! responses, near-empty text, and bot-protection interstitials.

use super::fetcher::FetchedPage;
use crate::config::ScraperConfig;
use scraper::{ElementRef, Html};

/// Elements whose contents never reach the text output
const SKIPPED_ELEMENTS: [&str; 2] = ["script", "style"];

/// Elements whose closing tag ends a line
const BLOCK_ELEMENTS: [&str; 14] = [
    "p", "div", "section", "article", "li", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "footer", "nav",
];

/// Blocked pages that mention "403 forbidden" are short error bodies
const FORBIDDEN_BODY_MAX_CHARS: usize = 500;

/// Why a fetched page contributed no text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Content-Type is not `text/html`
    NotHtml { content_type: String },
    /// Cleaned text is shorter than the configured minimum
    TooShort { chars: usize },
    /// The page is a bot-protection or access-denied interstitial
    Blocked,
}

/// Extracts usable text from a fetched page
///
/// # Returns
///
/// * `Ok(String)` - Cleaned text, at most `max_chars_per_page` characters
/// * `Err(Rejection)` - The page should be ignored
pub fn extract_page_text(page: &FetchedPage, config: &ScraperConfig) -> Result<String, Rejection> {
    if !page.content_type.to_ascii_lowercase().contains("text/html") {
        return Err(Rejection::NotHtml {
            content_type: page.content_type.clone(),
        });
    }

    let text = html_to_text(&page.body, config.max_chars_per_page);
    let chars = text.chars().count();

    if chars < config.min_page_chars {
        return Err(Rejection::TooShort { chars });
    }

    if is_blocked_page(&text) {
        return Err(Rejection::Blocked);
    }

    Ok(text)
}

/// Converts an HTML document to readable plain text
///
/// # Example
///
/// ```
/// use vcscout::scrape::html_to_text;
///
/// let html = "<h1>Acme</h1><p>Robots &amp; rockets</p><script>track()</script>";
/// assert_eq!(html_to_text(html, 3000), "Acme\nRobots & rockets");
/// ```
pub fn html_to_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);

    let mut raw = String::with_capacity(html.len() / 2);
    collect_text(document.root_element(), &mut raw);

    truncate_chars(&normalize_whitespace(&raw), max_chars)
}

/// Walks the element tree, writing text nodes and tag separators
fn collect_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if SKIPPED_ELEMENTS.contains(&name) {
        return;
    }

    out.push(' ');

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }

    if BLOCK_ELEMENTS.contains(&name) {
        out.push('\n');
    } else {
        out.push(' ');
    }
}

/// Normalizes whitespace in extracted text
///
/// Runs of horizontal whitespace (including non-breaking spaces) become one
/// space, lines are trimmed, three or more consecutive line breaks collapse
/// to exactly two, and the result is trimmed.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_newlines = 0usize;

    for line in text.split('\n') {
        let collapsed = line
            .split(|c: char| c.is_whitespace())
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if collapsed.is_empty() {
            pending_newlines += 1;
            continue;
        }

        if !out.is_empty() {
            out.push_str(if pending_newlines >= 2 { "\n\n" } else { "\n" });
        }
        out.push_str(&collapsed);
        pending_newlines = 1;
    }

    out
}

/// Detects bot-protection interstitials and bare access-denied pages
pub fn is_blocked_page(text: &str) -> bool {
    let lower = text.to_lowercase();

    (lower.contains("checking your browser") && lower.contains("cloudflare"))
        || lower.contains("just a moment")
        || lower.contains("enable javascript and cookies")
        || (lower.contains("403 forbidden") && text.chars().count() < FORBIDDEN_BODY_MAX_CHARS)
}

/// Truncates to at most `max_chars` characters, never splitting a character
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

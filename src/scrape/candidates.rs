//! Candidate page list
//!
//! A company's public information usually lives on a handful of predictable
//! pages. Instead of crawling, the scraper fetches exactly these.

/// Paths appended to the website root, in fetch order
pub const CANDIDATE_PATHS: [&str; 8] = [
    "/about",
    "/about-us",
    "/product",
    "/blog",
    "/careers",
    "/jobs",
    "/changelog",
    "/updates",
];

/// Builds the ordered list of candidate URLs for a website
///
/// One trailing slash is stripped, then the root itself is followed by every
/// entry of [`CANDIDATE_PATHS`]. No validation happens here: a malformed
/// website only shows up later as fetch failures.
///
/// # Example
///
/// ```
/// use vcscout::scrape::build_page_list;
///
/// let pages = build_page_list("https://acme.dev/");
/// assert_eq!(pages[0], "https://acme.dev");
/// assert_eq!(pages[1], "https://acme.dev/about");
/// assert_eq!(pages.len(), 9);
/// ```
pub fn build_page_list(website: &str) -> Vec<String> {
    let base = website.strip_suffix('/').unwrap_or(website);

    std::iter::once(base.to_string())
        .chain(CANDIDATE_PATHS.iter().map(|path| format!("{}{}", base, path)))
        .collect()
}

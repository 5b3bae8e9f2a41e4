//! Same-origin link extraction
//!
//! Only `<a href>` anchors are followed. Links are resolved against the page's
//! origin, filtered to the page's own network location and de-fragmented.

use crate::url::{origin_of, same_network_location, strip_fragment};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

/// Schemes that never lead to another page
const SKIPPED_SCHEMES: [&str; 4] = ["javascript:", "mailto:", "tel:", "data:"];

/// Extracts the crawlable links of a page
///
/// # Rules
///
/// - `javascript:`, `mailto:`, `tel:`, `data:` and empty hrefs are skipped
/// - Relative hrefs resolve against the origin (`scheme://host[:port]/`), not the
///   page path, so `about` on `/team/` becomes `/about`
/// - Links to another host, or the same host on another port, are dropped
/// - Fragments are removed; the page itself is not returned
///
/// # Example
///
/// ```
/// use contact_crawler::crawler::extract_links;
/// use url::Url;
///
/// let page = Url::parse("https://example.com/team/").unwrap();
/// let html = r#"<a href="about">About</a><a href="https://other.com/">Out</a>"#;
/// let links = extract_links(html, &page);
/// assert_eq!(links.len(), 1);
/// assert!(links.contains(&Url::parse("https://example.com/about").unwrap()));
/// ```
pub fn extract_links(html: &str, page_url: &Url) -> HashSet<Url> {
    let document = Html::parse_document(html);
    let origin = origin_of(page_url);
    let current = strip_fragment(page_url);

    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, &origin))
        .filter(|link| same_network_location(link, page_url))
        .filter(|link| *link != current)
        .collect()
}

/// Resolves an href against the origin; `None` if it cannot be a page link
fn resolve_link(href: &str, origin: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        return None;
    }

    let absolute = origin.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }

    Some(strip_fragment(&absolute))
}

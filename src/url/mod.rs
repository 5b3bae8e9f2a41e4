//! URL handling module for Contact Crawler
//!
//! This module validates crawl targets, computes origins, compares network
//! locations and strips fragments so the crawler sees one node per page.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{bare_domain, extract_domain, same_network_location};
pub use normalize::{normalize_url, strip_fragment};

use crate::UrlError;
use url::Url;

/// Validates a raw crawl target and parses it into a URL
///
/// A target must carry an explicit `http://` or `https://` scheme and a host.
/// Inputs without a scheme are rejected, never coerced.
///
/// # Examples
///
/// ```
/// use contact_crawler::url::parse_target;
///
/// assert!(parse_target("https://example.com").is_ok());
/// assert!(parse_target("example.com").is_err());
/// assert!(parse_target("ftp://example.com").is_err());
/// ```
pub fn parse_target(raw: &str) -> Result<Url, UrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let lower = trimmed.to_ascii_lowercase();
    if !lower.starts_with("http://") && !lower.starts_with("https://") {
        return Err(UrlError::InvalidScheme(format!(
            "'{}' does not start with http:// or https://",
            trimmed
        )));
    }

    let url = Url::parse(trimmed).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// Returns the origin of a URL (scheme, host and explicit port) as a root URL
///
/// Relative links are resolved against this rather than the page path.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use contact_crawler::url::origin_of;
///
/// let url = Url::parse("https://example.com:8443/a/b?q=1#top").unwrap();
/// assert_eq!(origin_of(&url).as_str(), "https://example.com:8443/");
/// ```
pub fn origin_of(url: &Url) -> Url {
    let mut origin = url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    // Credentials never belong to the crawl boundary
    let _ = origin.set_username("");
    let _ = origin.set_password(None);
    origin
}

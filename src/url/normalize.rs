use crate::UrlError;
use url::Url;

/// Normalizes a URL for visited-set bookkeeping
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not HTTP or HTTPS
/// 3. Require a host (the parser lowercases it)
/// 4. Remove the fragment (everything after #)
///
/// Paths and query strings are kept as-is: two URLs that differ there are
/// different pages as far as a contact crawl is concerned.
///
/// # Examples
///
/// ```
/// use contact_crawler::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com/team#staff").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/team");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(strip_fragment(&url))
}

/// Returns a copy of the URL without its fragment
pub fn strip_fragment(url: &Url) -> Url {
    let mut stripped = url.clone();
    stripped.set_fragment(None);
    stripped
}

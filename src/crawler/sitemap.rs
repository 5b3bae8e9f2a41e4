//! Sitemap discovery and parsing
//!
//! A site's `/sitemap.xml` is used to seed crawls. Both `<urlset>` and
//! `<sitemapindex>` documents are understood; `<loc>` elements are matched by
//! local name so any namespace (or none) works.

use crate::crawler::fetcher::PageFetcher;
use crate::url::normalize_url;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;
use sxd_document::parser;
use sxd_xpath::{evaluate_xpath, Value};
use url::Url;

const LOC_XPATH: &str = "//*[local-name()='loc']";

/// Kind of sitemap document, from its root element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    UrlSet,
    Index,
}

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapDocument {
    pub kind: SitemapKind,
    /// Trimmed, non-empty `<loc>` values in document order
    pub locs: Vec<String>,
}

/// Parses a sitemap XML document
///
/// Any root other than `<sitemapindex>` is treated as a URL set.
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, String> {
    let package = parser::parse(xml).map_err(|e| format!("invalid XML: {}", e))?;
    let document = package.as_document();

    let root_name = document
        .root()
        .children()
        .into_iter()
        .find_map(|child| child.element())
        .map(|element| element.name().local_part().to_string())
        .ok_or_else(|| "document has no root element".to_string())?;

    let kind = if root_name == "sitemapindex" {
        SitemapKind::Index
    } else {
        SitemapKind::UrlSet
    };

    let locs = match evaluate_xpath(&document, LOC_XPATH) {
        Ok(Value::Nodeset(nodes)) => nodes
            .document_order()
            .into_iter()
            .map(|node| node.string_value().trim().to_string())
            .filter(|loc| !loc.is_empty())
            .collect(),
        Ok(_) => Vec::new(),
        Err(e) => return Err(format!("XPath evaluation failed: {}", e)),
    };

    Ok(SitemapDocument { kind, locs })
}

/// Resolves a site's sitemap into crawl seeds
pub struct SitemapResolver {
    fetcher: Arc<dyn PageFetcher>,
    max_documents: usize,
}

impl SitemapResolver {
    /// `fetcher` should be a direct (proxy-less) fetcher
    pub fn new(fetcher: Arc<dyn PageFetcher>, max_documents: usize) -> Self {
        Self {
            fetcher,
            max_documents: max_documents.max(1),
        }
    }

    /// Returns every page URL listed by `<origin>/sitemap.xml`
    ///
    /// Never fails: an unreachable, non-XML or malformed sitemap yields an
    /// empty set and a warning.
    pub async fn resolve(&self, origin: &Url) -> BTreeSet<String> {
        let mut urls = BTreeSet::new();

        let root = match origin.join("/sitemap.xml") {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot build sitemap URL for {}: {}", origin, e);
                return urls;
            }
        };

        let mut queue = VecDeque::from([root]);
        let mut seen: HashSet<Url> = HashSet::new();
        let mut documents = 0;

        while let Some(sitemap_url) = queue.pop_front() {
            if !seen.insert(sitemap_url.clone()) {
                continue;
            }
            if documents >= self.max_documents {
                tracing::warn!(
                    "Sitemap document limit ({}) reached for {}, skipping remaining",
                    self.max_documents,
                    origin
                );
                break;
            }
            documents += 1;

            let Some(document) = self.fetch_document(&sitemap_url).await else {
                continue;
            };

            match document.kind {
                SitemapKind::UrlSet => {
                    tracing::info!(
                        "Found {} URLs in sitemap {}",
                        document.locs.len(),
                        sitemap_url
                    );
                    urls.extend(document.locs);
                }
                SitemapKind::Index => {
                    tracing::info!(
                        "Sitemap index {} lists {} sitemaps",
                        sitemap_url,
                        document.locs.len()
                    );
                    for loc in document.locs {
                        match normalize_url(&loc) {
                            Ok(child) => queue.push_back(child),
                            Err(e) => tracing::warn!("Skipping sitemap entry {}: {}", loc, e),
                        }
                    }
                }
            }
        }

        urls
    }

    async fn fetch_document(&self, sitemap_url: &Url) -> Option<SitemapDocument> {
        tracing::info!("Fetching sitemap from {}", sitemap_url);

        let page = match self.fetcher.fetch(sitemap_url, false).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Error fetching sitemap: {}", e);
                return None;
            }
        };

        let is_xml = page
            .content_type()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("xml"));
        if !is_xml {
            tracing::warn!("Sitemap {} is not in XML format", sitemap_url);
            return None;
        }

        match parse_sitemap(&page.body) {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::warn!("Skipping sitemap {}: {}", sitemap_url, e);
                None
            }
        }
    }
}

//! Email and phone extraction
//!
//! Two passes over each page: a structured pass over `mailto:` anchors, and a
//! regex pass over the visible text (script and style contents excluded).

use crate::url::bare_domain;
use regex::Regex;
use scraper::{Html, Node, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Public mailbox providers accepted regardless of the page's domain
pub const KNOWN_EMAIL_PROVIDERS: [&str; 10] = [
    "gmail.com",
    "hotmail.com",
    "yahoo.com",
    "outlook.com",
    "aol.com",
    "icloud.com",
    "protonmail.com",
    "zoho.com",
    "mail.com",
    "gmx.com",
];

/// Image names like `logo@2x.png` look like addresses; they never are
const IMAGE_EXTENSIONS: [&str; 6] = [".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

/// Elements whose text never reaches the reader
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

const EMAIL_PATTERN: &str = r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}";

/// One capture group per shape; the last one is the generic fallback
const PHONE_PATTERN: &str = concat!(
    r"(\+1[-.\s]?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4})|",
    r"(\+44[-.\s]?\(?\d{2,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{4})|",
    r"(\+61[-.\s]?\(?\d{1,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{4})|",
    r"(\+49[-.\s]?\(?\d{2,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{4})|",
    r"(\+33[-.\s]?\(?\d{1,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{4})|",
    r"(\+91[-.\s]?\(?\d{2,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{4})|",
    r"(\+86[-.\s]?\(?\d{2,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{4})|",
    r"(\+55[-.\s]?\(?\d{2,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{4})|",
    r"(\+81[-.\s]?\(?\d{1,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{4})|",
    r"(\+92[-.\s]?\(?\d{2,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{4})|",
    r"(\(?\d{2,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{4,9})",
);

/// Contacts found on one page (or aggregated over a crawl)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contacts {
    pub emails: BTreeSet<String>,
    pub phones: BTreeSet<String>,
}

impl Contacts {
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.phones.is_empty()
    }

    /// Merges another page's findings into this set
    pub fn merge(&mut self, other: Contacts) {
        self.emails.extend(other.emails);
        self.phones.extend(other.phones);
    }
}

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("valid email pattern"));

static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PHONE_PATTERN).expect("valid phone pattern"));

static MAILTO_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

/// Extracts emails and phone numbers from HTML
#[derive(Debug, Clone, Copy)]
pub struct ContactExtractor {
    restrict_emails: bool,
}

impl ContactExtractor {
    /// `restrict_emails` keeps only addresses on the page's domain or a known provider
    pub fn new(restrict_emails: bool) -> Self {
        Self { restrict_emails }
    }

    /// Extracts contacts from a page served under `page_domain`
    pub fn extract_contacts(&self, html: &str, page_domain: &str) -> Contacts {
        let document = Html::parse_document(html);
        let text = visible_text(&document);
        let page_domain = page_domain.to_ascii_lowercase();

        let mut contacts = Contacts::default();

        for found in EMAIL_REGEX.find_iter(&text) {
            if let Some(email) = self.accept_email(found.as_str(), &page_domain) {
                contacts.emails.insert(email);
            }
        }

        for href in document
            .select(&*MAILTO_SELECTOR)
            .filter_map(|a| a.value().attr("href"))
        {
            for address in mailto_addresses(href) {
                if !self.is_full_email(address) {
                    continue;
                }
                if let Some(email) = self.accept_email(address, &page_domain) {
                    contacts.emails.insert(email);
                }
            }
        }

        for captures in PHONE_REGEX.captures_iter(&text) {
            contacts.phones.extend(
                captures
                    .iter()
                    .skip(1)
                    .flatten()
                    .map(|m| m.as_str())
                    .filter(|phone| !phone.is_empty())
                    .map(str::to_string),
            );
        }

        tracing::debug!(
            "Extracted {} emails and {} phones",
            contacts.emails.len(),
            contacts.phones.len()
        );
        contacts
    }

    fn is_full_email(&self, candidate: &str) -> bool {
        EMAIL_REGEX
            .find(candidate)
            .is_some_and(|m| m.start() == 0 && m.end() == candidate.len())
    }

    /// Normalizes an address and applies the image and domain filters
    fn accept_email(&self, raw: &str, page_domain: &str) -> Option<String> {
        let (local, domain) = raw.rsplit_once('@')?;
        let domain = domain.to_ascii_lowercase();

        if IMAGE_EXTENSIONS.iter().any(|ext| domain.ends_with(ext)) {
            return None;
        }

        if self.restrict_emails && !is_allowed_domain(&domain, page_domain) {
            return None;
        }

        Some(format!("{}@{}", local, domain))
    }
}

impl Default for ContactExtractor {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Returns true if an email domain belongs to the page or a known provider
pub fn is_allowed_domain(email_domain: &str, page_domain: &str) -> bool {
    let email_domain = email_domain.to_ascii_lowercase();
    let page_domain = page_domain.to_ascii_lowercase();

    (!page_domain.is_empty()
        && (email_domain == page_domain || email_domain == bare_domain(&page_domain)))
        || KNOWN_EMAIL_PROVIDERS.contains(&email_domain.as_str())
}

/// Splits a `mailto:` href into its addresses, dropping any query string
fn mailto_addresses(href: &str) -> Vec<&str> {
    let href = href.trim();
    let Some(target) = href
        .get(..7)
        .filter(|scheme| scheme.eq_ignore_ascii_case("mailto:"))
        .map(|_| &href[7..])
    else {
        return Vec::new();
    };

    let target = target.split('?').next().unwrap_or_default();
    target
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .collect()
}

/// Concatenates the text nodes a reader would see
fn visible_text(document: &Html) -> String {
    let mut chunks = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
        });
        if hidden {
            continue;
        }

        let text = text.trim();
        if !text.is_empty() {
            chunks.push(text);
        }
    }

    chunks.join("\n")
}

//! Contact email discovery on business websites.
//!
//! Probes a fixed list of contact-style paths on the site origin, then the
//! homepage, and runs a layered extraction heuristic on every page that
//! answers HTTP 200. Sites that yield nothing are remembered for the rest of
//! the run so they are never probed twice.

use std::collections::HashSet;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use crate::traits::PageFetcher;

/// Paths probed before the homepage, in order.
pub const CONTACT_PATHS: &[&str] = &[
    "/contact",
    "/contacto",
    "/contact-us",
    "/contactenos",
    "/en/contact",
    "/contact.html",
    "/contacto.html",
    "/contact.php",
    "/contacto.php",
    "/about",
    "/sobre-nosotros",
    "/about-us",
    "/acerca-de",
    "/info",
    "/informacion",
    "/information",
    "/team",
    "/equipo",
    "/staff",
    "/personal",
];

const PLACEHOLDER_MARKERS: &[&str] = &[
    "noreply",
    "no-reply",
    "donotreply",
    "example.com",
    "test.com",
    "placeholder",
    "yourname",
    "youremail",
    "sample",
    "demo",
];

const FREE_WEBMAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "live.com",
    "icloud.com",
    "aol.com",
];

/// Retina asset names like `logo@2x.png` look like addresses.
const ASSET_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg"];

const CONTACT_REGIONS: &str = "footer, .footer, #footer, .contact, #contact, .contact-info, \
    .contact-details, .email, .email-address, .mail, .info, .information, .datos-contacto, \
    address, .address, .direccion, [class*=\"contact\"], [id*=\"contact\"]";

const STRUCTURED_CONTACT_KEYS: &[&str] = &["email", "contactPoint", "contact"];

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,10}\b").unwrap();
    static ref CONTACT_META_RE: Regex = Regex::new(r"(?i)email|contact").unwrap();
}

/// Per-request timeouts for website probes.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub contact_page_timeout: Duration,
    pub homepage_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            contact_page_timeout: Duration::from_secs(8),
            homepage_timeout: Duration::from_secs(12),
        }
    }
}

/// Run-scoped email finder owning the negative cache.
pub struct EmailDiscovery<F> {
    fetcher: F,
    config: ProbeConfig,
    negative_cache: HashSet<String>,
}

impl<F: PageFetcher> EmailDiscovery<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_config(fetcher, ProbeConfig::default())
    }

    pub fn with_config(fetcher: F, config: ProbeConfig) -> Self {
        Self {
            fetcher,
            config,
            negative_cache: HashSet::new(),
        }
    }

    /// True if `website` was already probed without success this run.
    pub fn is_negative_cached(&self, website: &str) -> bool {
        self.negative_cache.contains(website)
    }

    /// Find a contact email for `website`.
    ///
    /// Probe failures are swallowed. The site is negative-cached only after
    /// every contact path and the homepage came up empty.
    pub async fn discover(&mut self, website: &str) -> Option<String> {
        if self.is_negative_cached(website) {
            tracing::debug!(%website, "Skipping site already probed without result");
            return None;
        }

        let site = parse_site(website);
        if let Some(site) = &site {
            for path in CONTACT_PATHS {
                let Ok(url) = site.join(path) else { continue };
                match self
                    .fetcher
                    .fetch(url.as_str(), self.config.contact_page_timeout)
                    .await
                {
                    Ok(html) => {
                        if let Some(email) = extract_email(&html) {
                            tracing::info!(%website, %path, %email, "Email found on contact page");
                            return Some(email);
                        }
                    }
                    Err(e) => tracing::debug!(url = %url, error = %e, "Contact page probe failed"),
                }
            }
        }

        let homepage = site
            .as_ref()
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| website.to_string());
        match self
            .fetcher
            .fetch(&homepage, self.config.homepage_timeout)
            .await
        {
            Ok(html) => {
                if let Some(email) = extract_email(&html) {
                    tracing::info!(%website, %email, "Email found on homepage");
                    return Some(email);
                }
            }
            Err(e) => tracing::debug!(url = %homepage, error = %e, "Homepage probe failed"),
        }

        tracing::info!(%website, "No usable email found");
        self.negative_cache.insert(website.to_string());
        None
    }
}

/// Parse a website, assuming `http://` when the scheme is missing.
fn parse_site(website: &str) -> Option<Url> {
    let trimmed = website.trim();
    Url::parse(trimmed)
        .or_else(|_| Url::parse(&format!("http://{trimmed}")))
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
}

// ---------------------------------------------------------------------------
// Extraction heuristic
// ---------------------------------------------------------------------------

type Layer = fn(&Html) -> Vec<String>;

/// Extract the best contact email from one page.
///
/// Sources are tried in priority order and the first one that yields a
/// usable address wins: `mailto:` links, contact-like regions, contact meta
/// tags, JSON-LD contact fields, then the full page text.
pub fn extract_email(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let layers: [Layer; 5] = [
        mailto_links,
        contact_regions,
        contact_meta,
        structured_data,
        full_text,
    ];
    layers
        .iter()
        .find_map(|layer| pick_preferred(usable(layer(&document))))
}

fn find_emails(text: &str) -> Vec<String> {
    EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn mailto_links(document: &Html) -> Vec<String> {
    let Ok(sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let mut found = Vec::new();
    for link in document.select(&sel) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if !href
            .get(..7)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("mailto:"))
        {
            continue;
        }
        let target = href[7..].split(['?', '&']).next().unwrap_or_default();
        found.extend(find_emails(target));
    }
    found
}

fn contact_regions(document: &Html) -> Vec<String> {
    let Ok(sel) = Selector::parse(CONTACT_REGIONS) else {
        return Vec::new();
    };
    document
        .select(&sel)
        .flat_map(|el| find_emails(&el.text().collect::<Vec<_>>().join(" ")))
        .collect()
}

fn contact_meta(document: &Html) -> Vec<String> {
    let Ok(sel) = Selector::parse("meta[name][content]") else {
        return Vec::new();
    };
    document
        .select(&sel)
        .filter(|meta| {
            meta.value()
                .attr("name")
                .is_some_and(|name| CONTACT_META_RE.is_match(name))
        })
        .filter_map(|meta| meta.value().attr("content"))
        .flat_map(find_emails)
        .collect()
}

fn structured_data(document: &Html) -> Vec<String> {
    let Ok(sel) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };
    let mut found = Vec::new();
    for script in document.select(&sel) {
        let raw = script.text().collect::<String>();
        if let Ok(value) = serde_json::from_str::<Value>(&raw) {
            walk_structured(&value, &mut found);
        }
    }
    found
}

fn walk_structured(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|v| walk_structured(v, found)),
        Value::Object(map) => {
            for (key, v) in map {
                if STRUCTURED_CONTACT_KEYS
                    .iter()
                    .any(|k| key.eq_ignore_ascii_case(k))
                {
                    collect_strings(v, found);
                } else if key == "@graph" {
                    walk_structured(v, found);
                }
            }
        }
        _ => {}
    }
}

fn collect_strings(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::String(s) => found.extend(find_emails(s)),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, found)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, found)),
        _ => {}
    }
}

fn full_text(document: &Html) -> Vec<String> {
    find_emails(&document.root_element().text().collect::<Vec<_>>().join(" "))
}

/// Drop placeholder, no-reply and asset-name matches.
fn usable(candidates: Vec<String>) -> Vec<String> {
    candidates
        .into_iter()
        .filter(|email| {
            let lower = email.to_lowercase();
            let Some((_, domain)) = lower.rsplit_once('@') else {
                return false;
            };
            domain.contains('.')
                && !PLACEHOLDER_MARKERS.iter().any(|m| lower.contains(m))
                && !ASSET_SUFFIXES.iter().any(|s| domain.ends_with(s))
        })
        .collect()
}

/// Prefer a business-domain address; otherwise the first free-webmail one.
fn pick_preferred(candidates: Vec<String>) -> Option<String> {
    candidates
        .iter()
        .find(|email| !is_free_webmail(email))
        .or_else(|| candidates.first())
        .cloned()
}

fn is_free_webmail(email: &str) -> bool {
    let lower = email.to_lowercase();
    let domain = lower.rsplit_once('@').map(|(_, d)| d).unwrap_or_default();
    FREE_WEBMAIL_DOMAINS
        .iter()
        .any(|d| domain == *d || domain.starts_with(&format!("{d}.")))
}

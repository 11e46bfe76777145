//! Evidence sources and domain credibility scoring
//!
//! The scorer is a pure domain-to-tier mapping. Official/government
//! outlets, wire services, and established fact-checkers score high;
//! blogs and social platforms score low; anything unrecognized is medium.

use serde::{Deserialize, Serialize};

use crate::SNIPPET_MAX_CHARS;

/// Coarse trustworthiness tier of an evidence source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credibility {
    High,
    Medium,
    Low,
    Unknown,
}

impl Credibility {
    /// Sort rank, lower sorts first (high credibility leads)
    pub fn rank(&self) -> u8 {
        match self {
            Credibility::High => 0,
            Credibility::Medium => 1,
            Credibility::Low => 2,
            Credibility::Unknown => 3,
        }
    }
}

/// A source supporting (or refuting) a claim analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub title: String,
    /// Unique within a result set
    pub url: String,
    pub snippet: String,
    pub credibility: Credibility,
}

impl Evidence {
    /// Construct evidence, truncating the snippet at a char boundary
    pub fn new(title: &str, url: &str, snippet: &str, credibility: Credibility) -> Self {
        let snippet = if snippet.chars().count() > SNIPPET_MAX_CHARS {
            snippet.chars().take(SNIPPET_MAX_CHARS).collect()
        } else {
            snippet.to_string()
        };

        Self {
            title: title.to_string(),
            url: url.to_string(),
            snippet,
            credibility,
        }
    }
}

/// Official government and public-safety sources
const OFFICIAL_DOMAINS: &[&str] = &[
    "gov.in",
    "nic.in",
    "mha.gov.in",
    "ndma.gov.in",
    "pib.gov.in",
    "who.int",
];

/// Major verified news outlets and wire services
const NEWS_DOMAINS: &[&str] = &[
    "reuters.com",
    "apnews.com",
    "bbc.com",
    "thehindu.com",
    "indianexpress.com",
    "ndtv.com",
    "aninews.in",
    "ddnews.gov.in",
];

/// Established fact-checking organizations
const FACT_CHECK_DOMAINS: &[&str] = &[
    "factcheck.org",
    "snopes.com",
    "politifact.com",
    "altnews.in",
    "boomlive.in",
    "vishvasnews.com",
];

/// Self-published and social platforms
const LOW_CRED_MARKERS: &[&str] = &[
    "blog",
    "wordpress",
    "medium.com",
    "facebook.com",
    "twitter.com",
    "x.com",
    "reddit.com",
    "tiktok.com",
    "instagram.com",
    "whatsapp",
];

/// Score a source URL's credibility tier from its host
pub fn score_domain(url: &str) -> Credibility {
    let host = match host_of(url) {
        Some(h) => h.to_lowercase(),
        None => return Credibility::Unknown,
    };

    let high = OFFICIAL_DOMAINS
        .iter()
        .chain(NEWS_DOMAINS)
        .chain(FACT_CHECK_DOMAINS);

    for trusted in high {
        if host == *trusted || host.ends_with(&format!(".{}", trusted)) {
            return Credibility::High;
        }
    }

    if LOW_CRED_MARKERS.iter().any(|m| host.contains(m)) {
        return Credibility::Low;
    }

    Credibility::Medium
}

/// Extract the host portion of a URL without a full URL parser
fn host_of(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;

    let host = rest.split('/').next()?;
    let host = host.split('@').last()?;
    let host = host.split(':').next()?;

    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

//! Evidence Gatherer
//!
//! Fans fixed query variants out to the search collaborator, deduplicates
//! by URL, scores credibility, and returns a bounded, ordered evidence set.
//! Bounded-time and infallible from the caller's perspective: total search
//! failure yields an empty set.

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

use crosscheck_core::{score_domain, Evidence, MAX_SOURCES, RESULTS_PER_QUERY};
use crosscheck_search::SharedProvider;

/// Gatherer tuning
#[derive(Debug, Clone)]
pub struct GathererConfig {
    /// Results requested per query variant
    pub results_per_query: usize,
    /// Cap on the returned evidence set
    pub max_sources: usize,
    /// Overall deadline across all variants
    pub overall_timeout: Duration,
    /// Concurrent in-flight queries
    pub max_concurrent: usize,
}

impl Default for GathererConfig {
    fn default() -> Self {
        Self {
            results_per_query: RESULTS_PER_QUERY,
            max_sources: MAX_SOURCES,
            overall_timeout: Duration::from_secs(12),
            max_concurrent: 4,
        }
    }
}

/// Result-page TLDs dropped outright
const JUNK_TLDS: &[&str] = &[".cn", ".ru", ".xyz"];

/// Gathers and ranks evidence for a claim
pub struct EvidenceGatherer {
    provider: SharedProvider,
    config: GathererConfig,
}

impl EvidenceGatherer {
    pub fn new(provider: SharedProvider, config: GathererConfig) -> Self {
        Self { provider, config }
    }

    /// Gather evidence for a claim. Never errors; worst case is empty.
    pub async fn gather(&self, claim: &str) -> Vec<Evidence> {
        let variants = query_variants(claim);
        let per_query = self.config.results_per_query;

        // `buffered` yields in variant order, so the merge below is
        // deterministic regardless of which request finishes first.
        let fanout = stream::iter(variants)
            .map(|query| {
                let provider = self.provider.clone();
                async move {
                    match provider.search(&query, per_query).await {
                        Ok(hits) => hits,
                        Err(e) => {
                            warn!("Search variant '{}' failed: {}", query, e);
                            Vec::new()
                        }
                    }
                }
            })
            .buffered(self.config.max_concurrent)
            .collect::<Vec<_>>();

        let results = match tokio::time::timeout(self.config.overall_timeout, fanout).await {
            Ok(results) => results,
            Err(_) => {
                warn!("Evidence gathering timed out");
                return Vec::new();
            }
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut evidence = Vec::new();

        for hit in results.into_iter().flatten() {
            let normalized = hit.url.trim_end_matches('/').to_lowercase();
            if seen.contains(&normalized) || is_junk_domain(&normalized) {
                continue;
            }
            seen.insert(normalized);

            evidence.push(Evidence::new(
                &hit.title,
                &hit.url,
                &hit.snippet,
                score_domain(&hit.url),
            ));
        }

        // Stable sort: equal tiers keep their arrival (relevance) rank
        evidence.sort_by_key(|e| e.credibility.rank());
        evidence.truncate(self.config.max_sources);

        debug!("Gathered {} evidence sources", evidence.len());
        evidence
    }
}

/// Fixed query variants derived from the claim
fn query_variants(claim: &str) -> Vec<String> {
    vec![
        claim.to_string(),
        format!("{} fact check", claim),
        format!("{} debunked", claim),
        format!("{} official statement", claim),
    ]
}

fn is_junk_domain(normalized_url: &str) -> bool {
    let host = normalized_url
        .strip_prefix("https://")
        .or_else(|| normalized_url.strip_prefix("http://"))
        .unwrap_or(normalized_url)
        .split('/')
        .next()
        .unwrap_or("");

    JUNK_TLDS.iter().any(|tld| host.ends_with(tld))
}

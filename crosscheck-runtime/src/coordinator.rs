//! Coordinator
//!
//! The orchestrating state machine that owns the request lifecycle:
//! cache lookup -> single-flight registration -> evidence gathering ->
//! consensus -> explanation -> store. The coordinator always returns a
//! ClaimAnalysis for a valid claim; collaborator failures degrade the
//! output instead of propagating.

use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crosscheck_agents::{ConsensusAggregator, EvidenceGatherer, Explainer};
use crosscheck_core::{Claim, ClaimAnalysis, DEFAULT_CACHE_TTL_SECS};

use crate::{await_flight, Flight, MemoryBank, Metrics};

/// Coordinator tuning
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// TTL for stored results. Zero disables caching AND single-flight
    /// dedup (the degraded store-unavailable mode).
    pub cache_ttl: Duration,
    /// Deadline for one miss-path computation. Must exceed the inner
    /// gatherer/backend/explainer timeouts so inner failures resolve
    /// first.
    pub overall_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            overall_timeout: Duration::from_secs(60),
        }
    }
}

/// Orchestrates claim verification end to end
pub struct Coordinator {
    gatherer: EvidenceGatherer,
    aggregator: ConsensusAggregator,
    explainer: Explainer,
    memory: Arc<MemoryBank>,
    metrics: Arc<Metrics>,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(
        gatherer: EvidenceGatherer,
        aggregator: ConsensusAggregator,
        explainer: Explainer,
        memory: Arc<MemoryBank>,
        metrics: Arc<Metrics>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            gatherer,
            aggregator,
            explainer,
            memory,
            metrics,
            config,
        }
    }

    pub fn memory(&self) -> &Arc<MemoryBank> {
        &self.memory
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Analyze a claim. Returns a complete analysis; `cached` tells the
    /// caller whether it came from the memory bank.
    pub async fn analyze(&self, claim: &Claim) -> ClaimAnalysis {
        let request_id = Uuid::new_v4().to_string()[..8].to_string();
        let span = info_span!("analyze", request = %request_id);
        self.analyze_inner(claim).instrument(span).await
    }

    async fn analyze_inner(&self, claim: &Claim) -> ClaimAnalysis {
        let started = Instant::now();
        self.metrics.record_request();

        let caching = !self.config.cache_ttl.is_zero();
        let key = claim.cache_key();

        if caching {
            if let Some(hit) = self.memory.get(&key) {
                self.metrics.record_cache_hit();
                info!("Cache hit");
                return hit;
            }
        }

        let owner = if caching {
            match self.memory.begin(&key, claim.text()) {
                Flight::Owner(owner) => Some(owner),
                Flight::Waiter(rx) => {
                    self.metrics.record_deduped();
                    info!("Joining in-flight analysis for the same claim");
                    return match await_flight(rx).await {
                        Some(mut analysis) => {
                            analysis.cached = false;
                            analysis
                        }
                        None => ClaimAnalysis::unverified(
                            claim.text(),
                            "Verification was unavailable. Please retry.",
                        ),
                    };
                }
            }
        } else {
            None
        };

        let analysis =
            match tokio::time::timeout(self.config.overall_timeout, self.compute(claim)).await {
                Ok(analysis) => analysis,
                Err(_) => {
                    warn!("Analysis deadline exceeded, cancelling collaborator calls");
                    ClaimAnalysis::unverified(
                        claim.text(),
                        "Verification sources were unavailable within the time limit.",
                    )
                }
            };

        if caching {
            self.memory
                .put(&key, analysis.clone(), self.config.cache_ttl);
        }
        if let Some(owner) = owner {
            owner.complete(&analysis);
        }

        self.metrics.record_analysis(started.elapsed().as_secs_f64());
        info!(
            "Verification complete: {} ({:.2}) in {:.1}s",
            analysis.final_verdict,
            analysis.confidence,
            started.elapsed().as_secs_f64()
        );

        analysis
    }

    /// Miss-path computation: evidence, then consensus, then explanation
    async fn compute(&self, claim: &Claim) -> ClaimAnalysis {
        let evidence = self.gatherer.gather(claim.text()).await;
        if evidence.is_empty() {
            warn!("No evidence found, proceeding with empty set");
        }

        let consensus = self.aggregator.aggregate(claim.text(), &evidence).await;
        for report in &consensus.reports {
            self.metrics.record_backend(report);
        }

        let explanation = self
            .explainer
            .explain(
                claim.text(),
                consensus.verdict,
                consensus.confidence,
                &evidence,
            )
            .await;

        ClaimAnalysis {
            claim: claim.text().to_string(),
            final_verdict: consensus.verdict,
            confidence: consensus.confidence,
            explanation,
            backend_verdicts: consensus.reports,
            sources: evidence,
            analyzed_at: Utc::now(),
            cached: false,
        }
    }
}

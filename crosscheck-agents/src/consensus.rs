//! Consensus Aggregator
//!
//! Invokes every configured verdict backend concurrently, each under its
//! own timeout, then reduces the partial results with a summed-confidence
//! vote. The vote is deterministic: backend arrival order never changes
//! the outcome, and ties break on the fixed priority
//! FALSE > MISLEADING > TRUE > UNVERIFIED.

use futures::future::join_all;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crosscheck_core::{BackendVerdict, Evidence, Verdict};

use crate::SharedVerdictBackend;

/// Aggregator tuning
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Per-backend call timeout
    pub backend_timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            backend_timeout: Duration::from_secs(20),
        }
    }
}

/// Aggregated verdict plus the per-backend reports behind it
#[derive(Debug, Clone)]
pub struct ConsensusOutcome {
    pub verdict: Verdict,
    pub confidence: f64,
    pub reports: Vec<BackendVerdict>,
}

/// Fans a claim out to all verdict backends and reduces the results
pub struct ConsensusAggregator {
    backends: Vec<SharedVerdictBackend>,
    config: AggregatorConfig,
}

impl ConsensusAggregator {
    pub fn new(backends: Vec<SharedVerdictBackend>, config: AggregatorConfig) -> Self {
        Self { backends, config }
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    /// Aggregate verdicts across all configured backends
    pub async fn aggregate(&self, claim: &str, evidence: &[Evidence]) -> ConsensusOutcome {
        let timeout = self.config.backend_timeout;

        let calls = self.backends.iter().map(|backend| {
            let backend = backend.clone();
            async move {
                let started = Instant::now();
                let result = tokio::time::timeout(timeout, backend.verify(claim, evidence)).await;
                let elapsed_ms = started.elapsed().as_millis() as u64;

                match result {
                    Ok(Ok(outcome)) => BackendVerdict::ok(
                        backend.name(),
                        outcome.verdict,
                        outcome.confidence,
                        outcome.reasoning,
                        elapsed_ms,
                    ),
                    Ok(Err(e)) => {
                        warn!("Backend {} failed: {}", backend.name(), e);
                        BackendVerdict::error(backend.name(), &e.to_string(), elapsed_ms)
                    }
                    Err(_) => {
                        warn!("Backend {} timed out", backend.name());
                        BackendVerdict::timeout(backend.name(), elapsed_ms)
                    }
                }
            }
        });

        let reports = join_all(calls).await;
        let (verdict, confidence) = tally(&reports, self.backends.len());

        info!(
            "Consensus: {} ({:.2}) from {}/{} backends",
            verdict,
            confidence,
            reports.iter().filter(|r| r.is_ok()).count(),
            self.backends.len()
        );

        ConsensusOutcome {
            verdict,
            confidence,
            reports,
        }
    }
}

/// The voting rule, kept pure for determinism tests.
///
/// Winner is the category with the highest summed ok-confidence. Final
/// confidence divides the winning sum by the number of CONFIGURED backends,
/// so a partial quorum scores lower even when unanimous.
pub fn tally(reports: &[BackendVerdict], configured: usize) -> (Verdict, f64) {
    let ok: Vec<&BackendVerdict> = reports.iter().filter(|r| r.is_ok()).collect();

    if ok.is_empty() || configured == 0 {
        return (Verdict::Unverified, 0.0);
    }

    // Verdict::ALL is in priority order; strict comparison keeps the
    // highest-priority category on equal sums.
    let mut winner = Verdict::Unverified;
    let mut winning_sum = 0.0_f64;

    for category in Verdict::ALL {
        let sum: f64 = ok
            .iter()
            .filter(|r| r.verdict == category)
            .map(|r| r.confidence)
            .sum();

        if sum > winning_sum {
            winner = category;
            winning_sum = sum;
        }
    }

    (winner, winning_sum / configured as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LlmError, VerdictBackend, VerdictOutcome};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedBackend {
        name: String,
        verdict: Verdict,
        confidence: f64,
    }

    impl FixedBackend {
        fn shared(name: &str, verdict: Verdict, confidence: f64) -> SharedVerdictBackend {
            Arc::new(Self {
                name: name.to_string(),
                verdict,
                confidence,
            })
        }
    }

    #[async_trait]
    impl VerdictBackend for FixedBackend {
        fn name(&self) -> &str {
            &self.name
        }

        async fn verify(
            &self,
            _claim: &str,
            _evidence: &[Evidence],
        ) -> Result<VerdictOutcome, LlmError> {
            Ok(VerdictOutcome {
                verdict: self.verdict,
                confidence: self.confidence,
                reasoning: "fixed".to_string(),
            })
        }
    }

    struct HangingBackend;

    #[async_trait]
    impl VerdictBackend for HangingBackend {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn verify(
            &self,
            _claim: &str,
            _evidence: &[Evidence],
        ) -> Result<VerdictOutcome, LlmError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    struct BrokenBackend;

    #[async_trait]
    impl VerdictBackend for BrokenBackend {
        fn name(&self) -> &str {
            "broken"
        }

        async fn verify(
            &self,
            _claim: &str,
            _evidence: &[Evidence],
        ) -> Result<VerdictOutcome, LlmError> {
            Err(LlmError::Api("503".to_string()))
        }
    }

    fn report(backend: &str, verdict: Verdict, confidence: f64) -> BackendVerdict {
        BackendVerdict::ok(backend, verdict, confidence, "r".to_string(), 10)
    }

    #[test]
    fn test_tally_order_invariant() {
        let a = vec![
            report("a", Verdict::True, 0.8),
            report("b", Verdict::False, 0.6),
            report("c", Verdict::True, 0.3),
        ];
        let mut b = a.clone();
        b.reverse();
        let c = vec![a[1].clone(), a[2].clone(), a[0].clone()];

        assert_eq!(tally(&a, 3), tally(&b, 3));
        assert_eq!(tally(&a, 3), tally(&c, 3));
    }

    #[test]
    fn test_tally_tie_breaks_toward_false() {
        let reports = vec![
            report("a", Verdict::False, 0.8),
            report("b", Verdict::Misleading, 0.8),
        ];
        let (verdict, _) = tally(&reports, 2);
        assert_eq!(verdict, Verdict::False);
    }

    #[test]
    fn test_tally_tie_misleading_over_true() {
        let reports = vec![
            report("a", Verdict::Misleading, 0.5),
            report("b", Verdict::True, 0.5),
        ];
        let (verdict, _) = tally(&reports, 2);
        assert_eq!(verdict, Verdict::Misleading);
    }

    #[test]
    fn test_tally_partial_quorum_scales_down() {
        // 3 configured, 1 ok at 0.9 for TRUE -> 0.3
        let reports = vec![
            report("a", Verdict::True, 0.9),
            BackendVerdict::timeout("b", 5000),
            BackendVerdict::error("c", "503", 12),
        ];
        let (verdict, confidence) = tally(&reports, 3);
        assert_eq!(verdict, Verdict::True);
        assert!((confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_tally_zero_quorum() {
        let reports = vec![
            BackendVerdict::timeout("a", 5000),
            BackendVerdict::error("b", "503", 12),
        ];
        assert_eq!(tally(&reports, 2), (Verdict::Unverified, 0.0));
        assert_eq!(tally(&[], 2), (Verdict::Unverified, 0.0));
    }

    #[test]
    fn test_tally_summed_confidence_beats_count() {
        // Two low-confidence TRUE votes lose to one high-confidence FALSE
        let reports = vec![
            report("a", Verdict::True, 0.3),
            report("b", Verdict::True, 0.3),
            report("c", Verdict::False, 0.9),
        ];
        let (verdict, confidence) = tally(&reports, 3);
        assert_eq!(verdict, Verdict::False);
        assert!((confidence - 0.3).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_aggregate_with_mixed_backends() {
        let aggregator = ConsensusAggregator::new(
            vec![
                FixedBackend::shared("gemini", Verdict::False, 0.9),
                FixedBackend::shared("llama", Verdict::False, 0.7),
                Arc::new(BrokenBackend),
            ],
            AggregatorConfig::default(),
        );

        let outcome = aggregator.aggregate("claim", &[]).await;

        assert_eq!(outcome.verdict, Verdict::False);
        assert!((outcome.confidence - (0.9 + 0.7) / 3.0).abs() < 1e-9);
        assert_eq!(outcome.reports.len(), 3);
        assert_eq!(outcome.reports.iter().filter(|r| r.is_ok()).count(), 2);
    }

    #[tokio::test]
    async fn test_aggregate_times_out_slow_backend() {
        let aggregator = ConsensusAggregator::new(
            vec![
                FixedBackend::shared("fast", Verdict::True, 0.8),
                Arc::new(HangingBackend),
            ],
            AggregatorConfig {
                backend_timeout: Duration::from_millis(50),
            },
        );

        let outcome = aggregator.aggregate("claim", &[]).await;

        assert_eq!(outcome.verdict, Verdict::True);
        assert!((outcome.confidence - 0.4).abs() < 1e-9);

        let hanging = outcome
            .reports
            .iter()
            .find(|r| r.backend == "hanging")
            .unwrap();
        assert_eq!(hanging.status, crosscheck_core::BackendStatus::Timeout);
    }

    #[tokio::test]
    async fn test_aggregate_all_failed() {
        let aggregator = ConsensusAggregator::new(
            vec![Arc::new(BrokenBackend)],
            AggregatorConfig::default(),
        );

        let outcome = aggregator.aggregate("claim", &[]).await;
        assert_eq!(outcome.verdict, Verdict::Unverified);
        assert_eq!(outcome.confidence, 0.0);
        assert_eq!(outcome.reports.len(), 1);
    }
}

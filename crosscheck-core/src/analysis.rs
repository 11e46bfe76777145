//! The assembled claim analysis
//!
//! This is the unit stored in the memory bank and returned to callers.
//! It is created once per cache miss and served read-only afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BackendVerdict, Evidence, Verdict};

/// Complete adjudication of a single claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimAnalysis {
    /// The claim as submitted
    pub claim: String,

    /// Consensus verdict across backends
    pub final_verdict: Verdict,

    /// Aggregate confidence in [0, 1]
    pub confidence: f64,

    /// Neutral explanation of the verdict
    pub explanation: String,

    /// Individual backend verdicts, including failed calls
    pub backend_verdicts: Vec<BackendVerdict>,

    /// Supporting sources, credibility-first order
    pub sources: Vec<Evidence>,

    pub analyzed_at: DateTime<Utc>,

    /// Whether this result was served from the memory bank
    pub cached: bool,
}

impl ClaimAnalysis {
    /// Degraded analysis for paths where verification was unavailable
    pub fn unverified(claim: &str, explanation: &str) -> Self {
        Self {
            claim: claim.to_string(),
            final_verdict: Verdict::Unverified,
            confidence: 0.0,
            explanation: explanation.to_string(),
            backend_verdicts: Vec::new(),
            sources: Vec::new(),
            analyzed_at: Utc::now(),
            cached: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unverified_shape() {
        let a = ClaimAnalysis::unverified("the dam burst", "verification unavailable");
        assert_eq!(a.final_verdict, Verdict::Unverified);
        assert_eq!(a.confidence, 0.0);
        assert!(!a.explanation.is_empty());
        assert!(!a.cached);
    }

    #[test]
    fn test_json_round_trip() {
        let a = ClaimAnalysis::unverified("claim", "note");
        let json = serde_json::to_string(&a).unwrap();
        let back: ClaimAnalysis = serde_json::from_str(&json).unwrap();
        assert_eq!(back.final_verdict, Verdict::Unverified);
        assert_eq!(back.claim, "claim");
    }
}

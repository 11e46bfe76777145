//! Verdict taxonomy and per-backend verdict records
//!
//! The tie-break priority deliberately favors flagging potential
//! misinformation over false reassurance: FALSE > MISLEADING > TRUE >
//! UNVERIFIED.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Adjudicated status of a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    True,
    False,
    Misleading,
    Unverified,
}

impl Verdict {
    /// All categories, in tie-break priority order (highest first)
    pub const ALL: [Verdict; 4] = [
        Verdict::False,
        Verdict::Misleading,
        Verdict::True,
        Verdict::Unverified,
    ];

    /// Tie-break priority. Higher wins when summed confidences are equal.
    pub fn priority(&self) -> u8 {
        match self {
            Verdict::False => 3,
            Verdict::Misleading => 2,
            Verdict::True => 1,
            Verdict::Unverified => 0,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::True => "TRUE",
            Verdict::False => "FALSE",
            Verdict::Misleading => "MISLEADING",
            Verdict::Unverified => "UNVERIFIED",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of a single backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendStatus {
    Ok,
    Timeout,
    Error,
}

/// One verdict-backend call, recorded for transparency whether or not it
/// participated in the vote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendVerdict {
    /// Backend identifier (model name)
    pub backend: String,
    pub verdict: Verdict,
    /// Confidence in [0, 1]; zero for non-ok calls
    pub confidence: f64,
    pub reasoning: String,
    pub status: BackendStatus,
    /// Wall-clock duration of the call
    pub latency_ms: u64,
}

impl BackendVerdict {
    pub fn ok(
        backend: &str,
        verdict: Verdict,
        confidence: f64,
        reasoning: String,
        latency_ms: u64,
    ) -> Self {
        Self {
            backend: backend.to_string(),
            verdict,
            confidence: confidence.clamp(0.0, 1.0),
            reasoning,
            status: BackendStatus::Ok,
            latency_ms,
        }
    }

    pub fn timeout(backend: &str, latency_ms: u64) -> Self {
        Self {
            backend: backend.to_string(),
            verdict: Verdict::Unverified,
            confidence: 0.0,
            reasoning: "backend timed out".to_string(),
            status: BackendStatus::Timeout,
            latency_ms,
        }
    }

    pub fn error(backend: &str, reason: &str, latency_ms: u64) -> Self {
        Self {
            backend: backend.to_string(),
            verdict: Verdict::Unverified,
            confidence: 0.0,
            reasoning: reason.to_string(),
            status: BackendStatus::Error,
            latency_ms,
        }
    }

    /// Eligible to vote in consensus
    pub fn is_ok(&self) -> bool {
        self.status == BackendStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert!(Verdict::False.priority() > Verdict::Misleading.priority());
        assert!(Verdict::Misleading.priority() > Verdict::True.priority());
        assert!(Verdict::True.priority() > Verdict::Unverified.priority());
    }

    #[test]
    fn test_serde_wire_format() {
        assert_eq!(serde_json::to_string(&Verdict::False).unwrap(), "\"FALSE\"");
        let v: Verdict = serde_json::from_str("\"MISLEADING\"").unwrap();
        assert_eq!(v, Verdict::Misleading);
    }

    #[test]
    fn test_ok_clamps_confidence() {
        let v = BackendVerdict::ok("gemini", Verdict::True, 1.7, "sure".to_string(), 120);
        assert_eq!(v.confidence, 1.0);
        assert!(v.is_ok());
    }

    #[test]
    fn test_non_ok_excluded_from_vote() {
        assert!(!BackendVerdict::timeout("llama", 5000).is_ok());
        assert!(!BackendVerdict::error("llama", "503", 40).is_ok());
    }
}

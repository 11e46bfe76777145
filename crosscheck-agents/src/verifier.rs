//! Verdict backend capability interface
//!
//! Every concrete verdict backend maps (claim, evidence) to a verdict with
//! confidence and reasoning. The LLM-driven implementation adapts any
//! `LlmBackend` by prompting for strict JSON.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crosscheck_core::{Credibility, Evidence, Verdict};

use crate::{LlmBackend, LlmError};

/// System prompt for claim verification
const VERIFY_SYSTEM_PROMPT: &str = r#"
You are a claim verification expert reviewing an incoming report during a fast-moving information event.

Determine the status of the claim based STRICTLY on the evidence provided:
- TRUE: Confirmed by official sources or multiple reliable news outlets.
- FALSE: Debunked by official sources or authoritative clarifications.
- MISLEADING: Contains grains of truth but is exaggerated or out of context.
- UNVERIFIED: No credible evidence found yet.

Return ONLY valid JSON:
{
  "verdict": "FALSE",
  "confidence": 0.95,
  "reasoning": "Brief, neutral explanation grounded in the evidence."
}
"#;

/// A successful verdict from one backend
#[derive(Debug, Clone)]
pub struct VerdictOutcome {
    pub verdict: Verdict,
    pub confidence: f64,
    pub reasoning: String,
}

/// Common interface for all verdict backends
#[async_trait]
pub trait VerdictBackend: Send + Sync {
    /// Backend identifier used in reports and metrics
    fn name(&self) -> &str;

    /// Map (claim, evidence) to a verdict
    async fn verify(&self, claim: &str, evidence: &[Evidence])
        -> Result<VerdictOutcome, LlmError>;
}

/// Thread-safe reference to a verdict backend
pub type SharedVerdictBackend = Arc<dyn VerdictBackend>;

/// Verdict backend driven by an LLM
pub struct LlmVerifier {
    backend: Arc<dyn LlmBackend>,
}

impl LlmVerifier {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    pub fn shared(backend: Arc<dyn LlmBackend>) -> SharedVerdictBackend {
        Arc::new(Self::new(backend))
    }
}

#[async_trait]
impl VerdictBackend for LlmVerifier {
    fn name(&self) -> &str {
        self.backend.model_name()
    }

    async fn verify(
        &self,
        claim: &str,
        evidence: &[Evidence],
    ) -> Result<VerdictOutcome, LlmError> {
        let user = format!(
            "CLAIM: \"{}\"\n\nEVIDENCE FROM SOURCES:\n{}",
            claim,
            format_evidence(evidence)
        );

        let response = self.backend.generate(VERIFY_SYSTEM_PROMPT, &user).await?;
        parse_verdict_json(&response)
    }
}

/// Format evidence for an LLM prompt
pub fn format_evidence(evidence: &[Evidence]) -> String {
    if evidence.is_empty() {
        return "No evidence found.".to_string();
    }

    evidence
        .iter()
        .enumerate()
        .map(|(i, e)| {
            format!(
                "{}. [{}] {}\n   {}\n   Source: {}",
                i + 1,
                credibility_tag(e.credibility),
                e.title,
                e.snippet,
                e.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn credibility_tag(credibility: Credibility) -> &'static str {
    match credibility {
        Credibility::High => "HIGH",
        Credibility::Medium => "MEDIUM",
        Credibility::Low => "LOW",
        Credibility::Unknown => "UNKNOWN",
    }
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    verdict: Verdict,
    confidence: f64,
    reasoning: String,
}

/// Parse a backend's JSON verdict, tolerating markdown code fences
fn parse_verdict_json(raw: &str) -> Result<VerdictOutcome, LlmError> {
    let cleaned = raw
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string();

    let parsed: RawVerdict =
        serde_json::from_str(&cleaned).map_err(|e| LlmError::Malformed(e.to_string()))?;

    Ok(VerdictOutcome {
        verdict: parsed.verdict,
        confidence: parsed.confidence.clamp(0.0, 1.0),
        reasoning: parsed.reasoning,
    })
}

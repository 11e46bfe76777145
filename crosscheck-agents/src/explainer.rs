//! Explainer
//!
//! Turns the aggregated verdict and evidence into a short, neutral note.
//! Always returns non-empty text: generation failures fall back to a
//! template built from the verdict, confidence, and evidence titles, so
//! the coordinator is never blocked here.

use std::time::Duration;
use tracing::warn;

use crosscheck_core::{Evidence, Verdict};

use crate::SharedBackend;

/// System prompt for explanation generation
const EXPLAINER_SYSTEM_PROMPT: &str = r#"
You write clear, community-notes-style context for claim verdicts.

Rules:
1. Start with the verdict in bold (e.g., **FALSE: Confirmed as a drill**).
2. Explain specifically what the evidence shows, citing the most authoritative source.
3. Warn against panic only if warranted.
4. Keep it under 3 short paragraphs.
5. Neutral tone; no speculation beyond the evidence.
"#;

/// Sources included in the generation context
const CONTEXT_SOURCES: usize = 3;

/// Generates verdict explanations with a templated fallback
pub struct Explainer {
    backend: SharedBackend,
    timeout: Duration,
}

impl Explainer {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Produce explanation text. Never fails, never empty.
    pub async fn explain(
        &self,
        claim: &str,
        verdict: Verdict,
        confidence: f64,
        evidence: &[Evidence],
    ) -> String {
        let sources_text = evidence
            .iter()
            .take(CONTEXT_SOURCES)
            .map(|e| format!("- [{}]({})", e.title, e.url))
            .collect::<Vec<_>>()
            .join("\n");

        let context = format!(
            "Claim: \"{}\"\nVerdict: {}\nConfidence: {:.2}\n\nTop Sources:\n{}",
            claim, verdict, confidence, sources_text
        );

        let generated =
            tokio::time::timeout(self.timeout, self.backend.generate(EXPLAINER_SYSTEM_PROMPT, &context))
                .await;

        match generated {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Ok(_)) => {
                warn!("Explainer returned empty text, using fallback");
                fallback_explanation(verdict, confidence, evidence)
            }
            Ok(Err(e)) => {
                warn!("Explainer generation failed: {}", e);
                fallback_explanation(verdict, confidence, evidence)
            }
            Err(_) => {
                warn!("Explainer timed out");
                fallback_explanation(verdict, confidence, evidence)
            }
        }
    }
}

/// Templated explanation used when generation is unavailable
pub fn fallback_explanation(verdict: Verdict, confidence: f64, evidence: &[Evidence]) -> String {
    let assessment = match verdict {
        Verdict::True => "is supported by the available sources",
        Verdict::False => "is contradicted by the available sources",
        Verdict::Misleading => "mixes accurate and inaccurate elements",
        Verdict::Unverified => "could not be corroborated by the available sources",
    };

    let mut text = format!(
        "**{}**: this claim {} (confidence {:.0}%).",
        verdict,
        assessment,
        confidence * 100.0
    );

    if evidence.is_empty() {
        text.push_str(" No supporting sources were available at the time of analysis.");
    } else {
        let titles = evidence
            .iter()
            .take(CONTEXT_SOURCES)
            .map(|e| e.title.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        text.push_str(&format!(" Reviewed sources: {}.", titles));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LlmBackend, LlmError};
    use async_trait::async_trait;
    use crosscheck_core::Credibility;
    use std::sync::Arc;

    struct MockBackend {
        response: Result<String, ()>,
    }

    #[async_trait]
    impl LlmBackend for MockBackend {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            self.response
                .clone()
                .map_err(|_| LlmError::Api("down".to_string()))
        }

        fn model_name(&self) -> &str {
            "mock"
        }
    }

    fn evidence() -> Vec<Evidence> {
        vec![Evidence::new(
            "Police statement",
            "https://pib.gov.in/x",
            "Confirmed as a drill",
            Credibility::High,
        )]
    }

    #[tokio::test]
    async fn test_explain_uses_generated_text() {
        let explainer = Explainer::new(Arc::new(MockBackend {
            response: Ok("**FALSE: Confirmed as drill** ...".to_string()),
        }));

        let text = explainer
            .explain("sirens in the city", Verdict::False, 0.9, &evidence())
            .await;
        assert!(text.starts_with("**FALSE"));
    }

    #[tokio::test]
    async fn test_explain_falls_back_on_error() {
        let explainer = Explainer::new(Arc::new(MockBackend { response: Err(()) }));

        let text = explainer
            .explain("sirens in the city", Verdict::False, 0.9, &evidence())
            .await;
        assert!(!text.is_empty());
        assert!(text.contains("FALSE"));
        assert!(text.contains("Police statement"));
    }

    #[tokio::test]
    async fn test_explain_falls_back_on_empty() {
        let explainer = Explainer::new(Arc::new(MockBackend {
            response: Ok("   ".to_string()),
        }));

        let text = explainer
            .explain("claim", Verdict::Unverified, 0.0, &[])
            .await;
        assert!(!text.is_empty());
        assert!(text.contains("No supporting sources"));
    }

    #[test]
    fn test_fallback_never_empty_for_any_verdict() {
        for verdict in Verdict::ALL {
            let text = fallback_explanation(verdict, 0.5, &[]);
            assert!(!text.is_empty());
            assert!(text.contains(&verdict.to_string()));
        }
    }
}

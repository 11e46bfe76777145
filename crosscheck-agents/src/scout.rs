//! Scout
//!
//! Surfaces 1-3 specific, verifiable claims trending around a topic so
//! they can be fed to the coordinator. Search and extraction failures
//! degrade to an empty list.

use serde_json::Value;
use tracing::{debug, warn};

use crosscheck_search::SharedProvider;

use crate::SharedBackend;

/// System prompt for claim extraction
const SCOUT_SYSTEM_PROMPT: &str = r#"
You are given news headlines and snippets related to a topic.

Return 1-3 specific claims or statements from them that are worth
fact-checking: concrete, falsifiable, and directly about the topic.

Return ONLY a valid JSON array (no markdown, no code blocks) like this:
["Claim 1", "Claim 2", "Claim 3"]
"#;

/// Maximum claims returned per scan
const MAX_CLAIMS: usize = 3;

/// News results fed to the extraction prompt
const NEWS_RESULTS: usize = 5;

/// Extraction attempts before giving up
const MAX_ATTEMPTS: usize = 3;

/// Finds verifiable claims for a topic
pub struct Scout {
    backend: SharedBackend,
    provider: SharedProvider,
}

impl Scout {
    pub fn new(backend: SharedBackend, provider: SharedProvider) -> Self {
        Self { backend, provider }
    }

    /// Scan for claims around a topic. Empty on failure.
    pub async fn scan(&self, topic: &str) -> Vec<String> {
        let hits = match self
            .provider
            .search(&format!("{} news", topic), NEWS_RESULTS)
            .await
        {
            Ok(hits) if !hits.is_empty() => hits,
            Ok(_) => {
                warn!("No news results for topic '{}'", topic);
                return Vec::new();
            }
            Err(e) => {
                warn!("News search failed for topic '{}': {}", topic, e);
                return Vec::new();
            }
        };

        let news_data = hits
            .iter()
            .map(|h| format!("- {}: {}", h.title, h.snippet))
            .collect::<Vec<_>>()
            .join("\n");

        let user = format!("Topic: {}\n\nNews Data:\n{}", topic, news_data);

        for attempt in 1..=MAX_ATTEMPTS {
            match self.backend.generate(SCOUT_SYSTEM_PROMPT, &user).await {
                Ok(response) => match parse_claims(&response) {
                    Some(claims) => {
                        debug!("Scout extracted {} claims for '{}'", claims.len(), topic);
                        return claims;
                    }
                    None => {
                        warn!(
                            "Scout parse failed (attempt {}/{}): unparseable response",
                            attempt, MAX_ATTEMPTS
                        );
                    }
                },
                Err(e) => {
                    warn!("Scout generation failed (attempt {}/{}): {}", attempt, MAX_ATTEMPTS, e);
                }
            }
        }

        Vec::new()
    }
}

/// Parse a JSON array of claims, tolerating markdown code fences
fn parse_claims(raw: &str) -> Option<Vec<String>> {
    let cleaned = raw
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string();

    let value: Value = serde_json::from_str(&cleaned).ok()?;
    let array = value.as_array()?;

    let claims: Vec<String> = array
        .iter()
        .filter_map(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(MAX_CLAIMS)
        .collect();

    if claims.is_empty() {
        None
    } else {
        Some(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LlmBackend, LlmError};
    use async_trait::async_trait;
    use crosscheck_search::{SearchError, SearchHit, SearchProvider};
    use std::sync::Arc;

    struct MockBackend {
        response: String,
    }

    #[async_trait]
    impl LlmBackend for MockBackend {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            Ok(self.response.clone())
        }

        fn model_name(&self) -> &str {
            "mock"
        }
    }

    struct NewsProvider;

    #[async_trait]
    impl SearchProvider for NewsProvider {
        fn name(&self) -> &str {
            "news"
        }

        async fn search(
            &self,
            _query: &str,
            _max_results: usize,
        ) -> Result<Vec<SearchHit>, SearchError> {
            Ok(vec![SearchHit {
                title: "Study claims warming is accelerating".to_string(),
                url: "https://example.org/a".to_string(),
                snippet: "Scientists warn of tipping points.".to_string(),
            }])
        }
    }

    struct EmptyProvider;

    #[async_trait]
    impl SearchProvider for EmptyProvider {
        fn name(&self) -> &str {
            "empty"
        }

        async fn search(
            &self,
            _query: &str,
            _max_results: usize,
        ) -> Result<Vec<SearchHit>, SearchError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_scan_extracts_claims() {
        let scout = Scout::new(
            Arc::new(MockBackend {
                response: "```json\n[\"Warming is accelerating\", \"Policy announced\"]\n```"
                    .to_string(),
            }),
            Arc::new(NewsProvider),
        );

        let claims = scout.scan("climate change").await;
        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0], "Warming is accelerating");
    }

    #[tokio::test]
    async fn test_scan_empty_news_yields_empty() {
        let scout = Scout::new(
            Arc::new(MockBackend {
                response: "[\"x\"]".to_string(),
            }),
            Arc::new(EmptyProvider),
        );

        assert!(scout.scan("topic").await.is_empty());
    }

    #[tokio::test]
    async fn test_scan_unparseable_yields_empty() {
        let scout = Scout::new(
            Arc::new(MockBackend {
                response: "not json at all".to_string(),
            }),
            Arc::new(NewsProvider),
        );

        assert!(scout.scan("topic").await.is_empty());
    }

    #[test]
    fn test_parse_claims_caps_at_three() {
        let claims = parse_claims("[\"a\", \"b\", \"c\", \"d\"]").unwrap();
        assert_eq!(claims.len(), 3);
    }

    #[test]
    fn test_parse_claims_rejects_non_array() {
        assert!(parse_claims("{\"claim\": \"x\"}").is_none());
        assert!(parse_claims("[]").is_none());
    }
}

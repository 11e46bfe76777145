//! Brave Search API provider

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{create_search_client, SearchConfig, SearchError, SearchHit, SearchProvider};

/// Brave Search API client
pub struct BraveSearch {
    client: Client,
    api_key: String,
}

impl BraveSearch {
    pub fn new(api_key: &str, config: &SearchConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: create_search_client(config)?,
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl SearchProvider for BraveSearch {
    fn name(&self) -> &str {
        "brave"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let url = format!(
            "https://api.search.brave.com/res/v1/web/search?q={}&count={}",
            urlencoding::encode(query),
            max_results
        );

        debug!("Brave search: {}", query);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::Api(response.status().as_u16()));
        }

        let data: BraveSearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        Ok(data
            .web
            .results
            .into_iter()
            .take(max_results)
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                snippet: r.description,
            })
            .collect())
    }
}

// Brave Search API response types
#[derive(Debug, Deserialize)]
struct BraveSearchResponse {
    web: BraveWebResults,
}

#[derive(Debug, Deserialize)]
struct BraveWebResults {
    results: Vec<BraveWebResult>,
}

#[derive(Debug, Deserialize)]
struct BraveWebResult {
    title: String,
    url: String,
    #[serde(default)]
    description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "web": {
                "results": [
                    {"title": "Flood warning issued", "url": "https://reuters.com/a", "description": "Officials said..."},
                    {"title": "No description result", "url": "https://example.com/b"}
                ]
            }
        }"#;

        let parsed: BraveSearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.web.results.len(), 2);
        assert_eq!(parsed.web.results[0].title, "Flood warning issued");
        assert!(parsed.web.results[1].description.is_empty());
    }
}

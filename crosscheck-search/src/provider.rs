//! Search provider trait and HTTP plumbing

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Search collaborator errors
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Failed to build search client: {0}")]
    ClientBuild(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned status {0}")]
    Api(u16),

    #[error("Failed to parse results: {0}")]
    Parse(String),
}

/// A single ranked result from the search collaborator
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Common interface for search collaborators
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name for logging and health reporting
    fn name(&self) -> &str;

    /// Run one query, returning up to `max_results` ranked hits
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;
}

/// Thread-safe reference to a search provider
pub type SharedProvider = Arc<dyn SearchProvider>;

/// Per-request timeout applied to every provider call
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// Browser user agents for rotation
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:137.0) Gecko/20100101 Firefox/137.0",
];

/// Get a random user agent
pub fn random_user_agent() -> &'static str {
    use rand::Rng;
    let idx = rand::thread_rng().gen_range(0..USER_AGENTS.len());
    USER_AGENTS[idx]
}

/// Create an HTTP client for search requests
pub fn create_search_client(config: &SearchConfig) -> Result<Client, SearchError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(random_user_agent())
        .build()
        .map_err(|e| SearchError::ClientBuild(e.to_string()))
}

/// Check whether a provider is reachable and answering queries
pub async fn check_provider(provider: &dyn SearchProvider) -> bool {
    provider.search("news", 1).await.is_ok()
}

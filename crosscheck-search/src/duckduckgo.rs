//! DuckDuckGo HTML-endpoint provider
//!
//! Queries the html.duckduckgo.com fallback interface and extracts result
//! links. No API key required, which makes it the default provider.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

use crate::{create_search_client, SearchConfig, SearchError, SearchHit, SearchProvider};

/// DuckDuckGo HTML search client
pub struct DuckDuckGo {
    client: Client,
}

impl DuckDuckGo {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: create_search_client(config)?,
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGo {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let url = format!(
            "https://html.duckduckgo.com/html/?q={}",
            urlencoding::encode(query)
        );

        debug!("DuckDuckGo search: {}", query);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(SearchError::Api(response.status().as_u16()));
        }

        let html = response.text().await?;
        let hits = parse_results(&html, max_results);

        debug!("DuckDuckGo returned {} results", hits.len());
        Ok(hits)
    }
}

/// Parse search hits from the HTML results page
fn parse_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    let result_selector = Selector::parse("div.result").expect("valid selector");
    let link_selector = Selector::parse("a.result__a").expect("valid selector");
    let snippet_selector = Selector::parse("a.result__snippet").expect("valid selector");

    let mut hits = Vec::new();

    for result in document.select(&result_selector) {
        if hits.len() >= max_results {
            break;
        }

        // Sponsored results carry a result--ad modifier class
        if result
            .value()
            .attr("class")
            .is_some_and(|c| c.contains("result--ad"))
        {
            continue;
        }

        let link = match result.select(&link_selector).next() {
            Some(l) => l,
            None => continue,
        };

        let href = match link.value().attr("href") {
            Some(h) => h,
            None => continue,
        };

        let url = match resolve_redirect(href) {
            Some(u) => u,
            None => continue,
        };

        let title = link.text().collect::<String>().trim().to_string();
        if title.len() < 3 {
            continue;
        }

        let snippet = result
            .select(&snippet_selector)
            .next()
            .map(|s| s.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        hits.push(SearchHit {
            title,
            url,
            snippet,
        });
    }

    hits
}

/// Result links are routed through a redirect with the target in `uddg`
fn resolve_redirect(href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }

    let (_, query) = href.split_once('?')?;
    for pair in query.split('&') {
        if let Some(encoded) = pair.strip_prefix("uddg=") {
            let decoded = urlencoding::decode(encoded).ok()?;
            return Some(decoded.into_owned());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
    <html><body>
      <div class="result results_links">
        <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Freuters.com%2Fflood&amp;rut=abc">Flood warning issued for the valley</a>
        <a class="result__snippet" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Freuters.com%2Fflood">Officials confirmed the warning on Monday.</a>
      </div>
      <div class="result result--ad">
        <a class="result__a" href="https://ads.example.com">Buy flood insurance now</a>
      </div>
      <div class="result results_links">
        <a class="result__a" href="https://example.org/story">Second story headline</a>
      </div>
      <div class="result results_links">
        <a class="result__a" href="https://example.org/short">ab</a>
      </div>
    </body></html>
    "#;

    #[test]
    fn test_parse_decodes_redirects() {
        let hits = parse_results(FIXTURE, 10);
        assert_eq!(hits[0].url, "https://reuters.com/flood");
        assert_eq!(hits[0].title, "Flood warning issued for the valley");
        assert!(hits[0].snippet.contains("confirmed"));
    }

    #[test]
    fn test_parse_skips_ads_and_short_titles() {
        let hits = parse_results(FIXTURE, 10);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| !h.url.contains("ads.example.com")));
    }

    #[test]
    fn test_parse_respects_cap() {
        let hits = parse_results(FIXTURE, 1);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_resolve_redirect_passthrough() {
        assert_eq!(
            resolve_redirect("https://example.com/a").as_deref(),
            Some("https://example.com/a")
        );
        assert_eq!(resolve_redirect("//duckduckgo.com/l/?other=x"), None);
    }
}

use crate::{
    errors::SearchError,
    providers::search::SearchProvider,
    types::{SearchHit, SourceDomain},
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client as ReqwestClient;
use scraper::{Html, Selector};
use tracing::debug;

const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Searches the DuckDuckGo HTML endpoint with a `site:` restriction.
#[derive(Clone, Debug)]
pub struct DuckDuckGoSearch {
    client: ReqwestClient,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new() -> Result<Self, SearchError> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Points the provider at a different endpoint, e.g. a mock server.
    pub fn with_endpoint(endpoint: &str) -> Result<Self, SearchError> {
        let client = ReqwestClient::builder()
            .user_agent("Mozilla/5.0 (compatible; kbrefine/0.1)")
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

/// Extracts result snippets from a DuckDuckGo HTML results page.
pub fn parse_results(html: &str, source_domain: &SourceDomain) -> Result<Vec<SearchHit>, SearchError> {
    let document = Html::parse_document(html);
    let result_selector =
        Selector::parse(".result").map_err(|e| SearchError::Parse(e.to_string()))?;
    let link_selector =
        Selector::parse(".result__a").map_err(|e| SearchError::Parse(e.to_string()))?;
    let snippet_selector =
        Selector::parse(".result__snippet").map_err(|e| SearchError::Parse(e.to_string()))?;

    let observed_at = Utc::now();
    let hits = document
        .select(&result_selector)
        .filter_map(|result| {
            let snippet = result
                .select(&snippet_selector)
                .next()?
                .text()
                .collect::<Vec<_>>()
                .join(" ");
            let snippet = snippet.split_whitespace().collect::<Vec<_>>().join(" ");
            if snippet.is_empty() {
                return None;
            }
            let url = result
                .select(&link_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string);
            Some(SearchHit {
                content: snippet,
                source_domain: source_domain.name.clone(),
                url,
                observed_at,
            })
        })
        .collect();

    Ok(hits)
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(
        &self,
        query: &str,
        source_domain: &SourceDomain,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let scoped_query = format!("site:{} {}", source_domain.site, query);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", scoped_query.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let html = response.text().await?;
        let hits = parse_results(&html, source_domain)?;
        debug!(query = %scoped_query, hits = hits.len(), "Search lookup complete");
        Ok(hits)
    }
}

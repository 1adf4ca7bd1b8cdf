//! Search backend — proxies queries to an external search service and
//! renders the results as chat text.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::SearchError;

/// One search hit. Every field is optional; rendering substitutes "N/A".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResult {
    pub source_title: Option<String>,
    pub url: Option<String>,
    pub snippet: Option<String>,
}

/// The results for one query in the request batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// Seam over the external search service.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a batch of queries, returning one result set per query.
    async fn search(&self, queries: &[String]) -> Result<Vec<ResultSet>, SearchError>;
}

/// Search backend status, fixed at startup from configuration.
#[derive(Clone)]
pub enum SearchBackend {
    Available(Arc<dyn SearchProvider>),
    Unavailable,
}

impl SearchBackend {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// HTTP client for the search service: POSTs `{"queries": [...]}` and
/// expects one result set per query back.
pub struct HttpSearchClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
}

impl HttpSearchClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<SecretString>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[async_trait]
impl SearchProvider for HttpSearchClient {
    async fn search(&self, queries: &[String]) -> Result<Vec<ResultSet>, SearchError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({"queries": queries}));

        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let resp = request.send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(SearchError::RequestFailed(format!(
                "search endpoint returned {status}: {detail}"
            )));
        }

        resp.json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))
    }
}

// ── Rendering ───────────────────────────────────────────────────────

/// Render one result as a Title/URL/Snippet block, "N/A" for missing fields.
pub fn render_result(result: &SearchResult) -> String {
    format!(
        "Title: {}\nURL: {}\nSnippet: {}\n\n",
        result.source_title.as_deref().unwrap_or("N/A"),
        result.url.as_deref().unwrap_or("N/A"),
        result.snippet.as_deref().unwrap_or("N/A"),
    )
}

/// Render the reply for a batch of result sets.
///
/// Only the first set is rendered (one query per dialogue); results keep
/// their input order. Returns `None` when there is nothing to show.
pub fn render_results(sets: &[ResultSet]) -> Option<String> {
    let first = sets.first()?;
    if first.results.is_empty() {
        return None;
    }

    let mut reply = String::from("Search Results:\n\n");
    for result in &first.results {
        reply.push_str(&render_result(result));
    }
    Some(reply)
}

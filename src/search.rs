use crate::error::SearchError;
use crate::types::*;
use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const GITHUB_SEARCH_URL: &str = "https://api.github.com/search/issues";

// Unreserved characters stay as-is, everything else is escaped.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Backend the connection handler forwards queries to.
#[async_trait]
pub trait IssueSearch: Send + Sync {
    async fn search(&self, query: &SearchQuery, timeout: Duration) -> Result<SearchResult, SearchError>;
}

/// Issue search against the GitHub REST API (or anything speaking its shape).
#[derive(Clone, Debug)]
pub struct GitHubClient {
    endpoint: Url,
    http_client: reqwest::Client,
}

impl GitHubClient {
    pub fn new(endpoint: &str, http_client: reqwest::Client) -> Result<Self, SearchError> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
            http_client,
        })
    }

    pub fn request_url(&self, query: &SearchQuery) -> Url {
        let mut url = self.endpoint.clone();
        let q = utf8_percent_encode(&query.joined(), QUERY_VALUE).to_string();
        url.set_query(Some(&format!("q={}", q)));
        url
    }
}

#[async_trait]
impl IssueSearch for GitHubClient {
    async fn search(&self, query: &SearchQuery, timeout: Duration) -> Result<SearchResult, SearchError> {
        let url = self.request_url(query);
        debug!("Search URL: {}", url);

        let resp = self
            .http_client
            .get(url)
            .timeout(timeout)
            .header(USER_AGENT, concat!("issue-gateway/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        if resp.status() != StatusCode::OK {
            return Err(SearchError::Status(resp.status().to_string()));
        }

        let body = resp.bytes().await?;
        let result: SearchResult = serde_json::from_slice(&body)?;
        debug!(total_count = result.total_count, items = result.items.len(), "search API answered");
        Ok(result)
    }
}

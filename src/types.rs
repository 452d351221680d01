use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Search terms of one request line, in the order the client sent them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub terms: Vec<String>,
}

impl SearchQuery {
    /// Splits on `,`. Terms are kept verbatim, empty ones included.
    pub fn parse(line: &str) -> Self {
        Self {
            terms: line.split(',').map(str::to_string).collect(),
        }
    }

    /// Value of the `q` parameter sent to the search API.
    pub fn joined(&self) -> String {
        self.terms.join(" ")
    }
}

// GitHub issue search API types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub total_count: u64,
    pub items: Vec<Issue>,
}

// Item fields are lenient: a missing value decodes to its zero value, and a
// missing author is left for the renderer to report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub tracked_windows: usize,
    pub throttle: u32,
    pub period_ms: u64,
}

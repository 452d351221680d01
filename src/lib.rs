pub mod admin;
pub mod config;
pub mod connection;
pub mod error;
pub mod rate_limit;
pub mod render;
pub mod search;
pub mod server;
pub mod session;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use rate_limit::RateLimiter;
use search::IssueSearch;

/// State shared by every connection task.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub search: Arc<dyn IssueSearch>,
    // Applied to each search API request
    pub timeout: Duration,
}

// Re-export result types for easy access
pub use types::*;

impl AppState {
    pub fn new(limiter: Arc<RateLimiter>, search: Arc<dyn IssueSearch>, timeout: Duration) -> Self {
        Self {
            limiter,
            search,
            timeout,
        }
    }
}

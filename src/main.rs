use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use issue_gateway::config::Config;
use issue_gateway::rate_limit::RateLimiter;
use issue_gateway::search::GitHubClient;
use issue_gateway::server::Server;
use issue_gateway::session::SessionRegistry;
use issue_gateway::{admin, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    info!("Starting issue gateway");
    info!(
        "throttle: {} per {:?}, search timeout {:?}",
        config.throttle, config.period, config.timeout
    );
    info!("Search API: {}", config.api_url);

    // Per-request timeouts are set by the search client
    let http_client = reqwest::Client::builder().build()?;
    let search = GitHubClient::new(&config.api_url, http_client)?;

    let registry = SessionRegistry::new();
    let limiter = Arc::new(RateLimiter::new(config.throttle, config.period, registry.windows()));
    let state = Arc::new(AppState::new(limiter, Arc::new(search), config.timeout));

    let server = match Server::bind(&config.listen_addr(), registry, state.clone()).await {
        Ok(server) => server,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };
    info!("TCP-Server started at {}", server.local_addr()?);

    if let Some(addr) = config.admin_addr() {
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("failed to listen on {}: {}", addr, e);
                std::process::exit(1);
            }
        };
        tokio::spawn(async move {
            if let Err(e) = admin::serve(listener, state).await {
                error!("admin endpoint stopped: {:#}", e);
            }
        });
    }

    server.run().await;
    Ok(())
}

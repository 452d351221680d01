use clap::Parser;
use std::time::Duration;

use crate::search::GITHUB_SEARCH_URL;

/// Static process configuration, read once at startup.
#[derive(Debug, Clone, Parser)]
#[command(name = "issue-gateway", version, about = "Rate-limited TCP gateway to GitHub issue search", long_about = None)]
pub struct Config {
    /// Listen address; `:PORT` listens on every interface
    #[arg(long, env = "GATEWAY_TCP", default_value = ":8080")]
    pub tcp: String,

    /// Queries a session may send per period
    #[arg(long, env = "GATEWAY_THROTTLE", default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..))]
    pub throttle: u32,

    /// Length of one throttle window, e.g. `1s` or `500ms`
    #[arg(long, env = "GATEWAY_PERIOD", default_value = "1s", value_parser = parse_duration)]
    pub period: Duration,

    /// Timeout of one search API request
    #[arg(long, env = "GATEWAY_TIMEOUT", default_value = "15s", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Issue search endpoint
    #[arg(long, env = "GATEWAY_API_URL", default_value = GITHUB_SEARCH_URL)]
    pub api_url: String,

    /// Address of the HTTP health/stats endpoint; disabled when unset
    #[arg(long, env = "GATEWAY_ADMIN")]
    pub admin: Option<String>,
}

impl Config {
    pub fn listen_addr(&self) -> String {
        socket_addr(&self.tcp)
    }

    pub fn admin_addr(&self) -> Option<String> {
        self.admin.as_deref().map(socket_addr)
    }
}

fn socket_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    }
}

/// Parses `<integer><unit>` with unit `ms`, `s`, `m` or `h`.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("missing unit in duration '{}'", input))?;
    let (value, unit) = input.split_at(split);
    let value: u64 = value
        .parse()
        .map_err(|_| format!("invalid duration '{}'", input))?;

    let secs_per_unit = match unit {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => return Err(format!("unknown unit '{}' in duration '{}'", unit, input)),
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration out of range: '{}'", input))
}

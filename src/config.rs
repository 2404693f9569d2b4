use std::env;

use crate::models::{Provider, ProxyConfig};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen port for the HTTP server.
    pub port: u16,
    /// Shared secret for the bearer gate; empty disables the gate.
    pub auth_token: String,
    /// Maximum listings returned per scrape.
    pub max_results: usize,
    /// Headless browser toggle; `HEADLESS=false` opens a visible window.
    pub headless: bool,
    /// Provider used when the request names none (or an unknown one).
    pub default_provider: Provider,
    /// User-agent string applied to the browser and the lookup client.
    pub user_agent: String,
    /// Optional outbound proxy, applied to all scrape traffic.
    pub proxy: Option<ProxyConfig>,
    /// Admission gate: maximum simultaneous browser sessions.
    pub max_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3001,
            auth_token: String::new(),
            max_results: 40,
            headless: true,
            default_provider: Provider::Zillow,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            max_sessions: 2,
        }
    }
}

impl Config {
    pub fn from_env() -> Config {
        let defaults = Config::default();
        Config {
            port: env_parsed("PORT", defaults.port),
            auth_token: env_trimmed("SCRAPER_TOKEN"),
            max_results: env_parsed("SCRAPER_MAX_RESULTS", defaults.max_results),
            headless: env::var("HEADLESS").map(|v| v != "false").unwrap_or(true),
            default_provider: Provider::parse_or(
                &env_trimmed("SCRAPER_DEFAULT_PROVIDER"),
                defaults.default_provider,
            ),
            user_agent: non_empty_or(env_trimmed("SCRAPER_USER_AGENT"), defaults.user_agent),
            proxy: proxy_from_env(),
            max_sessions: env_parsed("SCRAPER_MAX_SESSIONS", defaults.max_sessions).max(1),
        }
    }
}

/// Proxy target: a single URL, or a host/port/user/pass tuple.
fn proxy_from_env() -> Option<ProxyConfig> {
    let user = opt(env_trimmed("SCRAPER_PROXY_USER"));
    let pass = opt(env_trimmed("SCRAPER_PROXY_PASS"));

    let url = env_trimmed("SCRAPER_PROXY_URL");
    if !url.is_empty() {
        return Some(ProxyConfig {
            server_url: url,
            user,
            pass,
        });
    }

    let host = env_trimmed("SCRAPER_PROXY_HOST");
    if host.is_empty() {
        return None;
    }
    let port = env_trimmed("SCRAPER_PROXY_PORT");
    let server_url = if port.is_empty() {
        format!("http://{host}")
    } else {
        format!("http://{host}:{port}")
    };
    Some(ProxyConfig {
        server_url,
        user,
        pass,
    })
}

fn env_trimmed(key: &str) -> String {
    env::var(key).unwrap_or_default().trim().to_string()
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn non_empty_or(value: String, default: String) -> String {
    if value.is_empty() {
        default
    } else {
        value
    }
}

fn opt(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.max_results, 40);
        assert!(cfg.headless);
        assert_eq!(cfg.default_provider, Provider::Zillow);
        assert!(cfg.proxy.is_none());
        assert!(cfg.auth_token.is_empty());
        assert!(cfg.max_sessions >= 1);
    }
}

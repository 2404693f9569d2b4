//! Browser session management: one isolated headless-Chrome session per
//! request. The session's only job is to hand back a fully rendered DOM;
//! every field decision happens later in the pure extraction adapters.
//!
//! The whole module is blocking (headless_chrome drives the browser over a
//! synchronous CDP connection) and is expected to run under
//! `tokio::task::spawn_blocking`. Teardown is RAII: the `Browser` is owned
//! by `fetch_rendered_html`, so the Chrome process is reaped on every exit
//! path, including errors.

use std::ffi::OsStr;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::ProxyConfig;

const VIEWPORT: (u32, u32) = (1280, 720);
const NAV_ATTEMPTS: usize = 2;

/// Installed right after navigation so client-side rendering noise during
/// the dwell/scroll window is captured. Read back by `log_diagnostics`.
const CONSOLE_HOOK: &str = r#"(() => {
  if (!window.__capturedConsole) {
    window.__capturedConsole = [];
    for (const level of ['warn', 'error']) {
      const original = console[level].bind(console);
      console[level] = (...args) => {
        window.__capturedConsole.push(level + ': ' + args.map(String).join(' '));
        original(...args);
      };
    }
  }
  return true;
})()"#;

const CONSOLE_DRAIN: &str = "JSON.stringify((window.__capturedConsole || []).slice(0, 20))";

// A responseStatus of 0 (or absent) means the request never got a
// response, so those entries are kept alongside the non-2xx ones.
const FAILED_RESOURCES: &str = r#"JSON.stringify(
  performance.getEntriesByType('resource')
    .filter((e) => !e.responseStatus || e.responseStatus < 200 || e.responseStatus >= 300)
    .map((e) => [e.responseStatus || 0, e.name])
    .slice(0, 10)
)"#;

/// Everything a single scrape session needs to know.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub headless: bool,
    pub user_agent: String,
    pub proxy: Option<ProxyConfig>,
    pub nav_timeout: Duration,
    pub dwell: Duration,
    pub scroll_passes: u32,
    pub ready_timeout: Duration,
}

impl From<&Config> for SessionConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            headless: cfg.headless,
            user_agent: cfg.user_agent.clone(),
            proxy: cfg.proxy.clone(),
            nav_timeout: Duration::from_secs(60),
            dwell: Duration::from_millis(2500),
            scroll_passes: 2,
            ready_timeout: Duration::from_secs(20),
        }
    }
}

/// Navigate to `url`, give client-side rendering a chance to settle, and
/// return the serialized DOM. Waiting for `ready_selector` is best-effort:
/// a page without the marker still gets extracted (and an empty match is
/// handled by the fallback path downstream).
pub fn fetch_rendered_html(cfg: &SessionConfig, url: &str, ready_selector: &str) -> Result<String> {
    let started = Instant::now();
    let browser = launch(cfg)?;
    let tab = browser.new_tab().context("failed to open page")?;
    tab.set_default_timeout(cfg.nav_timeout);

    navigate_with_retry(&tab, url)?;
    info!(
        url,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "navigation committed"
    );

    let _ = tab.evaluate(CONSOLE_HOOK, false);

    thread::sleep(cfg.dwell);
    auto_scroll(&tab, cfg.scroll_passes);

    if tab
        .wait_for_element_with_custom_timeout(ready_selector, cfg.ready_timeout)
        .is_err()
    {
        warn!(
            selector = ready_selector,
            "content marker never appeared; extracting anyway"
        );
    }

    log_diagnostics(&tab);

    let html = tab.get_content().context("failed to read rendered document")?;
    debug!(
        bytes = html.len(),
        total_ms = started.elapsed().as_millis() as u64,
        "rendered page captured"
    );
    Ok(html)
}

fn launch(cfg: &SessionConfig) -> Result<Browser> {
    let ua_arg = format!("--user-agent={}", cfg.user_agent);
    let proxy_arg = cfg
        .proxy
        .as_ref()
        .map(|p| format!("--proxy-server={}", p.server_url));

    let mut args: Vec<&OsStr> = vec![OsStr::new(&ua_arg)];
    if let Some(ref proxy) = proxy_arg {
        args.push(OsStr::new(proxy));
        debug!("scrape session routed through proxy");
    }
    if cfg.proxy.as_ref().is_some_and(|p| p.user.is_some()) {
        warn!("proxy credentials apply to the lookup client only; the browser connects unauthenticated");
    }

    Browser::new(LaunchOptions {
        headless: cfg.headless,
        window_size: Some(VIEWPORT),
        args,
        ..Default::default()
    })
    .context("failed to launch browser")
}

/// Navigation failure is a recoverable scrape failure, retried once since
/// it is the most transient-prone step of the pipeline.
fn navigate_with_retry(tab: &Tab, url: &str) -> Result<()> {
    let mut last = None;
    for attempt in 1..=NAV_ATTEMPTS {
        match tab.navigate_to(url).and_then(|t| t.wait_until_navigated()) {
            Ok(_) => return Ok(()),
            Err(err) => {
                warn!(url, attempt, error = %err, "navigation failed");
                last = Some(err);
            }
        }
    }
    Err(last.unwrap_or_else(|| anyhow!("navigation did not commit"))).context("navigation failed")
}

/// Scroll passes trigger lazy-loaded cards. Best-effort by contract: a
/// failed evaluate never aborts the scrape.
fn auto_scroll(tab: &Tab, passes: u32) {
    let mut rng = rand::thread_rng();
    for _ in 0..passes {
        let _ = tab.evaluate("window.scrollBy(0, 1500);", false);
        thread::sleep(Duration::from_millis(rng.gen_range(500..1100)));
    }
}

/// Passive observers: console warnings/errors plus subresources that
/// errored or never got a response. Purely observational; never alters
/// control flow.
fn log_diagnostics(tab: &Tab) {
    for entry in drain_json::<String>(tab, CONSOLE_DRAIN) {
        warn!(kind = "console", entry = %entry, "page diagnostic");
    }
    for (status, name) in drain_json::<(u16, String)>(tab, FAILED_RESOURCES) {
        warn!(kind = "response", entry = %describe_resource(status, &name), "page diagnostic");
    }
}

fn drain_json<T: serde::de::DeserializeOwned>(tab: &Tab, expr: &str) -> Vec<T> {
    tab.evaluate(expr, false)
        .ok()
        .and_then(|r| r.value)
        .and_then(|v| v.as_str().map(str::to_string))
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or_default()
}

/// Status 0 is how the performance timeline reports a request that never
/// completed (DNS, connect, or abort), so it gets its own label.
fn describe_resource(status: u16, name: &str) -> String {
    if status == 0 {
        format!("failed {name}")
    } else {
        format!("{status} {name}")
    }
}

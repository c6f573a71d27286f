//! Shared stealth headless-browser pool for challenge escalation.
//!
//! One browser process and one stealth-configured context serve every
//! escalated probe; each probe opens its own page and closes it
//! unconditionally. Launching is expensive, so the browser starts lazily on
//! the first escalation, guarded against duplicate launches.

use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use headless_chrome::browser::tab::RequestPausedDecision;
use headless_chrome::browser::transport::{SessionId, Transport};
use headless_chrome::protocol::cdp::Fetch::{FailRequest, events::RequestPausedEvent};
use headless_chrome::protocol::cdp::Network::{ErrorReason, ResourceType};
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions, Tab};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, warn};

use crate::error::ProbeError;
use crate::markers::{CHALLENGE_TITLES, OFFLINE_MARKERS};

// Fingerprint overrides evaluated before any page script runs.
const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
window.chrome = window.chrome || { runtime: {} };
if (window.navigator.permissions) {
    const originalQuery = window.navigator.permissions.query.bind(window.navigator.permissions);
    window.navigator.permissions.query = (parameters) =>
        parameters.name === 'notifications'
            ? Promise.resolve({ state: Notification.permission })
            : originalQuery(parameters);
}
"#;

pub struct BrowserPool {
    slot: RwLock<Option<Arc<Browser>>>,
    init: Mutex<()>,
    navigation_timeout: Duration,
    challenge_wait: Duration,
}

impl Default for BrowserPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserPool {
    pub fn new() -> Self {
        Self::with_timeouts(Duration::from_secs(20), Duration::from_secs(8))
    }

    pub fn with_timeouts(navigation_timeout: Duration, challenge_wait: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            init: Mutex::new(()),
            navigation_timeout,
            challenge_wait,
        }
    }

    /// Get the shared browser, launching it on first use. Double-checked so
    /// concurrent first-callers cannot race to launch duplicate processes.
    async fn browser(&self) -> Result<Arc<Browser>, ProbeError> {
        if let Some(browser) = self.slot.read().clone() {
            return Ok(browser);
        }

        let _guard = self.init.lock().await;
        if let Some(browser) = self.slot.read().clone() {
            return Ok(browser);
        }

        debug!("launching stealth browser");
        let browser = task::spawn_blocking(launch_browser)
            .await?
            .map_err(|error| ProbeError::Launch(error.to_string()))?;
        let browser = Arc::new(browser);
        *self.slot.write() = Some(browser.clone());
        Ok(browser)
    }

    /// Navigate the URL in a fresh page and report whether the rendered
    /// document looks alive. Any failure along the way excludes the URL.
    pub async fn probe_url(&self, url: &str) -> bool {
        let browser = match self.browser().await {
            Ok(browser) => browser,
            Err(error) => {
                warn!(%error, "browser pool unavailable");
                return false;
            }
        };

        let url = url.to_string();
        let navigation_timeout = self.navigation_timeout;
        let challenge_wait = self.challenge_wait;

        let outcome = task::spawn_blocking(move || {
            probe_with_browser(&browser, &url, navigation_timeout, challenge_wait)
        })
        .await;

        match outcome {
            Ok(Ok(alive)) => alive,
            Ok(Err(error)) => {
                debug!(%error, "browser probe failed");
                false
            }
            Err(error) => {
                warn!(%error, "browser probe task failed");
                false
            }
        }
    }

    /// Tear down the shared browser. Idempotent; pages in flight keep the
    /// process alive until they finish, after which the automation driver
    /// exits with it.
    pub async fn cleanup(&self) {
        let _guard = self.init.lock().await;
        let browser = self.slot.write().take();
        if let Some(browser) = browser {
            let _ = task::spawn_blocking(move || drop(browser)).await;
            debug!("browser pool torn down");
        }
    }
}

fn launch_browser() -> anyhow::Result<Browser> {
    let args: Vec<&OsStr> = vec![
        OsStr::new("--disable-blink-features=AutomationControlled"),
        OsStr::new("--disable-dev-shm-usage"),
        OsStr::new("--disable-infobars"),
        OsStr::new("--mute-audio"),
        OsStr::new("--window-position=0,0"),
    ];

    Browser::new(LaunchOptions {
        headless: true,
        sandbox: false,
        window_size: Some((1366, 768)),
        args,
        idle_browser_timeout: Duration::from_secs(3600),
        ..Default::default()
    })
}

fn probe_with_browser(
    browser: &Browser,
    url: &str,
    navigation_timeout: Duration,
    challenge_wait: Duration,
) -> anyhow::Result<bool> {
    let tab = browser.new_tab()?;
    let result = run_probe(&tab, url, navigation_timeout, challenge_wait);
    // The page is closed no matter how the probe went.
    if let Err(error) = tab.close(true) {
        debug!(%error, "page close failed");
    }
    result
}

fn run_probe(
    tab: &Arc<Tab>,
    url: &str,
    navigation_timeout: Duration,
    challenge_wait: Duration,
) -> anyhow::Result<bool> {
    tab.set_default_timeout(navigation_timeout);

    tab.call_method(Page::AddScriptToEvaluateOnNewDocument {
        source: STEALTH_SCRIPT.to_string(),
        world_name: None,
        include_command_line_api: None,
        run_immediately: None,
    })?;

    // Heavy resources add nothing to a liveness verdict.
    tab.enable_fetch(None, None)?;
    tab.enable_request_interception(Arc::new(
        |_transport: Arc<Transport>, _session_id: SessionId, event: RequestPausedEvent| {
            match event.params.resource_Type {
                ResourceType::Image
                | ResourceType::Font
                | ResourceType::Stylesheet
                | ResourceType::Media
                | ResourceType::TextTrack => RequestPausedDecision::Fail(FailRequest {
                    request_id: event.params.request_id,
                    error_reason: ErrorReason::Aborted,
                }),
                _ => RequestPausedDecision::Continue(None),
            }
        },
    ))?;

    tab.navigate_to(url)?;
    tab.wait_until_navigated()?;

    // Give an interstitial a chance to clear; timing out here is not fatal,
    // the rendered document decides.
    wait_for_challenge_resolution(tab, challenge_wait);

    let html = tab.get_content()?;
    let alive = !OFFLINE_MARKERS.iter().any(|marker| html.contains(marker));

    debug!(%url, alive, "browser probe verdict");
    Ok(alive)
}

fn wait_for_challenge_resolution(tab: &Arc<Tab>, max_wait: Duration) {
    let deadline = Instant::now() + max_wait;
    loop {
        match tab.get_title() {
            Ok(title) => {
                let title = title.to_lowercase();
                if !CHALLENGE_TITLES.iter().any(|marker| title.contains(marker)) {
                    return;
                }
            }
            Err(_) => return,
        }
        if Instant::now() >= deadline {
            debug!("challenge title did not clear in time");
            return;
        }
        std::thread::sleep(Duration::from_millis(500));
    }
}

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::browser::BrowserPool;
use crate::markers::{CHALLENGE_MARKERS, ERROR_PATH_FRAGMENTS, OFFLINE_MARKERS};

pub(crate) const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Status codes that are definitive offline evidence on their own.
///
/// 403 is deliberately excluded: Cloudflare challenges answer 403 too, so a
/// 403 only classifies through the challenge check or the generic non-200
/// rule below.
const DEFINITIVE_OFFLINE_STATUS: &[u16] = &[404, 410, 500];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Alive,
    Dead,
    Challenge,
}

#[derive(Clone)]
pub struct ProbeOptions {
    /// Phase-1 HTTP fan-out.
    pub concurrency: usize,
    /// Per-request timeout for phase 1.
    pub timeout: Duration,
    /// Browser pool for challenge escalation. Without one, Challenge URLs
    /// are conservatively treated as dead.
    pub browser: Option<Arc<BrowserPool>>,
    /// Phase-2 fan-out; browser navigations are far more expensive than
    /// plain requests.
    pub browser_concurrency: usize,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            concurrency: 10,
            timeout: Duration::from_secs(10),
            browser: None,
            browser_concurrency: 3,
        }
    }
}

/// Classify one fetched response. Pure so every rule is testable without
/// network.
pub fn classify(status: StatusCode, final_url: &str, body: &str) -> ProbeOutcome {
    if DEFINITIVE_OFFLINE_STATUS.contains(&status.as_u16()) {
        return ProbeOutcome::Dead;
    }

    if CHALLENGE_MARKERS.iter().any(|marker| body.contains(marker)) {
        return ProbeOutcome::Challenge;
    }

    if status.as_u16() != 200 {
        return ProbeOutcome::Dead;
    }

    if ERROR_PATH_FRAGMENTS
        .iter()
        .any(|fragment| final_url.contains(fragment))
    {
        return ProbeOutcome::Dead;
    }

    if OFFLINE_MARKERS.iter().any(|marker| body.contains(marker)) {
        return ProbeOutcome::Dead;
    }

    ProbeOutcome::Alive
}

async fn probe_one(client: &Client, url: &str, timeout: Duration) -> ProbeOutcome {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, BROWSER_UA)
        .header(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
        .timeout(timeout)
        .send()
        .await;

    let response = match response {
        Ok(response) => response,
        Err(error) => {
            debug!(%url, %error, "phase-1 request failed");
            return ProbeOutcome::Dead;
        }
    };

    let status = response.status();
    let final_url = response.url().to_string();
    let body = match response.text().await {
        Ok(body) => body,
        Err(error) => {
            debug!(%url, %error, "phase-1 body read failed");
            return ProbeOutcome::Dead;
        }
    };

    classify(status, &final_url, &body)
}

/// Probe a batch of (index, url) pairs and return the alive indices.
///
/// Phase 1 issues bounded-concurrency GETs with browser-like headers; URLs
/// classified as Challenge escalate to the browser pool in phase 2 under a
/// lower bound. No retries anywhere, so the result is one temporally
/// consistent liveness snapshot of the batch.
pub async fn probe_batch(
    client: &Client,
    urls: &[(usize, String)],
    options: &ProbeOptions,
) -> HashSet<usize> {
    let mut alive = HashSet::new();
    let mut challenged: Vec<(usize, String)> = Vec::new();

    // Phase 1: cheap HTTP probes.
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut tasks = Vec::with_capacity(urls.len());

    for (index, url) in urls {
        let index = *index;
        let url = url.clone();
        let client = client.clone();
        let timeout = options.timeout;
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };

        tasks.push(tokio::spawn(async move {
            let _permit = permit;
            let outcome = probe_one(&client, &url, timeout).await;
            (index, url, outcome)
        }));
    }

    for task in tasks {
        match task.await {
            Ok((index, _, ProbeOutcome::Alive)) => {
                alive.insert(index);
            }
            Ok((index, url, ProbeOutcome::Challenge)) => {
                challenged.push((index, url));
            }
            Ok((_, _, ProbeOutcome::Dead)) => {}
            Err(error) => warn!(%error, "phase-1 probe task failed"),
        }
    }

    if challenged.is_empty() {
        return alive;
    }

    // Phase 2: browser escalation for challenge-gated URLs only.
    let Some(pool) = options.browser.clone() else {
        debug!(
            count = challenged.len(),
            "no browser pool configured, treating challenged urls as dead"
        );
        return alive;
    };

    let semaphore = Arc::new(Semaphore::new(options.browser_concurrency.max(1)));
    let mut tasks = Vec::with_capacity(challenged.len());

    for (index, url) in challenged {
        let pool = pool.clone();
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };

        tasks.push(tokio::spawn(async move {
            let _permit = permit;
            let alive = pool.probe_url(&url).await;
            (index, alive)
        }));
    }

    for task in tasks {
        match task.await {
            Ok((index, true)) => {
                alive.insert(index);
            }
            Ok((_, false)) => {}
            Err(error) => warn!(%error, "phase-2 probe task failed"),
        }
    }

    alive
}

#[cfg(test)]
mod tests {
    use super::*;

    const CF_CHALLENGE_BODY: &str = r#"<html><head><title>Just a moment...</title></head>
        <body><script src="/cdn-cgi/challenge-platform/h/b/orchestrate"></script></body></html>"#;

    #[test]
    fn test_definitive_offline_statuses() {
        for status in [404u16, 410, 500] {
            assert_eq!(
                classify(StatusCode::from_u16(status).unwrap(), "https://host/x", ""),
                ProbeOutcome::Dead
            );
        }
    }

    #[test]
    fn test_403_without_cloudflare_signature_is_dead() {
        assert_eq!(
            classify(StatusCode::FORBIDDEN, "https://host/x", "<h1>Forbidden</h1>"),
            ProbeOutcome::Dead
        );
    }

    #[test]
    fn test_403_with_cloudflare_signature_is_challenge() {
        assert_eq!(
            classify(StatusCode::FORBIDDEN, "https://host/x", CF_CHALLENGE_BODY),
            ProbeOutcome::Challenge
        );
    }

    #[test]
    fn test_challenge_detected_even_on_200() {
        assert_eq!(
            classify(StatusCode::OK, "https://host/x", CF_CHALLENGE_BODY),
            ProbeOutcome::Challenge
        );
    }

    #[test]
    fn test_error_path_redirect_is_dead() {
        assert_eq!(
            classify(StatusCode::OK, "https://host/404", "<html></html>"),
            ProbeOutcome::Dead
        );
    }

    #[test]
    fn test_offline_marker_is_dead() {
        assert_eq!(
            classify(StatusCode::OK, "https://host/x", "<h1>File Not Found</h1>"),
            ProbeOutcome::Dead
        );
    }

    #[test]
    fn test_plain_page_is_alive() {
        assert_eq!(
            classify(StatusCode::OK, "https://host/x", "<video src=\"a.mp4\"></video>"),
            ProbeOutcome::Alive
        );
    }

    #[tokio::test]
    async fn test_unreachable_url_is_excluded() {
        let client = Client::new();
        let urls = vec![(0usize, "http://127.0.0.1:9/".to_string())];
        let options = ProbeOptions {
            timeout: Duration::from_millis(500),
            ..Default::default()
        };
        let alive = probe_batch(&client, &urls, &options).await;
        assert!(alive.is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn test_probe_batch_integration() {
        let client = Client::new();
        let urls = vec![
            (0usize, "https://example.com/".to_string()),
            (1usize, "https://example.com/definitely/missing/page".to_string()),
        ];
        let alive = probe_batch(&client, &urls, &ProbeOptions::default()).await;
        println!("alive: {alive:?}");
        assert!(alive.contains(&0));
    }
}

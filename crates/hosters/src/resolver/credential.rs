//! Shared short-lived API credentials for token-issuing hosts.
//!
//! One slot per cache; expired readers race to refresh and duplicate
//! concurrent refreshes are tolerated (each issued token is individually
//! valid). Staleness is bounded by the TTL check alone.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::resolver::error::ResolverError;

/// Injectable time source so TTL behavior is deterministic under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
pub struct EphemeralCredential {
    pub token: String,
    pub issued_at: Instant,
}

pub struct TokenCache {
    slot: RwLock<Option<EphemeralCredential>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl,
            clock,
        }
    }

    /// The cached token, if it is still within its TTL.
    pub fn cached(&self) -> Option<String> {
        let slot = self.slot.read();
        let credential = slot.as_ref()?;
        if self.clock.now().duration_since(credential.issued_at) < self.ttl {
            Some(credential.token.clone())
        } else {
            None
        }
    }

    /// Return the cached token or run `issue` to obtain a fresh one and store
    /// it. The lock is never held across the issuing request, so concurrent
    /// callers observing an expired slot may each issue; all converge on a
    /// stored, valid token.
    pub async fn get_or_issue<F, Fut>(&self, issue: F) -> Result<String, ResolverError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, ResolverError>>,
    {
        if let Some(token) = self.cached() {
            return Ok(token);
        }

        let token = issue().await?;
        *self.slot.write() = Some(EphemeralCredential {
            token: token.clone(),
            issued_at: self.clock.now(),
        });
        Ok(token)
    }

    /// Drop the cached credential, forcing the next caller to issue.
    pub fn invalidate(&self) {
        *self.slot.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Clock whose notion of "now" is advanced manually.
    struct ManualClock {
        base: Instant,
        offset: Mutex<Duration>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                base: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            }
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.base + *self.offset.lock()
        }
    }

    #[tokio::test]
    async fn test_within_ttl_issues_at_most_once() {
        let clock = Arc::new(ManualClock::new());
        let cache = TokenCache::with_clock(Duration::from_secs(300), clock.clone());
        let issued = AtomicUsize::new(0);

        for _ in 0..2 {
            let token = cache
                .get_or_issue(|| async {
                    issued.fetch_add(1, Ordering::SeqCst);
                    Ok("token-a".to_string())
                })
                .await
                .unwrap();
            assert_eq!(token, "token-a");
        }

        assert_eq!(issued.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expiry_issues_exactly_one_new_token() {
        let clock = Arc::new(ManualClock::new());
        let cache = TokenCache::with_clock(Duration::from_secs(300), clock.clone());
        let issued = AtomicUsize::new(0);

        let issue = |value: &'static str| {
            issued.fetch_add(1, Ordering::SeqCst);
            async move { Ok(value.to_string()) }
        };

        let first = cache.get_or_issue(|| issue("token-a")).await.unwrap();
        assert_eq!(first, "token-a");

        clock.advance(Duration::from_secs(301));

        let second = cache.get_or_issue(|| issue("token-b")).await.unwrap();
        assert_eq!(second, "token-b");
        assert_eq!(issued.load(Ordering::SeqCst), 2);

        // the refreshed token is served from the slot again
        let third = cache.get_or_issue(|| issue("token-c")).await.unwrap();
        assert_eq!(third, "token-b");
        assert_eq!(issued.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_issue_failure_propagates_and_leaves_slot_empty() {
        let cache = TokenCache::new(Duration::from_secs(300));
        let result = cache
            .get_or_issue(|| async {
                Err(ResolverError::MalformedResponse("no token field".into()))
            })
            .await;
        assert!(result.is_err());
        assert!(cache.cached().is_none());
    }
}

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Tokens are refreshed this long before the provider says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Process-wide cache for an OAuth-style access token.
///
/// Refreshes are single-flight: concurrent callers wait on the same lock and
/// reuse the token the first one fetched.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached token, calling `fetch` for a new one when it is
    /// missing or about to expire. `fetch` yields the token and its lifetime.
    pub async fn get_or_refresh<F, Fut>(&self, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(String, Duration)>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(token) = slot.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        let (value, expires_in) = fetch().await?;
        let refresh_at = Instant::now() + expires_in.saturating_sub(EXPIRY_MARGIN);
        *slot = Some(CachedToken {
            value: value.clone(),
            refresh_at,
        });
        Ok(value)
    }

    pub async fn invalidate(&self) {
        self.slot.lock().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PayoutError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn fetch_counting(calls: &AtomicUsize, ttl: Duration) -> Result<(String, Duration)> {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok((format!("token-{n}"), ttl))
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_is_reused_until_expiry() {
        let cache = TokenCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(3600);

        let first = cache.get_or_refresh(|| fetch_counting(&calls, ttl)).await.unwrap();
        let second = cache.get_or_refresh(|| fetch_counting(&calls, ttl)).await.unwrap();
        assert_eq!(first, "token-1");
        assert_eq!(second, "token-1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(ttl).await;
        let third = cache.get_or_refresh(|| fetch_counting(&calls, ttl)).await.unwrap();
        assert_eq!(third, "token-2");
    }

    #[tokio::test]
    async fn test_short_lived_token_is_always_refreshed() {
        let cache = TokenCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(30);

        cache.get_or_refresh(|| fetch_counting(&calls, ttl)).await.unwrap();
        cache.get_or_refresh(|| fetch_counting(&calls, ttl)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache = TokenCache::new();
        let result = cache
            .get_or_refresh(|| async {
                Err(PayoutError::TransportError("auth down".to_string()))
            })
            .await;
        assert!(result.is_err());

        let token = cache
            .get_or_refresh(|| async { Ok(("fresh".to_string(), Duration::from_secs(600))) })
            .await
            .unwrap();
        assert_eq!(token, "fresh");
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let cache = Arc::new(TokenCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    cache
                        .get_or_refresh(|| async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Ok(("shared".to_string(), Duration::from_secs(3600)))
                        })
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "shared");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let cache = TokenCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(3600);

        cache.get_or_refresh(|| fetch_counting(&calls, ttl)).await.unwrap();
        cache.invalidate().await;
        let token = cache.get_or_refresh(|| fetch_counting(&calls, ttl)).await.unwrap();
        assert_eq!(token, "token-2");
    }
}

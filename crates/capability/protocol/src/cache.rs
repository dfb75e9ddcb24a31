//! 按 IP 的变量表缓存。
//!
//! - 同一 IP 同时最多一个在途读取，并发调用者共享同一个结果
//! - 新鲜度以读取完成时刻为起点，TTL 内直接返回缓存（包括“未取到”的结果）
//! - 已过期但仍有在途读取时，加入在途读取，不发起新的读取
//!
//! 读取在独立任务中执行，发起方被取消不会中断读取，也不会留下悬空的在途标记。

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::time::Instant;
use tracing::debug;

type PendingFetch = Shared<BoxFuture<'static, Option<String>>>;

struct CacheEntry {
    value: Option<String>,
    fetched_at: Instant,
    pending: Option<PendingFetch>,
}

/// 变量表缓存。克隆后共享同一份数据。
#[derive(Clone)]
pub struct DeviceCache {
    ttl: Duration,
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl DeviceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 取 `ip` 的变量表文本；需要读取时调用 `fetcher`。空 IP 直接返回 `None`。
    pub async fn fetch<F, Fut>(&self, ip: &str, fetcher: F) -> Option<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<String>> + Send + 'static,
    {
        let key = ip.trim();
        if key.is_empty() {
            return None;
        }

        let pending = {
            let mut entries = match self.entries.lock() {
                Ok(entries) => entries,
                Err(poisoned) => poisoned.into_inner(),
            };
            match entries.get(key) {
                Some(CacheEntry {
                    pending: Some(pending),
                    ..
                }) => {
                    bms_telemetry::record_cache_join();
                    debug!(target: "bms.protocol", ip = %key, "cache_join_pending");
                    pending.clone()
                }
                Some(entry) if entry.fetched_at.elapsed() < self.ttl => {
                    bms_telemetry::record_cache_hit();
                    return entry.value.clone();
                }
                _ => {
                    let pending = self.spawn_fetch(key.to_string(), fetcher());
                    let previous = entries.remove(key);
                    entries.insert(
                        key.to_string(),
                        CacheEntry {
                            value: previous.and_then(|entry| entry.value),
                            fetched_at: Instant::now(),
                            pending: Some(pending.clone()),
                        },
                    );
                    pending
                }
            }
        };

        pending.await
    }

    /// 丢弃 `ip` 的缓存结果，使下一次 `fetch` 重新读取；在途读取不受影响。
    pub fn invalidate(&self, ip: &str) {
        let key = ip.trim();
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        if entries
            .get(key)
            .is_some_and(|entry| entry.pending.is_none())
        {
            entries.remove(key);
        }
    }

    fn spawn_fetch<Fut>(&self, key: String, fetch: Fut) -> PendingFetch
    where
        Fut: Future<Output = Option<String>> + Send + 'static,
    {
        let entries = Arc::clone(&self.entries);
        let task = tokio::spawn(async move {
            let value = fetch.await;
            let mut entries = match entries.lock() {
                Ok(entries) => entries,
                Err(poisoned) => poisoned.into_inner(),
            };
            entries.insert(
                key,
                CacheEntry {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                    pending: None,
                },
            );
            value
        });
        async move { task.await.ok().flatten() }.boxed().shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_fetcher(
        calls: &Arc<AtomicUsize>,
        delay: Duration,
    ) -> impl FnOnce() -> BoxFuture<'static, Option<String>> + use<> {
        let calls = Arc::clone(calls);
        move || {
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::time::sleep(delay).await;
                Some(format!("table-{n}"))
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_fetches_share_one_read() {
        let cache = DeviceCache::new(Duration::from_millis(5000));
        let calls = Arc::new(AtomicUsize::new(0));

        let results = futures::future::join_all((0..10).map(|_| {
            let cache = cache.clone();
            let fetcher = counting_fetcher(&calls, Duration::from_millis(200));
            async move { cache.fetch("10.0.0.5", fetcher).await }
        }))
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|value| value.as_deref() == Some("table-1")));
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_boundary() {
        let cache = DeviceCache::new(Duration::from_millis(5000));
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .fetch("10.0.0.5", counting_fetcher(&calls, Duration::ZERO))
            .await;
        tokio::time::advance(Duration::from_millis(4999)).await;
        let cached = cache
            .fetch("10.0.0.5", counting_fetcher(&calls, Duration::ZERO))
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached.as_deref(), Some("table-1"));

        tokio::time::advance(Duration::from_millis(2)).await;
        let refreshed = cache
            .fetch("10.0.0.5", counting_fetcher(&calls, Duration::ZERO))
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(refreshed.as_deref(), Some("table-2"));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entry_with_pending_read_is_joined() {
        let cache = DeviceCache::new(Duration::from_millis(100));
        let calls = Arc::new(AtomicUsize::new(0));

        let slow = {
            let cache = cache.clone();
            let fetcher = counting_fetcher(&calls, Duration::from_millis(1000));
            tokio::spawn(async move { cache.fetch("10.0.0.5", fetcher).await })
        };
        tokio::time::sleep(Duration::from_millis(500)).await;

        let joined = cache
            .fetch("10.0.0.5", counting_fetcher(&calls, Duration::ZERO))
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(joined.as_deref(), Some("table-1"));
        assert_eq!(slow.await.expect("join").as_deref(), Some("table-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_read_is_cached_until_ttl() {
        let cache = DeviceCache::new(Duration::from_millis(5000));
        let calls = Arc::new(AtomicUsize::new(0));
        let failing = |calls: &Arc<AtomicUsize>| {
            let calls = Arc::clone(calls);
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                None::<String>
            }
        };

        assert!(cache.fetch("10.0.0.5", failing(&calls)).await.is_none());
        assert!(cache.fetch("10.0.0.5", failing(&calls)).await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.invalidate("10.0.0.5");
        assert!(cache.fetch("10.0.0.5", failing(&calls)).await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn blank_ip_never_fetches() {
        let cache = DeviceCache::new(Duration::from_millis(5000));
        let calls = Arc::new(AtomicUsize::new(0));
        assert!(
            cache
                .fetch("  ", counting_fetcher(&calls, Duration::ZERO))
                .await
                .is_none()
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use super::traits::{Bundle, BundleCache};
use crate::config::CacheConfig;
use crate::storage::Locale;

pub struct MokaBundleCache {
    inner: Cache<(String, Locale), Bundle>,
    epoch: AtomicU64,
}

impl MokaBundleCache {
    pub fn new(config: &CacheConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(config.translation_max_entries)
            .time_to_live(Duration::from_secs(config.translation_ttl_secs))
            .build();

        debug!(
            "Translation bundle cache: max {} entries, TTL {}s",
            config.translation_max_entries, config.translation_ttl_secs
        );
        Self {
            inner,
            epoch: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl BundleCache for MokaBundleCache {
    async fn get(&self, restaurant_id: &str, locale: Locale) -> Option<Bundle> {
        self.inner.get(&(restaurant_id.to_string(), locale)).await
    }

    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    async fn insert(&self, restaurant_id: &str, locale: Locale, epoch: u64, bundle: Bundle) {
        let key = (restaurant_id.to_string(), locale);
        self.inner.insert(key.clone(), bundle).await;
        // 先写后查，与 invalidate 的先递增后删除配对
        if self.epoch.load(Ordering::SeqCst) != epoch {
            self.inner.invalidate(&key).await;
            debug!("Dropped stale bundle for {} ({})", restaurant_id, locale);
        }
    }

    async fn invalidate(&self, restaurant_id: &str, locale: Locale) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.inner
            .invalidate(&(restaurant_id.to_string(), locale))
            .await;
    }

    async fn invalidate_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn bundle(pairs: &[(&str, &str)]) -> Bundle {
        Arc::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        )
    }

    #[tokio::test]
    async fn test_entries_are_keyed_by_restaurant_and_locale() {
        let cache = MokaBundleCache::new(&CacheConfig::default());
        cache
            .insert("r1", Locale::Th, cache.epoch(), bundle(&[("menu.title", "เมนู")]))
            .await;

        assert!(cache.get("r1", Locale::Th).await.is_some());
        assert!(cache.get("r1", Locale::En).await.is_none());
        assert!(cache.get("r2", Locale::Th).await.is_none());

        cache.invalidate("r1", Locale::Th).await;
        assert!(cache.get("r1", Locale::Th).await.is_none());
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let config = CacheConfig {
            translation_ttl_secs: 1,
            translation_max_entries: 10,
        };
        let cache = MokaBundleCache::new(&config);
        cache.insert("r1", Locale::En, cache.epoch(), bundle(&[])).await;
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(cache.get("r1", Locale::En).await.is_none());
    }

    #[tokio::test]
    async fn test_bundle_loaded_before_invalidation_is_not_cached() {
        let cache = MokaBundleCache::new(&CacheConfig::default());
        // 读者在发布前开始装载
        let epoch = cache.epoch();
        let stale = bundle(&[("menu.title", "old")]);

        // 发布并失效
        cache.invalidate("r1", Locale::En).await;

        // 读者随后写回旧包
        cache.insert("r1", Locale::En, epoch, stale).await;
        assert!(cache.get("r1", Locale::En).await.is_none());

        // 失效之后开始的装载可以正常写回
        let fresh = bundle(&[("menu.title", "new")]);
        cache.insert("r1", Locale::En, cache.epoch(), fresh).await;
        assert_eq!(
            cache.get("r1", Locale::En).await.unwrap()["menu.title"],
            "new"
        );
    }
}

use async_trait::async_trait;

use super::traits::{Bundle, BundleCache};
use crate::storage::Locale;

/// 不缓存（`cache.translation_ttl_secs = 0` 时使用）
pub struct NullBundleCache;

#[async_trait]
impl BundleCache for NullBundleCache {
    async fn get(&self, _restaurant_id: &str, _locale: Locale) -> Option<Bundle> {
        None
    }

    fn epoch(&self) -> u64 {
        0
    }

    async fn insert(&self, _restaurant_id: &str, _locale: Locale, _epoch: u64, _bundle: Bundle) {}

    async fn invalidate(&self, _restaurant_id: &str, _locale: Locale) {}

    async fn invalidate_all(&self) {}
}

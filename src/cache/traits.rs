use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::storage::Locale;

/// 已发布译文包：key -> value
pub type Bundle = Arc<HashMap<String, String>>;

/// 按 (restaurant_id, locale) 缓存的译文包
///
/// 读者在装载前取 [`epoch`](BundleCache::epoch)，写回时带上它；
/// 装载期间发生过失效，写回的旧包会被丢弃。
#[async_trait]
pub trait BundleCache: Send + Sync {
    async fn get(&self, restaurant_id: &str, locale: Locale) -> Option<Bundle>;
    /// 失效计数，每次 invalidate 后递增
    fn epoch(&self) -> u64;
    async fn insert(&self, restaurant_id: &str, locale: Locale, epoch: u64, bundle: Bundle);
    async fn invalidate(&self, restaurant_id: &str, locale: Locale);
    async fn invalidate_all(&self);
}

//! 译文包缓存

mod moka_cache;
mod null;
pub mod traits;

use std::sync::Arc;

pub use moka_cache::MokaBundleCache;
pub use null::NullBundleCache;
pub use traits::{Bundle, BundleCache};

use crate::config::CacheConfig;

pub fn build_bundle_cache(config: &CacheConfig) -> Arc<dyn BundleCache> {
    if config.translation_ttl_secs == 0 {
        Arc::new(NullBundleCache)
    } else {
        Arc::new(MokaBundleCache::new(config))
    }
}

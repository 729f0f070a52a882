use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::AppConfig;

static CONFIG: OnceLock<ArcSwap<AppConfig>> = OnceLock::new();

/// 获取全局配置
///
/// 返回 Arc，不持有锁；未调用 `init_config` 时（库与测试场景）使用默认配置。
pub fn get_config() -> Arc<AppConfig> {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(AppConfig::default()))
        .load_full()
}

/// 从 `path`（默认 `config.toml`）加载配置，再叠加 `SOP__*` 环境变量
pub fn init_config(path: Option<&str>) {
    let loaded = AppConfig::load(path);
    install_config(loaded);
}

/// 整体替换全局配置
pub fn install_config(config: AppConfig) {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(AppConfig::default()))
        .store(Arc::new(config));
}

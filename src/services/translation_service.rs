//! 翻译 key、译文工作流与已发布译文包
//!
//! 译文包只包含 `published` 状态的值，按 (restaurant, locale) 缓存；
//! 任何会改变已发布内容的写入都会使对应缓存失效。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use strum::IntoEnumIterator;
use tracing::debug;

use super::audit_service::{AuditEvent, AuditService, actions};
use super::context::Actor;
use crate::cache::{Bundle, BundleCache};
use crate::errors::{Result, SopError};
use crate::storage::{
    Locale, RestaurantScope, Role, SeaOrmStorage, Translation, TranslationHistoryEntry,
    TranslationKey, TranslationStatus,
};
use crate::utils::new_id;

pub const MAX_KEY_LENGTH: usize = 255;

#[derive(Debug, Clone, Default)]
pub struct KeyInput {
    pub key: String,
    pub category: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyDetail {
    #[serde(flatten)]
    pub key: TranslationKey,
    pub translations: Vec<Translation>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LocaleCoverage {
    pub locale: Locale,
    pub published: u64,
    pub total_keys: u64,
    pub percent: f64,
}

/// `^[a-z0-9_]+(\.[a-z0-9_]+)*$`
pub fn validate_key_name(key: &str) -> Result<String> {
    let key = key.trim();
    if key.is_empty() || key.len() > MAX_KEY_LENGTH {
        return Err(SopError::validation(format!(
            "Translation key must be 1..={} characters",
            MAX_KEY_LENGTH
        )));
    }
    let valid = key.split('.').all(|segment| {
        !segment.is_empty()
            && segment
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
    });
    if !valid {
        return Err(SopError::validation(format!(
            "Invalid translation key '{}': use dotted lowercase segments like menu.item_name",
            key
        )));
    }
    Ok(key.to_string())
}

fn normalize_category(category: &str) -> Result<String> {
    let category = category.trim().to_lowercase();
    if category.is_empty() {
        return Err(SopError::validation("Translation category is required"));
    }
    Ok(category)
}

/// 泰语缺失的 key 用英语补齐
pub fn merge_fallback(primary: &HashMap<String, String>, fallback: &HashMap<String, String>) -> HashMap<String, String> {
    let mut merged = primary.clone();
    for (key, value) in fallback {
        merged.entry(key.clone()).or_insert_with(|| value.clone());
    }
    merged
}

/// 各语言已发布数 / key 总数
pub async fn locale_coverage(
    storage: &SeaOrmStorage,
    scope: &RestaurantScope,
) -> Result<Vec<LocaleCoverage>> {
    let total_keys = storage.count_translation_keys(scope).await?;
    let mut coverage = Vec::new();
    for locale in Locale::iter() {
        let published = storage.count_published(scope, locale).await?;
        let percent = if total_keys == 0 {
            0.0
        } else {
            (published as f64 * 1000.0 / total_keys as f64).round() / 10.0
        };
        coverage.push(LocaleCoverage {
            locale,
            published,
            total_keys,
            percent,
        });
    }
    Ok(coverage)
}

pub struct TranslationService {
    storage: Arc<SeaOrmStorage>,
    audit: Arc<AuditService>,
    cache: Arc<dyn BundleCache>,
}

impl TranslationService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        audit: Arc<AuditService>,
        cache: Arc<dyn BundleCache>,
    ) -> Self {
        Self {
            storage,
            audit,
            cache,
        }
    }

    // ============ Keys ============

    pub async fn create_key(&self, actor: &Actor, input: KeyInput) -> Result<TranslationKey> {
        actor.require(Role::Manager)?;
        let key = TranslationKey {
            id: new_id(),
            restaurant_id: actor.scope.restaurant_id().to_string(),
            key: validate_key_name(&input.key)?,
            category: normalize_category(&input.category)?,
            description: input.description,
            created_at: Utc::now(),
        };
        self.storage
            .insert_translation_key(&actor.scope, &key)
            .await
            .map_err(|e| match e {
                SopError::Conflict(_) => {
                    SopError::conflict(format!("Translation key already exists: {}", key.key))
                }
                other => other,
            })?;
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::TRANSLATION_KEY_CREATED, "translation_key")
                    .resource(&key.id)
                    .by(actor)
                    .metadata(json!({ "key": key.key })),
            )
            .await;
        Ok(key)
    }

    pub async fn list_keys(
        &self,
        actor: &Actor,
        category: Option<&str>,
    ) -> Result<Vec<TranslationKey>> {
        actor.require(Role::Manager)?;
        let category = category.map(|c| c.trim().to_lowercase());
        self.storage
            .list_translation_keys(&actor.scope, category.as_deref())
            .await
    }

    async fn find_key(&self, actor: &Actor, id: &str) -> Result<TranslationKey> {
        self.storage
            .find_translation_key(&actor.scope, id)
            .await?
            .ok_or_else(|| SopError::not_found(format!("Translation key not found: {}", id)))
    }

    pub async fn get_key(&self, actor: &Actor, id: &str) -> Result<KeyDetail> {
        actor.require(Role::Manager)?;
        let key = self.find_key(actor, id).await?;
        let translations = self
            .storage
            .list_translations_for_key(&actor.scope, id)
            .await?;
        Ok(KeyDetail { key, translations })
    }

    /// 只允许修改分类和描述；key 名称不可变
    pub async fn update_key(
        &self,
        actor: &Actor,
        id: &str,
        category: Option<String>,
        description: Option<String>,
    ) -> Result<TranslationKey> {
        actor.require(Role::Manager)?;
        let mut key = self.find_key(actor, id).await?;
        if let Some(category) = category {
            key.category = normalize_category(&category)?;
        }
        if description.is_some() {
            key.description = description;
        }
        self.storage
            .update_translation_key(&actor.scope, &key)
            .await?;
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::TRANSLATION_KEY_UPDATED, "translation_key")
                    .resource(id)
                    .by(actor),
            )
            .await;
        Ok(key)
    }

    pub async fn delete_key(&self, actor: &Actor, id: &str) -> Result<()> {
        actor.require(Role::Manager)?;
        let key = self.find_key(actor, id).await?;
        self.storage
            .delete_translation_key(&actor.scope, id)
            .await?;
        for locale in Locale::iter() {
            self.cache
                .invalidate(actor.scope.restaurant_id(), locale)
                .await;
        }
        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::TRANSLATION_KEY_DELETED, "translation_key")
                    .resource(id)
                    .by(actor)
                    .metadata(json!({ "key": key.key })),
            )
            .await;
        Ok(())
    }

    // ============ Values ============

    /// 写入新值：状态回到 draft，版本号 +1
    pub async fn upsert(
        &self,
        actor: &Actor,
        key_id: &str,
        locale: Locale,
        value: &str,
    ) -> Result<Translation> {
        actor.require(Role::Manager)?;
        self.find_key(actor, key_id).await?;
        if value.trim().is_empty() {
            return Err(SopError::validation("Translation value must not be empty"));
        }

        let (translation, was_published) = self
            .storage
            .upsert_translation(
                &actor.scope,
                key_id,
                locale,
                value,
                &actor.staff_id,
                Utc::now(),
            )
            .await?;
        // 已发布的值被新草稿取代，译文包随之变化
        if was_published {
            self.cache
                .invalidate(actor.scope.restaurant_id(), locale)
                .await;
        }

        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::TRANSLATION_UPDATED, "translation")
                    .resource(&translation.id)
                    .by(actor)
                    .metadata(json!({ "locale": locale, "version": translation.version })),
            )
            .await;
        Ok(translation)
    }

    pub async fn get_translation(
        &self,
        actor: &Actor,
        key_id: &str,
        locale: Locale,
    ) -> Result<Translation> {
        actor.require(Role::Manager)?;
        self.storage
            .find_translation(&actor.scope, key_id, locale)
            .await?
            .ok_or_else(|| {
                SopError::not_found(format!("No {} translation for key {}", locale, key_id))
            })
    }

    pub async fn change_status(
        &self,
        actor: &Actor,
        key_id: &str,
        locale: Locale,
        next: TranslationStatus,
    ) -> Result<Translation> {
        let current = self.get_translation(actor, key_id, locale).await?;
        if !current.status.can_transition_to(next) {
            return Err(SopError::translation_transition(format!(
                "Cannot move translation from {} to {}",
                current.status, next
            )));
        }
        let previous = current.status;
        let translation = self
            .storage
            .transition_translation(
                &actor.scope,
                key_id,
                locale,
                previous,
                next,
                &actor.staff_id,
                Utc::now(),
            )
            .await?
            .ok_or_else(|| {
                SopError::translation_transition(format!(
                    "Translation is no longer {}; reload and retry",
                    previous
                ))
            })?;

        if next == TranslationStatus::Published {
            self.cache
                .invalidate(actor.scope.restaurant_id(), locale)
                .await;
            debug!(
                "Invalidated {} bundle for restaurant {}",
                locale,
                actor.scope.restaurant_id()
            );
        }

        self.audit
            .record(
                &actor.scope,
                AuditEvent::new(actions::TRANSLATION_STATUS_CHANGED, "translation")
                    .resource(&translation.id)
                    .by(actor)
                    .metadata(json!({ "locale": locale, "from": previous, "to": next })),
            )
            .await;
        Ok(translation)
    }

    pub async fn history(
        &self,
        actor: &Actor,
        key_id: &str,
        locale: Locale,
    ) -> Result<Vec<TranslationHistoryEntry>> {
        let translation = self.get_translation(actor, key_id, locale).await?;
        self.storage
            .list_translation_history(&actor.scope, &translation.id)
            .await
    }

    // ============ Bundles ============

    async fn published(&self, scope: &RestaurantScope, locale: Locale) -> Result<Bundle> {
        if let Some(bundle) = self.cache.get(scope.restaurant_id(), locale).await {
            return Ok(bundle);
        }
        let epoch = self.cache.epoch();
        let bundle: Bundle = Arc::new(self.storage.published_bundle(scope, locale).await?);
        self.cache
            .insert(scope.restaurant_id(), locale, epoch, bundle.clone())
            .await;
        Ok(bundle)
    }

    /// 任何已登录员工可读；`fallback` 时泰语缺失项用英语补齐
    pub async fn get_bundle(&self, actor: &Actor, locale: Locale, fallback: bool) -> Result<Bundle> {
        let bundle = self.published(&actor.scope, locale).await?;
        if fallback && locale == Locale::Th {
            let english = self.published(&actor.scope, Locale::En).await?;
            return Ok(Arc::new(merge_fallback(&bundle, &english)));
        }
        Ok(bundle)
    }

    pub async fn coverage(&self, actor: &Actor) -> Result<Vec<LocaleCoverage>> {
        actor.require(Role::Manager)?;
        locale_coverage(&self.storage, &actor.scope).await
    }
}

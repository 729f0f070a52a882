//! 翻译 key、译文与版本历史
//!
//! 每次写入译文（新值或状态变化）都在同一事务里追加一条历史记录。
//! 版本号与状态只用条件 UPDATE 原地修改，并发写入不会丢失版本。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, ExprTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::{Expr, OnConflict},
};

use super::{SeaOrmStorage, insert_if_absent};
use super::converters::{
    collect_models, model_to_history, model_to_translation, model_to_translation_key,
};
use crate::errors::{Result, SopError};
use crate::storage::models::{
    Locale, Translation, TranslationHistoryEntry, TranslationKey, TranslationStatus,
};
use crate::storage::scope::{RestaurantScope, scoped_delete, scoped_find, scoped_update};
use crate::utils::new_id;
use migration::entities::{translation, translation_history, translation_key};

fn translation_row(
    scope: &RestaurantScope,
    key_id: &str,
    locale: Locale,
) -> sea_orm::UpdateMany<translation::Entity> {
    scoped_update::<translation::Entity>(scope)
        .filter(translation::Column::KeyId.eq(key_id))
        .filter(translation::Column::Locale.eq(locale.as_ref()))
}

async fn find_translation_on<C: ConnectionTrait>(
    conn: &C,
    scope: &RestaurantScope,
    key_id: &str,
    locale: Locale,
) -> Result<Translation> {
    let model = scoped_find::<translation::Entity>(scope)
        .filter(translation::Column::KeyId.eq(key_id))
        .filter(translation::Column::Locale.eq(locale.as_ref()))
        .one(conn)
        .await?
        .ok_or_else(|| {
            SopError::not_found(format!("No {} translation for key {}", locale, key_id))
        })?;
    model_to_translation(model)
}

/// 历史记录是写入后状态的快照
fn history_model(scope: &RestaurantScope, t: &Translation) -> translation_history::ActiveModel {
    translation_history::ActiveModel {
        id: Default::default(),
        restaurant_id: Set(scope.restaurant_id().to_string()),
        translation_id: Set(t.id.clone()),
        version: Set(t.version),
        value: Set(t.value.clone()),
        status: Set(t.status.as_ref().to_string()),
        changed_by: Set(t.updated_by.clone()),
        changed_at: Set(t.updated_at),
    }
}

impl SeaOrmStorage {
    // ---- keys ----

    pub async fn insert_translation_key(
        &self,
        scope: &RestaurantScope,
        k: &TranslationKey,
    ) -> Result<()> {
        translation_key::ActiveModel {
            id: Set(k.id.clone()),
            restaurant_id: Set(scope.restaurant_id().to_string()),
            key_name: Set(k.key.clone()),
            category: Set(k.category.clone()),
            description: Set(k.description.clone()),
            created_at: Set(k.created_at),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    pub async fn find_translation_key(
        &self,
        scope: &RestaurantScope,
        id: &str,
    ) -> Result<Option<TranslationKey>> {
        let model = scoped_find::<translation_key::Entity>(scope)
            .filter(translation_key::Column::Id.eq(id))
            .one(&self.db)
            .await?;
        Ok(model.map(model_to_translation_key))
    }

    pub async fn list_translation_keys(
        &self,
        scope: &RestaurantScope,
        category: Option<&str>,
    ) -> Result<Vec<TranslationKey>> {
        let models = self
            .retrying("list_translation_keys", || async {
                let mut query = scoped_find::<translation_key::Entity>(scope);
                if let Some(category) = category {
                    query = query.filter(translation_key::Column::Category.eq(category));
                }
                query
                    .order_by_asc(translation_key::Column::KeyName)
                    .all(&self.db)
                    .await
            })
            .await?;
        Ok(models.into_iter().map(model_to_translation_key).collect())
    }

    pub async fn update_translation_key(
        &self,
        scope: &RestaurantScope,
        k: &TranslationKey,
    ) -> Result<()> {
        let changes = translation_key::ActiveModel {
            category: Set(k.category.clone()),
            description: Set(k.description.clone()),
            ..Default::default()
        };
        let result = scoped_update::<translation_key::Entity>(scope)
            .set(changes)
            .filter(translation_key::Column::Id.eq(&k.id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(SopError::not_found(format!(
                "Translation key not found: {}",
                k.id
            )));
        }
        Ok(())
    }

    pub async fn delete_translation_key(&self, scope: &RestaurantScope, id: &str) -> Result<()> {
        let result = scoped_delete::<translation_key::Entity>(scope)
            .filter(translation_key::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(SopError::not_found(format!(
                "Translation key not found: {}",
                id
            )));
        }
        Ok(())
    }

    // ---- values ----

    pub async fn find_translation(
        &self,
        scope: &RestaurantScope,
        key_id: &str,
        locale: Locale,
    ) -> Result<Option<Translation>> {
        let model = self
            .retrying("find_translation", || async {
                scoped_find::<translation::Entity>(scope)
                    .filter(translation::Column::KeyId.eq(key_id))
                    .filter(translation::Column::Locale.eq(locale.as_ref()))
                    .one(&self.db)
                    .await
            })
            .await?;
        model.map(model_to_translation).transpose()
    }

    pub async fn list_translations_for_key(
        &self,
        scope: &RestaurantScope,
        key_id: &str,
    ) -> Result<Vec<Translation>> {
        let models = scoped_find::<translation::Entity>(scope)
            .filter(translation::Column::KeyId.eq(key_id))
            .order_by_asc(translation::Column::Locale)
            .all(&self.db)
            .await?;
        collect_models(models, model_to_translation)
    }

    /// 写入新值：不存在时先插入 version 0 的占位行，再原地 version + 1 并回到 draft。
    /// 返回写入后的译文，以及写入前是否处于 published
    pub async fn upsert_translation(
        &self,
        scope: &RestaurantScope,
        key_id: &str,
        locale: Locale,
        value: &str,
        staff_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(Translation, bool)> {
        let txn = self.db.begin().await.map_err(|e| {
            SopError::database_operation(format!("Failed to begin transaction: {}", e))
        })?;

        let placeholder = translation::ActiveModel {
            id: Set(new_id()),
            restaurant_id: Set(scope.restaurant_id().to_string()),
            key_id: Set(key_id.to_string()),
            locale: Set(locale.as_ref().to_string()),
            value: Set(value.to_string()),
            status: Set(TranslationStatus::Draft.as_ref().to_string()),
            version: Set(0),
            updated_by: Set(Some(staff_id.to_string())),
            updated_at: Set(now),
        };
        let result = translation::Entity::insert(placeholder)
            .on_conflict(
                OnConflict::columns([translation::Column::KeyId, translation::Column::Locale])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&txn)
            .await;
        insert_if_absent(result)?;

        // 上面的写语句已拿到写锁，此处读到的状态不会被并发写覆盖
        let was_published = find_translation_on(&txn, scope, key_id, locale)
            .await?
            .status
            == TranslationStatus::Published;

        translation_row(scope, key_id, locale)
            .col_expr(translation::Column::Value, Expr::value(value))
            .col_expr(
                translation::Column::Status,
                Expr::value(TranslationStatus::Draft.as_ref()),
            )
            .col_expr(
                translation::Column::Version,
                Expr::col(translation::Column::Version).add(1),
            )
            .col_expr(translation::Column::UpdatedBy, Expr::value(staff_id))
            .col_expr(translation::Column::UpdatedAt, Expr::value(now))
            .exec(&txn)
            .await?;

        let saved = find_translation_on(&txn, scope, key_id, locale).await?;
        history_model(scope, &saved).insert(&txn).await?;

        txn.commit().await.map_err(|e| {
            SopError::database_operation(format!("Failed to commit transaction: {}", e))
        })?;
        Ok((saved, was_published))
    }

    /// 仅当当前状态仍为 `from` 时切换到 `to`；状态已被改动返回 None
    #[allow(clippy::too_many_arguments)]
    pub async fn transition_translation(
        &self,
        scope: &RestaurantScope,
        key_id: &str,
        locale: Locale,
        from: TranslationStatus,
        to: TranslationStatus,
        staff_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Translation>> {
        let txn = self.db.begin().await.map_err(|e| {
            SopError::database_operation(format!("Failed to begin transaction: {}", e))
        })?;

        let result = translation_row(scope, key_id, locale)
            .col_expr(translation::Column::Status, Expr::value(to.as_ref()))
            .col_expr(translation::Column::UpdatedBy, Expr::value(staff_id))
            .col_expr(translation::Column::UpdatedAt, Expr::value(now))
            .filter(translation::Column::Status.eq(from.as_ref()))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Ok(None);
        }

        let saved = find_translation_on(&txn, scope, key_id, locale).await?;
        history_model(scope, &saved).insert(&txn).await?;

        txn.commit().await.map_err(|e| {
            SopError::database_operation(format!("Failed to commit transaction: {}", e))
        })?;
        Ok(Some(saved))
    }

    /// 最新版本在前
    pub async fn list_translation_history(
        &self,
        scope: &RestaurantScope,
        translation_id: &str,
    ) -> Result<Vec<TranslationHistoryEntry>> {
        let models = scoped_find::<translation_history::Entity>(scope)
            .filter(translation_history::Column::TranslationId.eq(translation_id))
            .order_by_desc(translation_history::Column::Id)
            .all(&self.db)
            .await?;
        collect_models(models, model_to_history)
    }

    /// key -> 已发布译文
    pub async fn published_bundle(
        &self,
        scope: &RestaurantScope,
        locale: Locale,
    ) -> Result<HashMap<String, String>> {
        let keys: Vec<(String, String)> = scoped_find::<translation_key::Entity>(scope)
            .select_only()
            .column(translation_key::Column::Id)
            .column(translation_key::Column::KeyName)
            .into_tuple()
            .all(&self.db)
            .await?;
        let names: HashMap<String, String> = keys.into_iter().collect();

        let values: Vec<(String, String)> = scoped_find::<translation::Entity>(scope)
            .select_only()
            .column(translation::Column::KeyId)
            .column(translation::Column::Value)
            .filter(translation::Column::Locale.eq(locale.as_ref()))
            .filter(translation::Column::Status.eq(TranslationStatus::Published.as_ref()))
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(values
            .into_iter()
            .filter_map(|(key_id, value)| names.get(&key_id).map(|name| (name.clone(), value)))
            .collect())
    }

    pub async fn count_translation_keys(&self, scope: &RestaurantScope) -> Result<u64> {
        Ok(scoped_find::<translation_key::Entity>(scope)
            .count(&self.db)
            .await?)
    }

    pub async fn count_published(&self, scope: &RestaurantScope, locale: Locale) -> Result<u64> {
        Ok(scoped_find::<translation::Entity>(scope)
            .filter(translation::Column::Locale.eq(locale.as_ref()))
            .filter(translation::Column::Status.eq(TranslationStatus::Published.as_ref()))
            .count(&self.db)
            .await?)
    }
}

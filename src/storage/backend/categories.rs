use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::model_to_category;
use crate::errors::{Result, SopError};
use crate::storage::models::SopCategory;
use crate::storage::scope::{RestaurantScope, scoped_delete, scoped_find, scoped_update};
use migration::entities::{sop_category, sop_document};

impl SeaOrmStorage {
    pub async fn insert_category(&self, scope: &RestaurantScope, c: &SopCategory) -> Result<()> {
        let model = sop_category::ActiveModel {
            id: Set(c.id.clone()),
            restaurant_id: Set(scope.restaurant_id().to_string()),
            code: Set(c.code.clone()),
            name_en: Set(c.name_en.clone()),
            name_th: Set(c.name_th.clone()),
            description_en: Set(c.description_en.clone()),
            description_th: Set(c.description_th.clone()),
            sort_order: Set(c.sort_order),
            is_active: Set(c.is_active),
            created_at: Set(c.created_at),
        };
        model.insert(&self.db).await?;
        Ok(())
    }

    pub async fn find_category(
        &self,
        scope: &RestaurantScope,
        id: &str,
    ) -> Result<Option<SopCategory>> {
        let model = self
            .retrying("find_category", || async {
                scoped_find::<sop_category::Entity>(scope)
                    .filter(sop_category::Column::Id.eq(id))
                    .one(&self.db)
                    .await
            })
            .await?;
        Ok(model.map(model_to_category))
    }

    /// 按 sort_order、code 排序
    pub async fn list_categories(
        &self,
        scope: &RestaurantScope,
        include_inactive: bool,
    ) -> Result<Vec<SopCategory>> {
        let models = self
            .retrying("list_categories", || async {
                let mut query = scoped_find::<sop_category::Entity>(scope);
                if !include_inactive {
                    query = query.filter(sop_category::Column::IsActive.eq(true));
                }
                query
                    .order_by_asc(sop_category::Column::SortOrder)
                    .order_by_asc(sop_category::Column::Code)
                    .all(&self.db)
                    .await
            })
            .await?;
        Ok(models.into_iter().map(model_to_category).collect())
    }

    pub async fn update_category(&self, scope: &RestaurantScope, c: &SopCategory) -> Result<()> {
        let changes = sop_category::ActiveModel {
            code: Set(c.code.clone()),
            name_en: Set(c.name_en.clone()),
            name_th: Set(c.name_th.clone()),
            description_en: Set(c.description_en.clone()),
            description_th: Set(c.description_th.clone()),
            sort_order: Set(c.sort_order),
            is_active: Set(c.is_active),
            ..Default::default()
        };
        let result = scoped_update::<sop_category::Entity>(scope)
            .set(changes)
            .filter(sop_category::Column::Id.eq(&c.id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(SopError::not_found(format!("Category not found: {}", c.id)));
        }
        Ok(())
    }

    /// 仍有 SOP 文档引用时拒绝删除
    pub async fn delete_category(&self, scope: &RestaurantScope, id: &str) -> Result<()> {
        let in_use = scoped_find::<sop_document::Entity>(scope)
            .filter(sop_document::Column::CategoryId.eq(id))
            .count(&self.db)
            .await?;
        if in_use > 0 {
            return Err(SopError::conflict(format!(
                "Category {} still has {} SOP documents",
                id, in_use
            )));
        }

        let result = scoped_delete::<sop_category::Entity>(scope)
            .filter(sop_category::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(SopError::not_found(format!("Category not found: {}", id)));
        }
        info!("Category deleted: {}", id);
        Ok(())
    }
}

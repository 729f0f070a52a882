//! SOP 文档读写、分页过滤与统计

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, ExprTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, Func, LikeExpr},
};
use tracing::info;

use super::converters::{collect_models, model_to_sop};
use super::{SeaOrmStorage, like_pattern};
use crate::errors::{Result, SopError};
use crate::storage::models::{SopDocument, SopFilter, SopStatus};
use crate::storage::scope::{
    RestaurantScope, scoped_delete, scoped_find, scoped_update, tenant_condition,
};
use migration::entities::sop_document;

fn sop_to_active_model(doc: &SopDocument) -> Result<sop_document::ActiveModel> {
    Ok(sop_document::ActiveModel {
        category_id: Set(doc.category_id.clone()),
        title_en: Set(doc.title_en.clone()),
        title_th: Set(doc.title_th.clone()),
        content_en: Set(doc.content_en.clone()),
        content_th: Set(doc.content_th.clone()),
        steps: Set(serde_json::to_string(&doc.steps)?),
        tags: Set(serde_json::to_string(&doc.tags)?),
        status: Set(doc.status.as_ref().to_string()),
        version: Set(doc.version),
        updated_by: Set(doc.updated_by.clone()),
        approved_by: Set(doc.approved_by.clone()),
        approved_at: Set(doc.approved_at),
        updated_at: Set(doc.updated_at),
        ..Default::default()
    })
}

fn filter_condition(scope: &RestaurantScope, filter: &SopFilter) -> Condition {
    let mut condition = tenant_condition::<sop_document::Entity>(scope);

    if let Some(ref category_id) = filter.category_id {
        condition = condition.add(sop_document::Column::CategoryId.eq(category_id.as_str()));
    }

    if let Some(status) = filter.status {
        condition = condition.add(sop_document::Column::Status.eq(status.as_ref()));
    }

    // 中英文标题与正文，LOWER(col) LIKE '%term%'
    if let Some(ref search) = filter.search {
        let pattern = like_pattern(search);
        let mut any = Condition::any();
        for col in [
            sop_document::Column::TitleEn,
            sop_document::Column::TitleTh,
            sop_document::Column::ContentEn,
            sop_document::Column::ContentTh,
        ] {
            any = any.add(
                Expr::expr(Func::lower(Expr::col(col)))
                    .like(LikeExpr::new(pattern.as_str()).escape('\\')),
            );
        }
        condition = condition.add(any);
    }

    condition
}

impl SeaOrmStorage {
    pub async fn insert_sop(&self, scope: &RestaurantScope, doc: &SopDocument) -> Result<()> {
        let mut model = sop_to_active_model(doc)?;
        model.id = Set(doc.id.clone());
        model.restaurant_id = Set(scope.restaurant_id().to_string());
        model.created_by = Set(doc.created_by.clone());
        model.created_at = Set(doc.created_at);
        model.insert(&self.db).await?;
        info!("SOP created: {} (v{})", doc.id, doc.version);
        Ok(())
    }

    pub async fn find_sop(&self, scope: &RestaurantScope, id: &str) -> Result<Option<SopDocument>> {
        let model = self
            .retrying("find_sop", || async {
                scoped_find::<sop_document::Entity>(scope)
                    .filter(sop_document::Column::Id.eq(id))
                    .one(&self.db)
                    .await
            })
            .await?;
        model.map(model_to_sop).transpose()
    }

    pub async fn update_sop(&self, scope: &RestaurantScope, doc: &SopDocument) -> Result<()> {
        let result = scoped_update::<sop_document::Entity>(scope)
            .set(sop_to_active_model(doc)?)
            .filter(sop_document::Column::Id.eq(&doc.id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(SopError::not_found(format!("SOP not found: {}", doc.id)));
        }
        Ok(())
    }

    pub async fn delete_sop(&self, scope: &RestaurantScope, id: &str) -> Result<()> {
        let result = scoped_delete::<sop_document::Entity>(scope)
            .filter(sop_document::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(SopError::not_found(format!("SOP not found: {}", id)));
        }
        info!("SOP deleted: {}", id);
        Ok(())
    }

    /// 分页查询，返回 (当前页, 总数)；`page` 从 1 开始
    pub async fn list_sops(
        &self,
        scope: &RestaurantScope,
        filter: &SopFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<SopDocument>, u64)> {
        let condition = filter_condition(scope, filter);

        let total = self
            .retrying("list_sops(count)", || async {
                sop_document::Entity::find()
                    .filter(condition.clone())
                    .count(&self.db)
                    .await
            })
            .await?;

        let page_offset = page.saturating_sub(1);
        let models = self
            .retrying("list_sops(data)", || async {
                sop_document::Entity::find()
                    .filter(condition.clone())
                    .order_by_desc(sop_document::Column::UpdatedAt)
                    .order_by_asc(sop_document::Column::Id)
                    .paginate(&self.db, page_size)
                    .fetch_page(page_offset)
                    .await
            })
            .await?;

        Ok((collect_models(models, model_to_sop)?, total))
    }

    /// 各状态的文档数量（未出现的状态不返回）
    pub async fn count_sops_by_status(
        &self,
        scope: &RestaurantScope,
    ) -> Result<Vec<(SopStatus, u64)>> {
        let rows: Vec<(String, i64)> = scoped_find::<sop_document::Entity>(scope)
            .select_only()
            .column(sop_document::Column::Status)
            .column_as(sop_document::Column::Id.count(), "total")
            .group_by(sop_document::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|(status, total)| {
                let status = status.parse::<SopStatus>().map_err(|_| {
                    SopError::serialization(format!("Unknown SOP status in database: {}", status))
                })?;
                Ok((status, std::cmp::Ord::max(total, 0) as u64))
            })
            .collect()
    }

    /// 每个分类下的文档数量 (category_id, count)
    pub async fn count_sops_by_category(
        &self,
        scope: &RestaurantScope,
    ) -> Result<Vec<(String, u64)>> {
        let rows: Vec<(String, i64)> = scoped_find::<sop_document::Entity>(scope)
            .select_only()
            .column(sop_document::Column::CategoryId)
            .column_as(sop_document::Column::Id.count(), "total")
            .group_by(sop_document::Column::CategoryId)
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(category, total)| (category, std::cmp::Ord::max(total, 0) as u64))
            .collect())
    }
}

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};

use super::SeaOrmStorage;
use super::converters::model_to_audit;
use crate::errors::Result;
use crate::storage::models::{AuditEntry, AuditFilter};
use crate::storage::scope::{RestaurantScope, tenant_condition};
use migration::entities::audit_log;

impl SeaOrmStorage {
    /// 追加一条审计记录，`entry.id` 由数据库分配
    pub async fn insert_audit(&self, scope: &RestaurantScope, entry: &AuditEntry) -> Result<()> {
        let metadata = match &entry.metadata {
            Some(value) => Some(serde_json::to_string(value)?),
            None => None,
        };
        audit_log::ActiveModel {
            id: Default::default(),
            restaurant_id: Set(scope.restaurant_id().to_string()),
            staff_id: Set(entry.staff_id.clone()),
            action: Set(entry.action.clone()),
            resource_type: Set(entry.resource_type.clone()),
            resource_id: Set(entry.resource_id.clone()),
            metadata: Set(metadata),
            ip_address: Set(entry.ip_address.clone()),
            created_at: Set(entry.created_at),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    pub async fn list_audit(
        &self,
        scope: &RestaurantScope,
        filter: &AuditFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<AuditEntry>, u64)> {
        let mut condition: Condition = tenant_condition::<audit_log::Entity>(scope);
        if let Some(ref action) = filter.action {
            condition = condition.add(audit_log::Column::Action.eq(action.as_str()));
        }
        if let Some(ref staff_id) = filter.staff_id {
            condition = condition.add(audit_log::Column::StaffId.eq(staff_id.as_str()));
        }
        if let Some(from) = filter.from {
            condition = condition.add(audit_log::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            condition = condition.add(audit_log::Column::CreatedAt.lte(to));
        }

        let total = self
            .retrying("list_audit(count)", || async {
                audit_log::Entity::find()
                    .filter(condition.clone())
                    .count(&self.db)
                    .await
            })
            .await?;

        let models = self
            .retrying("list_audit(data)", || async {
                audit_log::Entity::find()
                    .filter(condition.clone())
                    .order_by_desc(audit_log::Column::Id)
                    .paginate(&self.db, page_size)
                    .fetch_page(page.saturating_sub(1))
                    .await
            })
            .await?;

        Ok((models.into_iter().map(model_to_audit).collect(), total))
    }
}

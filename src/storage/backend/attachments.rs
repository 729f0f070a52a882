use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, QueryFilter, QueryOrder};

use super::SeaOrmStorage;
use super::converters::model_to_attachment;
use crate::errors::{Result, SopError};
use crate::storage::models::SopAttachment;
use crate::storage::scope::{RestaurantScope, scoped_delete, scoped_find};
use migration::entities::sop_attachment;

impl SeaOrmStorage {
    pub async fn insert_attachment(
        &self,
        scope: &RestaurantScope,
        a: &SopAttachment,
    ) -> Result<()> {
        let model = sop_attachment::ActiveModel {
            id: Set(a.id.clone()),
            restaurant_id: Set(scope.restaurant_id().to_string()),
            sop_id: Set(a.sop_id.clone()),
            file_name: Set(a.file_name.clone()),
            content_type: Set(a.content_type.clone()),
            size_bytes: Set(a.size_bytes as i64),
            storage_key: Set(a.storage_key.clone()),
            uploaded_by: Set(a.uploaded_by.clone()),
            created_at: Set(a.created_at),
        };
        model.insert(&self.db).await?;
        Ok(())
    }

    pub async fn find_attachment(
        &self,
        scope: &RestaurantScope,
        sop_id: &str,
        id: &str,
    ) -> Result<Option<SopAttachment>> {
        let model = self
            .retrying("find_attachment", || async {
                scoped_find::<sop_attachment::Entity>(scope)
                    .filter(sop_attachment::Column::SopId.eq(sop_id))
                    .filter(sop_attachment::Column::Id.eq(id))
                    .one(&self.db)
                    .await
            })
            .await?;
        Ok(model.map(model_to_attachment))
    }

    pub async fn list_attachments(
        &self,
        scope: &RestaurantScope,
        sop_id: &str,
    ) -> Result<Vec<SopAttachment>> {
        let models = self
            .retrying("list_attachments", || async {
                scoped_find::<sop_attachment::Entity>(scope)
                    .filter(sop_attachment::Column::SopId.eq(sop_id))
                    .order_by_asc(sop_attachment::Column::CreatedAt)
                    .all(&self.db)
                    .await
            })
            .await?;
        Ok(models.into_iter().map(model_to_attachment).collect())
    }

    pub async fn delete_attachment(&self, scope: &RestaurantScope, id: &str) -> Result<()> {
        let result = scoped_delete::<sop_attachment::Entity>(scope)
            .filter(sop_attachment::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(SopError::not_found(format!("Attachment not found: {}", id)));
        }
        Ok(())
    }
}

//! 餐厅（租户）本身不属于任何 scope，只由可信系统代码访问：
//! bootstrap 命令与登录时的存在性检查。

use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, QueryOrder};

use super::SeaOrmStorage;
use super::converters::model_to_restaurant;
use crate::errors::Result;
use crate::storage::models::Restaurant;
use migration::entities::restaurant;

impl SeaOrmStorage {
    pub async fn insert_restaurant(&self, r: &Restaurant) -> Result<()> {
        let model = restaurant::ActiveModel {
            id: Set(r.id.clone()),
            name: Set(r.name.clone()),
            name_th: Set(r.name_th.clone()),
            timezone: Set(r.timezone.clone()),
            is_active: Set(r.is_active),
            created_at: Set(r.created_at),
        };
        model.insert(&self.db).await?;
        Ok(())
    }

    pub async fn find_restaurant(&self, id: &str) -> Result<Option<Restaurant>> {
        let model = self
            .retrying("find_restaurant", || async {
                restaurant::Entity::find_by_id(id.to_string())
                    .one(&self.db)
                    .await
            })
            .await?;
        Ok(model.map(model_to_restaurant))
    }

    pub async fn list_restaurants(&self) -> Result<Vec<Restaurant>> {
        let models = self
            .retrying("list_restaurants", || async {
                restaurant::Entity::find()
                    .order_by_asc(restaurant::Column::CreatedAt)
                    .all(&self.db)
                    .await
            })
            .await?;
        Ok(models.into_iter().map(model_to_restaurant).collect())
    }
}

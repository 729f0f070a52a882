use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "sop_documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub restaurant_id: String,
    pub category_id: String,
    pub title_en: String,
    pub title_th: String,
    #[sea_orm(column_type = "Text")]
    pub content_en: String,
    #[sea_orm(column_type = "Text")]
    pub content_th: String,
    /// JSON 数组：`[{order, text_en, text_th}]`
    #[sea_orm(column_type = "Text")]
    pub steps: String,
    /// JSON 字符串数组
    #[sea_orm(column_type = "Text")]
    pub tags: String,
    pub status: String,
    pub version: i32,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "training_modules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub restaurant_id: String,
    pub sop_id: Option<String>,
    pub title_en: String,
    pub title_th: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description_en: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description_th: Option<String>,
    /// JSON 数组：`[{prompt_en, prompt_th, options: [{text_en, text_th}], correct_index}]`
    #[sea_orm(column_type = "Text")]
    pub questions: String,
    pub passing_score: i32,
    pub duration_minutes: i32,
    pub certificate_valid_days: i32,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! 餐厅（租户）行隔离
//!
//! 每个租户表通过 [`TenantScoped`] 声明自己的 `restaurant_id` 列。
//! 存储层不直接调用 `Entity::find()`，一律经由 [`scoped_find`]、[`scoped_update`]
//! 或 [`scoped_delete`]，租户条件总在 SQL 里。

use sea_orm::{ColumnTrait, Condition, DeleteMany, EntityTrait, QueryFilter, Select, UpdateMany};

use migration::entities::{
    audit_log, sop_attachment, sop_category, sop_document, staff, training_certificate,
    training_module, training_progress, translation, translation_history, translation_key,
};

/// 当前请求可访问的租户
///
/// 由已认证的会话（见 `api::extractors`）或可信的系统代码（如 bootstrap 命令）构造。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RestaurantScope {
    restaurant_id: String,
}

impl RestaurantScope {
    pub fn new(restaurant_id: impl Into<String>) -> Self {
        Self {
            restaurant_id: restaurant_id.into(),
        }
    }

    pub fn restaurant_id(&self) -> &str {
        &self.restaurant_id
    }
}

/// 每行只属于一家餐厅的实体
pub trait TenantScoped: EntityTrait {
    fn tenant_col() -> Self::Column;
}

/// `restaurant_id = scope` 的 SeaORM 条件
pub fn tenant_condition<E>(scope: &RestaurantScope) -> Condition
where
    E: TenantScoped,
    E::Column: ColumnTrait,
{
    Condition::all().add(E::tenant_col().eq(scope.restaurant_id()))
}

/// `SELECT ... WHERE restaurant_id = scope`
pub fn scoped_find<E>(scope: &RestaurantScope) -> Select<E>
where
    E: TenantScoped,
    E::Column: ColumnTrait,
{
    E::find().filter(tenant_condition::<E>(scope))
}

/// `UPDATE ... WHERE restaurant_id = scope`
pub fn scoped_update<E>(scope: &RestaurantScope) -> UpdateMany<E>
where
    E: TenantScoped,
    E::Column: ColumnTrait,
{
    E::update_many().filter(tenant_condition::<E>(scope))
}

/// `DELETE ... WHERE restaurant_id = scope`
pub fn scoped_delete<E>(scope: &RestaurantScope) -> DeleteMany<E>
where
    E: TenantScoped,
    E::Column: ColumnTrait,
{
    E::delete_many().filter(tenant_condition::<E>(scope))
}

macro_rules! tenant_scoped {
    ($($module:ident),+ $(,)?) => {
        $(
            impl TenantScoped for $module::Entity {
                fn tenant_col() -> Self::Column {
                    $module::Column::RestaurantId
                }
            }
        )+
    };
}

tenant_scoped!(
    staff,
    sop_category,
    sop_document,
    sop_attachment,
    training_module,
    training_progress,
    training_certificate,
    translation_key,
    translation,
    translation_history,
    audit_log,
);

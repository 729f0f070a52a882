pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20260301_000001_tenancy_tables;
mod m20260301_000002_sop_tables;
mod m20260302_000001_training_tables;
mod m20260303_000001_translation_audit_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_tenancy_tables::Migration),
            Box::new(m20260301_000002_sop_tables::Migration),
            Box::new(m20260302_000001_training_tables::Migration),
            Box::new(m20260303_000001_translation_audit_tables::Migration),
        ]
    }
}

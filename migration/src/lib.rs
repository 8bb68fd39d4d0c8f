pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_identity_tables;
mod m20250301_000002_create_profile_tables;
mod m20250301_000003_create_project_tables;
mod m20250301_000004_create_admin_code;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_identity_tables::Migration),
            Box::new(m20250301_000002_create_profile_tables::Migration),
            Box::new(m20250301_000003_create_project_tables::Migration),
            Box::new(m20250301_000004_create_admin_code::Migration),
        ]
    }
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdminCode::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdminCode::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AdminCode::AccessCode).string().not_null())
                    .col(
                        ColumnDef::new(AdminCode::Theme)
                            .string()
                            .not_null()
                            .default("default"),
                    )
                    .col(
                        ColumnDef::new(AdminCode::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdminCode::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AdminCode {
    Table,
    Id,
    AccessCode,
    Theme,
    UpdatedAt,
}

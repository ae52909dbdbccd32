use sea_orm_migration::prelude::*;

use super::m20250601_000004_create_variant_types_table::VariantTypes;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250601_000005_create_variant_values_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VariantValues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VariantValues::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VariantValues::VariantTypeId).uuid().not_null())
                    .col(
                        ColumnDef::new(VariantValues::Value)
                            .string_len(64)
                            .not_null(),
                    )
                    // Type slug, "--", value slug; each part up to twice its name.
                    .col(
                        ColumnDef::new(VariantValues::Slug)
                            .string_len(260)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(VariantValues::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(VariantValues::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_variant_values_variant_type_id")
                            .from(VariantValues::Table, VariantValues::VariantTypeId)
                            .to(VariantTypes::Table, VariantTypes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_variant_values_variant_type_id")
                    .table(VariantValues::Table)
                    .col(VariantValues::VariantTypeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VariantValues::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum VariantValues {
    Table,
    Id,
    VariantTypeId,
    Value,
    Slug,
    CreatedAt,
    UpdatedAt,
}

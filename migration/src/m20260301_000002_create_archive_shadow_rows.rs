// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ArchiveShadowRows::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ArchiveShadowRows::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ArchiveShadowRows::RecordId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArchiveShadowRows::CorrelationId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArchiveShadowRows::DataType)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArchiveShadowRows::ArchiveAddress)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ArchiveShadowRows::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ArchiveShadowRows::UploadedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // One shadow row per (data_type, record_id)
        manager
            .create_index(
                Index::create()
                    .name("uq_archive_shadow_rows_type_record")
                    .table(ArchiveShadowRows::Table)
                    .col(ArchiveShadowRows::DataType)
                    .col(ArchiveShadowRows::RecordId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_archive_shadow_rows_address")
                    .table(ArchiveShadowRows::Table)
                    .col(ArchiveShadowRows::ArchiveAddress)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ArchiveShadowRows::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ArchiveShadowRows {
    Table,
    Id,
    RecordId,
    CorrelationId,
    DataType,
    ArchiveAddress,
    CreatedAt,
    UploadedAt,
}

//! 核心表迁移
//!
//! 创建 wa_groups 与 whatsapp_numbers 表：
//! - wa_groups: 分发渠道（slug 全局唯一）
//! - whatsapp_numbers: 号码池，last_used_at 作为轮换游标

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 wa_groups 表
        manager
            .create_table(
                Table::create()
                    .table(WaGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WaGroups::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WaGroups::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(WaGroups::Name).string_len(255).not_null())
                    .col(ColumnDef::new(WaGroups::Slug).string_len(255).not_null())
                    .col(ColumnDef::new(WaGroups::DefaultMessage).text().null())
                    .col(
                        ColumnDef::new(WaGroups::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(WaGroups::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaGroups::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // slug 是唯一的公共查找键
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("idx_wa_groups_slug")
                    .table(WaGroups::Table)
                    .col(WaGroups::Slug)
                    .to_owned(),
            )
            .await?;

        // 租户列表查询索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_wa_groups_company")
                    .table(WaGroups::Table)
                    .col(WaGroups::CompanyId)
                    .to_owned(),
            )
            .await?;

        // 创建 whatsapp_numbers 表
        manager
            .create_table(
                Table::create()
                    .table(WhatsappNumbers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WhatsappNumbers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WhatsappNumbers::CompanyId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WhatsappNumbers::GroupId).uuid().not_null())
                    .col(
                        ColumnDef::new(WhatsappNumbers::Phone)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(WhatsappNumbers::Name).string_len(255).null())
                    .col(ColumnDef::new(WhatsappNumbers::CustomMessage).text().null())
                    .col(
                        ColumnDef::new(WhatsappNumbers::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(WhatsappNumbers::LastUsedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WhatsappNumbers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WhatsappNumbers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 轮换选择路径的复合索引：按组取活跃号码并按 last_used_at 排序
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_numbers_rotation")
                    .table(WhatsappNumbers::Table)
                    .col(WhatsappNumbers::GroupId)
                    .col(WhatsappNumbers::IsActive)
                    .col(WhatsappNumbers::LastUsedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_numbers_company")
                    .table(WhatsappNumbers::Table)
                    .col(WhatsappNumbers::CompanyId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_numbers_company").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_numbers_rotation").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WhatsappNumbers::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_wa_groups_company").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_wa_groups_slug").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WaGroups::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WaGroups {
    #[sea_orm(iden = "wa_groups")]
    Table,
    Id,
    CompanyId,
    Name,
    Slug,
    DefaultMessage,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum WhatsappNumbers {
    #[sea_orm(iden = "whatsapp_numbers")]
    Table,
    Id,
    CompanyId,
    GroupId,
    Phone,
    Name,
    CustomMessage,
    IsActive,
    LastUsedAt,
    CreatedAt,
    UpdatedAt,
}

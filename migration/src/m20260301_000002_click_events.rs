//! 点击事件表迁移
//!
//! 创建 click_events 表：每次分发决策写入一条不可变记录，
//! 供租户侧报表查询（本服务只追加，不更新不删除）。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClickEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClickEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClickEvents::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(ClickEvents::GroupId).uuid().not_null())
                    .col(ColumnDef::new(ClickEvents::NumberId).uuid().not_null())
                    .col(ColumnDef::new(ClickEvents::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(ClickEvents::UserAgent).text().null())
                    .col(
                        ColumnDef::new(ClickEvents::DeviceType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ClickEvents::Browser).string_len(64).null())
                    .col(ColumnDef::new(ClickEvents::Os).string_len(64).null())
                    .col(ColumnDef::new(ClickEvents::Referrer).text().null())
                    .col(ColumnDef::new(ClickEvents::UtmSource).string_len(255).null())
                    .col(ColumnDef::new(ClickEvents::UtmMedium).string_len(255).null())
                    .col(
                        ColumnDef::new(ClickEvents::UtmCampaign)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 单组时间序列查询索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_events_group_time")
                    .table(ClickEvents::Table)
                    .col(ClickEvents::GroupId)
                    .col(ClickEvents::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // 租户范围报表索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_events_company_time")
                    .table(ClickEvents::Table)
                    .col(ClickEvents::CompanyId)
                    .col(ClickEvents::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_click_events_company_time")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("idx_click_events_group_time").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ClickEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ClickEvents {
    #[sea_orm(iden = "click_events")]
    Table,
    Id,
    CompanyId,
    GroupId,
    NumberId,
    IpAddress,
    UserAgent,
    DeviceType,
    Browser,
    Os,
    Referrer,
    UtmSource,
    UtmMedium,
    UtmCampaign,
    CreatedAt,
}

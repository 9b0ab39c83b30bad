//! 点击回调记录表迁移
//!
//! 每次受访者经由跳转链接回到平台时写入一行，记录：
//! - 问卷 ID（可选，能解析到时才有）
//! - uid / pid
//! - IP 地址
//! - 结果状态 (complete / terminate / quota_full)
//! - 原始查询参数 (JSON)

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SurveyClicks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SurveyClicks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SurveyClicks::SurveyId).string_len(36).null())
                    .col(
                        ColumnDef::new(SurveyClicks::UserId)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(SurveyClicks::ProjectId)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(SurveyClicks::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(SurveyClicks::Status).string_len(16).not_null())
                    .col(ColumnDef::new(SurveyClicks::RawData).text().not_null())
                    .col(
                        ColumnDef::new(SurveyClicks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 报表按状态 + 时间查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_survey_clicks_status_time")
                    .table(SurveyClicks::Table)
                    .col(SurveyClicks::Status)
                    .col(SurveyClicks::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // 仪表盘按时间窗口统计
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_survey_clicks_created_at")
                    .table(SurveyClicks::Table)
                    .col(SurveyClicks::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // 单问卷统计
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_survey_clicks_survey")
                    .table(SurveyClicks::Table)
                    .col(SurveyClicks::SurveyId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_survey_clicks_survey").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_survey_clicks_created_at").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_survey_clicks_status_time").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(SurveyClicks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SurveyClicks {
    #[sea_orm(iden = "survey_clicks")]
    Table,
    Id,
    SurveyId,
    UserId,
    ProjectId,
    IpAddress,
    Status,
    RawData,
    CreatedAt,
}

//! 问卷与答卷表迁移
//!
//! - surveys: 问卷定义 + 配额计数
//! - survey_submissions: 受访者提交的答卷

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 surveys 表
        manager
            .create_table(
                Table::create()
                    .table(Surveys::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Surveys::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Surveys::SurveyName).string().not_null())
                    .col(
                        ColumnDef::new(Surveys::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Surveys::ProjectIdFromClient)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Surveys::ProjectIdFromInter)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Surveys::Questions).text().not_null())
                    .col(ColumnDef::new(Surveys::RedirectUrl).text().not_null())
                    .col(
                        ColumnDef::new(Surveys::MaxResponses)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Surveys::ResponseCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Surveys::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Surveys::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Surveys::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建时间索引（列表默认按创建时间排序）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_surveys_created_at")
                    .table(Surveys::Table)
                    .col(Surveys::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // 点击回调通过 pid 反查问卷
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_surveys_project_inter")
                    .table(Surveys::Table)
                    .col(Surveys::ProjectIdFromInter)
                    .to_owned(),
            )
            .await?;

        // 创建 survey_submissions 表
        manager
            .create_table(
                Table::create()
                    .table(SurveySubmissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SurveySubmissions::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SurveySubmissions::SurveyId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SurveySubmissions::Responses)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SurveySubmissions::IpAddress)
                            .string_len(45)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SurveySubmissions::SubmittedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_submissions_survey_time")
                    .table(SurveySubmissions::Table)
                    .col(SurveySubmissions::SurveyId)
                    .col(SurveySubmissions::SubmittedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_submissions_survey_time").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(SurveySubmissions::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_surveys_project_inter").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_surveys_created_at").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Surveys::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Surveys {
    #[sea_orm(iden = "surveys")]
    Table,
    Id,
    SurveyName,
    Description,
    ProjectIdFromClient,
    ProjectIdFromInter,
    Questions,
    RedirectUrl,
    MaxResponses,
    ResponseCount,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SurveySubmissions {
    #[sea_orm(iden = "survey_submissions")]
    Table,
    Id,
    SurveyId,
    Responses,
    IpAddress,
    SubmittedAt,
}

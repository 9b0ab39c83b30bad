use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 survey_links 表（跳转链接）
        manager
            .create_table(
                Table::create()
                    .table(SurveyLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SurveyLinks::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SurveyLinks::Name).string().not_null())
                    .col(ColumnDef::new(SurveyLinks::Url).text().not_null())
                    .col(ColumnDef::new(SurveyLinks::Parameters).text().not_null())
                    .col(ColumnDef::new(SurveyLinks::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(SurveyLinks::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(SurveyLinks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SurveyLinks::UpdatedAt)
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
                    .name("idx_survey_links_created_at")
                    .table(SurveyLinks::Table)
                    .col(SurveyLinks::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_survey_links_created_at").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(SurveyLinks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SurveyLinks {
    #[sea_orm(iden = "survey_links")]
    Table,
    Id,
    Name,
    Url,
    Parameters,
    Status,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

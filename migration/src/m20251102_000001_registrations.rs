//! 面板注册 + 邮箱 OTP 表迁移

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 registrations 表
        manager
            .create_table(
                Table::create()
                    .table(Registrations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Registrations::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Registrations::FullName).string().not_null())
                    .col(
                        ColumnDef::new(Registrations::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Registrations::Age).string_len(32).not_null())
                    .col(ColumnDef::new(Registrations::Gender).string_len(32).not_null())
                    .col(ColumnDef::new(Registrations::Location).string().not_null())
                    .col(ColumnDef::new(Registrations::Profile).text().not_null())
                    .col(
                        ColumnDef::new(Registrations::EmailVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Registrations::CreatedAt)
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
                    .name("idx_registrations_created_at")
                    .table(Registrations::Table)
                    .col(Registrations::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // 创建 otp_codes 表
        manager
            .create_table(
                Table::create()
                    .table(OtpCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OtpCodes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OtpCodes::Email).string().not_null())
                    .col(ColumnDef::new(OtpCodes::CodeHash).string().not_null())
                    .col(
                        ColumnDef::new(OtpCodes::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OtpCodes::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(OtpCodes::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OtpCodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OtpCodes::VerifiedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 按邮箱取最新验证码
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_otp_codes_email_time")
                    .table(OtpCodes::Table)
                    .col(OtpCodes::Email)
                    .col(OtpCodes::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_otp_codes_email_time").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(OtpCodes::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_registrations_created_at").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Registrations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Registrations {
    #[sea_orm(iden = "registrations")]
    Table,
    Id,
    FullName,
    Email,
    Age,
    Gender,
    Location,
    Profile,
    EmailVerified,
    CreatedAt,
}

#[derive(DeriveIden)]
enum OtpCodes {
    #[sea_orm(iden = "otp_codes")]
    Table,
    Id,
    Email,
    CodeHash,
    Attempts,
    Verified,
    ExpiresAt,
    CreatedAt,
    VerifiedAt,
}

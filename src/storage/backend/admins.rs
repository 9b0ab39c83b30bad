use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, SqlErr};
use tracing::info;

use super::converters::model_to_admin;
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, SurveyhubError};
use crate::storage::models::Admin;

use migration::entities::admin;

impl SeaOrmStorage {
    pub async fn count_admins(&self) -> Result<u64> {
        let db = &self.db;
        retry::with_retry("count_admins", self.retry_config, || async {
            admin::Entity::find().count(db).await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("统计管理员失败: {}", e)))
    }

    pub async fn find_admin_by_username(&self, username: &str) -> Result<Option<Admin>> {
        let db = &self.db;
        let model = retry::with_retry("find_admin_by_username", self.retry_config, || async {
            admin::Entity::find()
                .filter(admin::Column::Username.eq(username))
                .one(db)
                .await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("查询管理员失败: {}", e)))?;

        Ok(model.map(model_to_admin))
    }

    pub async fn get_admin(&self, id: &str) -> Result<Option<Admin>> {
        let db = &self.db;
        let model = retry::with_retry("get_admin", self.retry_config, || async {
            admin::Entity::find_by_id(id).one(db).await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("查询管理员失败: {}", e)))?;

        Ok(model.map(model_to_admin))
    }

    pub async fn insert_admin(&self, admin: &Admin) -> Result<()> {
        let model = admin::ActiveModel {
            id: sea_orm::ActiveValue::Set(admin.id.clone()),
            username: sea_orm::ActiveValue::Set(admin.username.clone()),
            password_hash: sea_orm::ActiveValue::Set(admin.password_hash.clone()),
            created_at: sea_orm::ActiveValue::Set(admin.created_at),
            updated_at: sea_orm::ActiveValue::Set(admin.updated_at),
        };

        if let Err(e) = admin::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await
        {
            return Err(match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    SurveyhubError::conflict(format!("管理员已存在: {}", admin.username))
                }
                _ => SurveyhubError::database_operation(format!("创建管理员失败: {}", e)),
            });
        }

        info!("Admin created: {}", admin.username);
        Ok(())
    }

    pub async fn update_admin_password(&self, id: &str, password_hash: &str) -> Result<()> {
        let db = &self.db;
        let result = retry::with_retry("update_admin_password", self.retry_config, || async {
            admin::Entity::update_many()
                .col_expr(admin::Column::PasswordHash, Expr::value(password_hash))
                .col_expr(admin::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(admin::Column::Id.eq(id))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("更新管理员密码失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(SurveyhubError::not_found(format!("管理员不存在: {}", id)));
        }
        Ok(())
    }
}

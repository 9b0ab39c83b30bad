//! Panel registrations

use sea_orm::{
    ColumnTrait, Condition, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, SqlErr,
};
use tracing::info;

use super::converters::{model_to_registration, registration_to_active_model};
use super::surveys::order_of;
use super::{SeaOrmStorage, ilike, retry, search_term};
use crate::errors::{Result, SurveyhubError};
use crate::storage::models::{ListQuery, Registration, RegistrationSortField};

use migration::entities::registration;

fn filtered_query(search: &Option<String>) -> Select<registration::Entity> {
    let mut query = registration::Entity::find();
    if let Some(term) = search_term(search) {
        query = query.filter(
            Condition::any()
                .add(ilike(registration::Column::FullName, &term))
                .add(ilike(registration::Column::Email, &term))
                .add(ilike(registration::Column::Location, &term)),
        );
    }
    query
}

fn sort_column(field: RegistrationSortField) -> registration::Column {
    match field {
        RegistrationSortField::CreatedAt => registration::Column::CreatedAt,
        RegistrationSortField::FullName => registration::Column::FullName,
        RegistrationSortField::Email => registration::Column::Email,
        RegistrationSortField::Age => registration::Column::Age,
    }
}

impl SeaOrmStorage {
    /// 写入注册；邮箱唯一约束冲突返回 Conflict
    pub async fn insert_registration(&self, reg: &Registration) -> Result<()> {
        let model = registration_to_active_model(reg);

        if let Err(e) = registration::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await
        {
            return Err(match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    SurveyhubError::conflict(format!("邮箱已注册: {}", reg.email))
                }
                _ => SurveyhubError::database_operation(format!("保存注册信息失败: {}", e)),
            });
        }

        self.invalidate_count_cache();
        info!("Registration stored: {}", reg.id);
        Ok(())
    }

    pub async fn get_registration(&self, id: &str) -> Result<Option<Registration>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("get_registration({})", id), self.retry_config, || async {
            registration::Entity::find_by_id(id).one(db).await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("查询注册信息失败: {}", e)))?;

        Ok(model.map(model_to_registration))
    }

    pub async fn registration_email_exists(&self, email: &str) -> Result<bool> {
        let db = &self.db;
        let count = retry::with_retry("registration_email_exists", self.retry_config, || async {
            registration::Entity::find()
                .filter(registration::Column::Email.eq(email))
                .count(db)
                .await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("查询注册信息失败: {}", e)))?;

        Ok(count > 0)
    }

    pub async fn list_registrations(
        &self,
        query: &ListQuery<RegistrationSortField>,
    ) -> Result<(Vec<Registration>, u64)> {
        let db = &self.db;
        let cache_key = format!(
            "registrations:{}",
            search_term(&query.search).unwrap_or_default()
        );

        let total = self
            .cached_count(cache_key, || async {
                filtered_query(&query.search).count(db).await
            })
            .await
            .map_err(|e| SurveyhubError::database_operation(format!("统计注册信息失败: {}", e)))?;

        let page_query = filtered_query(&query.search)
            .order_by(sort_column(query.sort_by), order_of(query.sort_order))
            .order_by(registration::Column::Id, Order::Asc);

        let models = retry::with_retry("list_registrations", self.retry_config, || async {
            page_query
                .clone()
                .paginate(db, query.limit)
                .fetch_page(query.page.saturating_sub(1))
                .await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("查询注册列表失败: {}", e)))?;

        Ok((models.into_iter().map(model_to_registration).collect(), total))
    }

    /// 导出用：最新在前，最多 `limit` 条
    pub async fn export_registrations(
        &self,
        search: &Option<String>,
        limit: u64,
    ) -> Result<Vec<Registration>> {
        let db = &self.db;
        let models = retry::with_retry("export_registrations", self.retry_config, || async {
            filtered_query(search)
                .order_by(registration::Column::CreatedAt, Order::Desc)
                .limit(limit)
                .all(db)
                .await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("导出注册信息失败: {}", e)))?;

        Ok(models.into_iter().map(model_to_registration).collect())
    }
}

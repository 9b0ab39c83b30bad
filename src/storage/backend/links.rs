//! Redirect link persistence

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DbErr, EntityTrait, Order, QueryFilter, QueryOrder};
use tracing::info;

use super::converters::{link_to_active_model, model_to_link};
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, SurveyhubError};
use crate::storage::models::SurveyLink;

use migration::entities::survey_link;

impl SeaOrmStorage {
    pub async fn insert_link(&self, link: &SurveyLink) -> Result<()> {
        let db = &self.db;
        let model = link_to_active_model(link);

        retry::with_retry(&format!("insert_link({})", link.id), self.retry_config, || async {
            survey_link::Entity::insert(model.clone())
                .exec_without_returning(db)
                .await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("创建链接失败: {}", e)))?;

        info!("Survey link created: {} ({})", link.name, link.id);
        Ok(())
    }

    pub async fn get_link(&self, id: &str) -> Result<Option<SurveyLink>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("get_link({})", id), self.retry_config, || async {
            survey_link::Entity::find_by_id(id).one(db).await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("查询链接失败: {}", e)))?;

        Ok(model.map(model_to_link))
    }

    /// 全部链接，最新在前
    pub async fn list_links(&self) -> Result<Vec<SurveyLink>> {
        let db = &self.db;
        let models = retry::with_retry("list_links", self.retry_config, || async {
            survey_link::Entity::find()
                .order_by(survey_link::Column::CreatedAt, Order::Desc)
                .all(db)
                .await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("查询链接列表失败: {}", e)))?;

        Ok(models.into_iter().map(model_to_link).collect())
    }

    pub async fn update_link(&self, link: &SurveyLink) -> Result<()> {
        let db = &self.db;
        let model = link_to_active_model(link);

        match survey_link::Entity::update(model).exec(db).await {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => Err(SurveyhubError::not_found(format!(
                "链接不存在: {}",
                link.id
            ))),
            Err(e) => Err(SurveyhubError::database_operation(format!(
                "更新链接失败: {}",
                e
            ))),
        }
    }

    pub async fn delete_link(&self, id: &str) -> Result<()> {
        let db = &self.db;
        let result = retry::with_retry(&format!("delete_link({})", id), self.retry_config, || async {
            survey_link::Entity::delete_by_id(id).exec(db).await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("删除链接失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(SurveyhubError::not_found(format!("链接不存在: {}", id)));
        }
        info!("Survey link deleted: {}", id);
        Ok(())
    }

    pub async fn set_link_active(&self, id: &str, active: bool) -> Result<()> {
        let db = &self.db;
        let result = retry::with_retry(
            &format!("set_link_active({})", id),
            self.retry_config,
            || async {
                survey_link::Entity::update_many()
                    .col_expr(survey_link::Column::IsActive, Expr::value(active))
                    .col_expr(survey_link::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(survey_link::Column::Id.eq(id))
                    .exec(db)
                    .await
            },
        )
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("更新链接状态失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(SurveyhubError::not_found(format!("链接不存在: {}", id)));
        }
        Ok(())
    }
}

//! Click (outcome) records

use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, Order, QueryFilter, QueryOrder,
    QuerySelect,
};
use tracing::debug;

use super::converters::model_to_click;
use super::{ClickFilter, SeaOrmStorage, ilike, retry, search_term};
use crate::errors::{Result, SurveyhubError};
use crate::storage::models::{NewClick, SurveyClick};

use migration::entities::survey_click;

impl SeaOrmStorage {
    pub async fn insert_click(&self, click: NewClick) -> Result<SurveyClick> {
        let db = &self.db;
        let raw_data = serde_json::to_string(&click.raw_data)?;
        let model = survey_click::ActiveModel {
            id: NotSet,
            survey_id: Set(click.survey_id),
            user_id: Set(click.user_id),
            project_id: Set(click.project_id),
            ip_address: Set(click.ip_address),
            status: Set(click.status.to_string()),
            raw_data: Set(raw_data),
            created_at: Set(Utc::now()),
        };

        let inserted = retry::with_retry("insert_click", self.retry_config, || async {
            model.clone().insert(db).await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("记录点击失败: {}", e)))?;

        debug!(
            "Click recorded: id={}, status={}",
            inserted.id, inserted.status
        );
        Ok(model_to_click(inserted))
    }

    /// 报表查询，最新在前，最多 `limit` 条
    pub async fn list_clicks(&self, filter: &ClickFilter, limit: u64) -> Result<Vec<SurveyClick>> {
        let db = &self.db;

        let mut condition = Condition::all();
        if let Some(status) = filter.status {
            condition = condition.add(survey_click::Column::Status.eq(status.to_string()));
        }
        if let Some(ref survey_id) = filter.survey_id {
            condition = condition.add(survey_click::Column::SurveyId.eq(survey_id.as_str()));
        }
        if let Some(since) = filter.created_after {
            condition = condition.add(survey_click::Column::CreatedAt.gte(since));
        }
        if let Some(term) = search_term(&filter.search) {
            condition = condition.add(
                Condition::any()
                    .add(ilike(survey_click::Column::UserId, &term))
                    .add(ilike(survey_click::Column::ProjectId, &term))
                    .add(ilike(survey_click::Column::IpAddress, &term)),
            );
        }

        let models = retry::with_retry("list_clicks", self.retry_config, || async {
            survey_click::Entity::find()
                .filter(condition.clone())
                .order_by(survey_click::Column::CreatedAt, Order::Desc)
                .order_by(survey_click::Column::Id, Order::Desc)
                .limit(limit)
                .all(db)
                .await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("查询点击记录失败: {}", e)))?;

        Ok(models.into_iter().map(model_to_click).collect())
    }
}

use sea_orm::{ColumnTrait, EntityTrait, Order, QueryFilter, QueryOrder};

use super::converters::model_to_submission;
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, SurveyhubError};
use crate::storage::models::Submission;

use migration::entities::submission;

impl SeaOrmStorage {
    /// 某问卷的全部提交，最新在前
    pub async fn list_submissions_for_survey(&self, survey_id: &str) -> Result<Vec<Submission>> {
        let db = &self.db;
        let models = retry::with_retry(
            &format!("list_submissions({})", survey_id),
            self.retry_config,
            || async {
                submission::Entity::find()
                    .filter(submission::Column::SurveyId.eq(survey_id))
                    .order_by(submission::Column::SubmittedAt, Order::Desc)
                    .all(db)
                    .await
            },
        )
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("查询提交记录失败: {}", e)))?;

        Ok(models.into_iter().map(model_to_submission).collect())
    }
}

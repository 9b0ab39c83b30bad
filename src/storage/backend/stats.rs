//! Aggregate counts for the dashboard and survey detail

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter};

use super::{SeaOrmStorage, retry};
use crate::errors::{Result, SurveyhubError};
use crate::storage::models::ClickStatus;

use migration::entities::{submission, survey, survey_click};

/// 时间窗口内的计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowCounts {
    pub surveys: u64,
    pub clicks: u64,
    pub submissions: u64,
    pub completed: u64,
    pub terminated: u64,
    pub quota_full: u64,
}

/// 单个问卷的点击/提交统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurveyClickStats {
    pub total_clicks: u64,
    pub completed: u64,
    pub terminated: u64,
    pub quota_full: u64,
    pub submissions: u64,
}

impl SeaOrmStorage {
    async fn count_clicks(&self, condition: Condition) -> Result<u64> {
        let db = &self.db;
        retry::with_retry("count_clicks", self.retry_config, || async {
            survey_click::Entity::find()
                .filter(condition.clone())
                .count(db)
                .await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("统计点击失败: {}", e)))
    }

    async fn count_clicks_by_status(&self, base: &Condition) -> Result<(u64, u64, u64, u64)> {
        let total = self.count_clicks(base.clone()).await?;
        let mut per_status = [0u64; 3];
        for (slot, status) in per_status.iter_mut().zip([
            ClickStatus::Complete,
            ClickStatus::Terminate,
            ClickStatus::QuotaFull,
        ]) {
            *slot = self
                .count_clicks(
                    base.clone()
                        .add(survey_click::Column::Status.eq(status.to_string())),
                )
                .await?;
        }
        Ok((total, per_status[0], per_status[1], per_status[2]))
    }

    /// `since` 为 None 时统计全部
    pub async fn window_counts(&self, since: Option<DateTime<Utc>>) -> Result<WindowCounts> {
        let db = &self.db;

        let mut click_cond = Condition::all();
        let mut survey_cond = Condition::all();
        let mut submission_cond = Condition::all();
        if let Some(since) = since {
            click_cond = click_cond.add(survey_click::Column::CreatedAt.gte(since));
            survey_cond = survey_cond.add(survey::Column::CreatedAt.gte(since));
            submission_cond = submission_cond.add(submission::Column::SubmittedAt.gte(since));
        }

        let surveys = retry::with_retry("count_surveys", self.retry_config, || async {
            survey::Entity::find()
                .filter(survey_cond.clone())
                .count(db)
                .await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("统计问卷失败: {}", e)))?;

        let submissions = retry::with_retry("count_submissions", self.retry_config, || async {
            submission::Entity::find()
                .filter(submission_cond.clone())
                .count(db)
                .await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("统计提交失败: {}", e)))?;

        let (clicks, completed, terminated, quota_full) =
            self.count_clicks_by_status(&click_cond).await?;

        Ok(WindowCounts {
            surveys,
            clicks,
            submissions,
            completed,
            terminated,
            quota_full,
        })
    }

    pub async fn survey_click_stats(&self, survey_id: &str) -> Result<SurveyClickStats> {
        let db = &self.db;
        let base = Condition::all().add(survey_click::Column::SurveyId.eq(survey_id));
        let (total_clicks, completed, terminated, quota_full) =
            self.count_clicks_by_status(&base).await?;

        let submissions = retry::with_retry("count_survey_submissions", self.retry_config, || async {
            submission::Entity::find()
                .filter(submission::Column::SurveyId.eq(survey_id))
                .count(db)
                .await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("统计提交失败: {}", e)))?;

        Ok(SurveyClickStats {
            total_clicks,
            completed,
            terminated,
            quota_full,
            submissions,
        })
    }
}

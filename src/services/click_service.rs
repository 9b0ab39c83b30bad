//! Outcome capture for the public click endpoint and click reports

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use super::SurveyService;
use crate::config::get_config;
use crate::errors::{Result, SurveyhubError};
use crate::storage::{ClickFilter, ClickStatus, NewClick, SeaOrmStorage, Survey, SurveyClick};
use crate::utils::csv_handler::records_to_csv;

/// 点击处理结果
#[derive(Debug, Clone)]
pub struct ClickOutcome {
    pub click: SurveyClick,
    /// 配置了落地页时的跳转目标
    pub landing_url: Option<String>,
}

/// 从查询参数中取出并校验 status
pub fn parse_click_status(params: &BTreeMap<String, String>) -> Result<ClickStatus> {
    let raw = params
        .get("status")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SurveyhubError::validation("status is required"))?;
    raw.parse().map_err(SurveyhubError::validation)
}

fn param(params: &BTreeMap<String, String>, key: &str) -> Option<String> {
    params
        .get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn landing_for(status: ClickStatus) -> Option<String> {
    let survey = &get_config().survey;
    match status {
        ClickStatus::Complete => survey.landing_complete.clone(),
        ClickStatus::Terminate => survey.landing_terminate.clone(),
        ClickStatus::QuotaFull => survey.landing_quota_full.clone(),
    }
    .filter(|url| !url.trim().is_empty())
}

pub struct ClickService {
    storage: Arc<SeaOrmStorage>,
    surveys: Arc<SurveyService>,
}

impl ClickService {
    pub fn new(storage: Arc<SeaOrmStorage>, surveys: Arc<SurveyService>) -> Self {
        Self { storage, surveys }
    }

    /// `sid` 优先；否则按 `pid == projectIdFromInter` 查找
    async fn resolve_survey(&self, params: &BTreeMap<String, String>) -> Result<Option<Survey>> {
        if let Some(sid) = param(params, "sid") {
            let survey = self.storage.get_survey(&sid).await?;
            if survey.is_none() {
                warn!("Click references unknown survey id: {}", sid);
            }
            return Ok(survey);
        }
        match param(params, "pid") {
            Some(pid) => self.storage.find_survey_by_project_inter(&pid).await,
            None => Ok(None),
        }
    }

    /// 记录一次结果回调
    pub async fn capture(
        &self,
        params: BTreeMap<String, String>,
        ip_address: Option<String>,
    ) -> Result<ClickOutcome> {
        let requested = parse_click_status(&params)?;
        let survey = self.resolve_survey(&params).await?;

        let mut status = requested;
        if let Some(ref survey) = survey
            && requested == ClickStatus::Complete
        {
            match self.surveys.record_completion(&survey.id).await {
                Ok(receipt) => {
                    if receipt.now_full {
                        info!(
                            "Survey {} reached quota ({}/{}), deactivated",
                            survey.id, receipt.count, survey.max_responses
                        );
                    }
                }
                Err(SurveyhubError::SurveyQuotaFull(_)) => status = ClickStatus::QuotaFull,
                // 停用中的问卷：保留 complete，但不计数
                Err(SurveyhubError::SurveyNotLive(_)) => {}
                Err(e) => return Err(e),
            }
        }

        let click = self
            .storage
            .insert_click(NewClick {
                survey_id: survey.map(|s| s.id),
                user_id: param(&params, "uid").unwrap_or_default(),
                project_id: param(&params, "pid").unwrap_or_default(),
                ip_address,
                status,
                raw_data: params,
            })
            .await?;

        info!(
            "Click captured: status={} (requested {}), survey={:?}",
            click.status, requested, click.survey_id
        );

        Ok(ClickOutcome {
            landing_url: landing_for(click.status),
            click,
        })
    }

    pub async fn list_clicks(
        &self,
        status: Option<ClickStatus>,
        search: Option<String>,
    ) -> Result<Vec<SurveyClick>> {
        let filter = ClickFilter {
            status,
            search,
            ..Default::default()
        };
        self.storage
            .list_clicks(&filter, get_config().survey.report_limit)
            .await
    }

    pub async fn export_csv(
        &self,
        status: Option<ClickStatus>,
        search: Option<String>,
    ) -> Result<String> {
        let clicks = self.list_clicks(status, search).await?;
        clicks_to_csv(&clicks)
    }
}

pub fn clicks_to_csv(clicks: &[SurveyClick]) -> Result<String> {
    let headers: Vec<String> = [
        "Sr No.",
        "User ID",
        "Project ID",
        "Survey ID",
        "Status",
        "IP Address",
        "Created At",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();

    let rows: Vec<Vec<String>> = clicks
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            vec![
                (idx + 1).to_string(),
                c.user_id.clone(),
                c.project_id.clone(),
                c.survey_id.clone().unwrap_or_default(),
                c.status.to_string(),
                c.ip_address.clone().unwrap_or_default(),
                c.created_at.to_rfc3339(),
            ]
        })
        .collect();

    records_to_csv(&headers, &rows)
}

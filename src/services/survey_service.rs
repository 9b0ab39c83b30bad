//! Survey lifecycle and quota enforcement

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::{Page, normalize_paging};
use crate::config::get_config;
use crate::errors::{Result, SurveyhubError};
use crate::storage::{
    ListQuery, QuotaOutcome, SeaOrmStorage, SortOrder, Survey, SurveyClickStats, SurveySortField,
    SurveyState, Question,
};
use crate::utils::url_builder::build_survey_link;
use crate::utils::validators::{require_non_blank, validate_redirect_url};

#[derive(Debug, Clone, Default)]
pub struct CreateSurveyRequest {
    pub survey_name: String,
    pub description: String,
    pub project_id_from_client: String,
    pub project_id_from_inter: String,
    pub questions: Vec<Question>,
    pub redirect_url: String,
    /// None = 不限
    pub max_responses: Option<i64>,
}

/// 所有字段可选，None 表示保持原值
#[derive(Debug, Clone, Default)]
pub struct UpdateSurveyRequest {
    pub survey_name: Option<String>,
    pub description: Option<String>,
    pub project_id_from_client: Option<String>,
    pub project_id_from_inter: Option<String>,
    pub questions: Option<Vec<Question>>,
    pub redirect_url: Option<String>,
    pub max_responses: Option<i64>,
}

/// 列表参数（原始形式，由服务层校验）
#[derive(Debug, Clone, Default)]
pub struct SurveyListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SurveyCreateResult {
    pub survey: Survey,
    pub generated_link: String,
}

#[derive(Debug, Clone)]
pub struct SurveyDetail {
    pub survey: Survey,
    pub stats: SurveyClickStats,
}

/// 配额闸门通过后的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionReceipt {
    pub count: u64,
    pub now_full: bool,
}

/// 校验并规范化问题列表，缺失的 id 分配 UUID
pub fn normalize_questions(questions: Vec<Question>) -> Result<Vec<Question>> {
    questions
        .into_iter()
        .enumerate()
        .map(|(idx, mut q)| {
            q.question_text = q.question_text.trim().to_string();
            if q.question_text.is_empty() {
                return Err(SurveyhubError::validation(format!(
                    "Question {} text is required",
                    idx + 1
                )));
            }

            if q.answer_type.is_choice() {
                q.options = q
                    .options
                    .into_iter()
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect();
                if q.options.len() < 2 {
                    return Err(SurveyhubError::validation(format!(
                        "Question {} needs at least 2 options",
                        idx + 1
                    )));
                }
            } else {
                q.options.clear();
            }

            if q.id.trim().is_empty() {
                q.id = uuid::Uuid::new_v4().to_string();
            }
            Ok(q)
        })
        .collect()
}

fn validate_max_responses(max: Option<i64>) -> Result<u64> {
    match max {
        None => Ok(0),
        Some(n) if n < 0 => Err(SurveyhubError::validation(
            "maxResponses must be 0 or greater",
        )),
        Some(n) => Ok(n as u64),
    }
}

fn parse_list_params(params: &SurveyListParams) -> Result<ListQuery<SurveySortField>> {
    let (page, limit) = normalize_paging(params.page, params.limit);
    let sort_by = match params.sort_by.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(s) => s.parse().map_err(SurveyhubError::validation)?,
        None => SurveySortField::default(),
    };
    let sort_order = match params.sort_order.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(s) => s.parse().map_err(SurveyhubError::validation)?,
        None => SortOrder::default(),
    };
    Ok(ListQuery {
        page,
        limit,
        search: params.search.clone(),
        sort_by,
        sort_order,
    })
}

pub struct SurveyService {
    storage: Arc<SeaOrmStorage>,
}

impl SurveyService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    async fn require(&self, id: &str) -> Result<Survey> {
        self.storage
            .get_survey(id)
            .await?
            .ok_or_else(|| SurveyhubError::not_found(format!("Survey not found: {}", id)))
    }

    pub async fn create_survey(&self, req: CreateSurveyRequest) -> Result<SurveyCreateResult> {
        let survey_name = require_non_blank(&req.survey_name, "surveyName")?;
        let redirect_url = require_non_blank(&req.redirect_url, "redirectUrl")?;
        validate_redirect_url(&redirect_url)?;
        let max_responses = validate_max_responses(req.max_responses)?;
        let questions = normalize_questions(req.questions)?;

        let now = Utc::now();
        let survey = Survey {
            id: uuid::Uuid::new_v4().to_string(),
            survey_name,
            description: req.description.trim().to_string(),
            project_id_from_client: req.project_id_from_client.trim().to_string(),
            project_id_from_inter: req.project_id_from_inter.trim().to_string(),
            questions,
            redirect_url,
            max_responses,
            response_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.storage.insert_survey(&survey).await?;

        let generated_link = build_survey_link(&get_config().server.public_base_url, &survey.id);
        Ok(SurveyCreateResult {
            survey,
            generated_link,
        })
    }

    pub async fn get_survey(&self, id: &str) -> Result<SurveyDetail> {
        let survey = self.require(id).await?;
        let stats = self.storage.survey_click_stats(id).await?;
        Ok(SurveyDetail { survey, stats })
    }

    pub async fn list_surveys(&self, params: &SurveyListParams) -> Result<Page<Survey>> {
        let query = parse_list_params(params)?;
        let (items, total) = self.storage.list_surveys(&query).await?;
        Ok(Page::new(items, query.page, query.limit, total))
    }

    pub async fn update_survey(&self, id: &str, req: UpdateSurveyRequest) -> Result<Survey> {
        let mut survey = self.require(id).await?;

        if let Some(name) = req.survey_name {
            survey.survey_name = require_non_blank(&name, "surveyName")?;
        }
        if let Some(description) = req.description {
            survey.description = description.trim().to_string();
        }
        if let Some(pid) = req.project_id_from_client {
            survey.project_id_from_client = pid.trim().to_string();
        }
        if let Some(pid) = req.project_id_from_inter {
            survey.project_id_from_inter = pid.trim().to_string();
        }
        if let Some(url) = req.redirect_url {
            let url = require_non_blank(&url, "redirectUrl")?;
            validate_redirect_url(&url)?;
            survey.redirect_url = url;
        }
        if let Some(questions) = req.questions {
            survey.questions = normalize_questions(questions)?;
        }
        if req.max_responses.is_some() {
            survey.max_responses = validate_max_responses(req.max_responses)?;
        }

        let updated = self.storage.update_survey(&survey).await?;
        info!("Survey updated: {}", id);
        Ok(updated)
    }

    pub async fn delete_survey(&self, id: &str) -> Result<()> {
        self.storage.delete_survey(id).await
    }

    /// 切换启用状态。已满问卷不能启用
    pub async fn toggle_survey(&self, id: &str) -> Result<Survey> {
        let survey = self.require(id).await?;

        let activate = match survey.state() {
            SurveyState::Live => false,
            SurveyState::Paused => true,
            // 已满但仍标记为启用的旧数据：只允许停用
            SurveyState::Full if survey.is_active => false,
            SurveyState::Full => {
                return Err(SurveyhubError::survey_quota_full(format!(
                    "Survey has reached its response limit ({}/{}); raise maxResponses before activating",
                    survey.response_count, survey.max_responses
                )));
            }
        };

        // 启用仍需满足未满条件
        if !self.storage.set_survey_active(id, activate).await? {
            return Err(SurveyhubError::survey_quota_full(
                "Survey has reached its response limit",
            ));
        }

        info!(
            "Survey {} {}",
            id,
            if activate { "activated" } else { "deactivated" }
        );
        self.require(id).await
    }

    /// 配额闸门
    pub async fn record_completion(&self, id: &str) -> Result<CompletionReceipt> {
        let outcome = self.storage.try_increment_response(id).await?;
        Self::receipt_for(id, outcome)
    }

    /// 闸门结果转为回执；停用或已满转为对应错误
    pub fn receipt_for(id: &str, outcome: QuotaOutcome) -> Result<CompletionReceipt> {
        match outcome {
            QuotaOutcome::Accepted { count, now_full } => Ok(CompletionReceipt { count, now_full }),
            QuotaOutcome::NotLive => {
                warn!("Completion rejected, survey {} is paused", id);
                Err(SurveyhubError::survey_not_live(
                    "This survey is not currently accepting responses",
                ))
            }
            QuotaOutcome::Full => {
                warn!("Completion rejected, survey {} is full", id);
                Err(SurveyhubError::survey_quota_full(
                    "This survey has reached its response limit",
                ))
            }
        }
    }

    /// 仅返回 Live 状态的问卷
    pub async fn require_live(&self, id: &str) -> Result<Survey> {
        let survey = self.require(id).await?;
        match survey.state() {
            SurveyState::Live => Ok(survey),
            SurveyState::Paused => Err(SurveyhubError::survey_not_live(
                "This survey is not currently accepting responses",
            )),
            SurveyState::Full => Err(SurveyhubError::survey_quota_full(
                "This survey has reached its response limit",
            )),
        }
    }

    pub fn storage(&self) -> &Arc<SeaOrmStorage> {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::AnswerType;

    fn question(text: &str, answer_type: AnswerType, options: &[&str]) -> Question {
        Question {
            id: String::new(),
            question_text: text.to_string(),
            answer_type,
            options: options.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_questions_get_ids_and_trimmed_options() {
        let qs = normalize_questions(vec![
            question(" Name ", AnswerType::Text, &["ignored"]),
            question("Color", AnswerType::Single, &[" red ", "", "blue"]),
        ])
        .unwrap();
        assert_eq!(qs[0].question_text, "Name");
        assert!(qs[0].options.is_empty());
        assert_eq!(qs[1].options, vec!["red", "blue"]);
        assert!(qs.iter().all(|q| uuid::Uuid::parse_str(&q.id).is_ok()));
    }

    #[test]
    fn test_choice_question_needs_two_options() {
        let err = normalize_questions(vec![question("Pick", AnswerType::Multiple, &["a", " "])])
            .unwrap_err();
        assert!(matches!(err, SurveyhubError::Validation(_)));
    }

    #[test]
    fn test_blank_question_text_rejected() {
        assert!(normalize_questions(vec![question("  ", AnswerType::Text, &[])]).is_err());
    }

    #[test]
    fn test_existing_question_id_kept() {
        let mut q = question("Q", AnswerType::Text, &[]);
        q.id = "keep-me".into();
        assert_eq!(normalize_questions(vec![q]).unwrap()[0].id, "keep-me");
    }

    #[test]
    fn test_max_responses_validation() {
        assert_eq!(validate_max_responses(None).unwrap(), 0);
        assert_eq!(validate_max_responses(Some(25)).unwrap(), 25);
        assert!(validate_max_responses(Some(-1)).is_err());
    }

    #[test]
    fn test_list_params_reject_unknown_sort() {
        let params = SurveyListParams {
            sort_by: Some("color".into()),
            ..Default::default()
        };
        assert!(parse_list_params(&params).is_err());

        let params = SurveyListParams {
            sort_by: Some("surveyName".into()),
            sort_order: Some("asc".into()),
            ..Default::default()
        };
        let q = parse_list_params(&params).unwrap();
        assert_eq!(q.sort_by, SurveySortField::SurveyName);
        assert_eq!(q.sort_order, SortOrder::Asc);
    }
}

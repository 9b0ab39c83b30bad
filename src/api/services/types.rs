//! API 请求 / 响应 DTO
//!
//! 字段使用 camelCase，资源 id 序列化为 `_id`（与管理后台前端约定一致）。
//! TypeScript 定义由 ts-rs 生成。

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::config::TS_EXPORT_PATH;
use crate::services::{DashboardSummary, Page, RegistrationForm};
use crate::storage::{
    Admin, Answer, ClickStatus, Question, Registration, Submission, Survey, SurveyClick,
    SurveyClickStats, SurveyLink,
};

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> From<&Page<T>> for PaginationInfo {
    fn from(page: &Page<T>) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total: page.total,
            total_pages: page.total_pages,
        }
    }
}

// ============ Surveys ============

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub survey_name: String,
    pub description: String,
    pub project_id_from_client: String,
    pub project_id_from_inter: String,
    pub questions: Vec<Question>,
    pub redirect_url: String,
    pub max_responses: u64,
    pub response_count: u64,
    /// 已满的问卷总是报告为未启用
    pub is_active: bool,
    pub is_full: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Survey> for SurveyResponse {
    fn from(s: Survey) -> Self {
        let is_full = s.is_full();
        Self {
            is_active: s.is_active && !is_full,
            is_full,
            id: s.id,
            survey_name: s.survey_name,
            description: s.description,
            project_id_from_client: s.project_id_from_client,
            project_id_from_inter: s.project_id_from_inter,
            questions: s.questions,
            redirect_url: s.redirect_url,
            max_responses: s.max_responses,
            response_count: s.response_count,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// 受访者可见的问卷内容
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct PublicSurveyResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub survey_name: String,
    pub description: String,
    pub questions: Vec<Question>,
}

impl From<Survey> for PublicSurveyResponse {
    fn from(s: Survey) -> Self {
        Self {
            id: s.id,
            survey_name: s.survey_name,
            description: s.description,
            questions: s.questions,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct SurveyStatsResponse {
    pub total_clicks: u64,
    pub completed: u64,
    pub terminated: u64,
    pub quota_full: u64,
    pub submissions: u64,
}

impl From<SurveyClickStats> for SurveyStatsResponse {
    fn from(s: SurveyClickStats) -> Self {
        Self {
            total_clicks: s.total_clicks,
            completed: s.completed,
            terminated: s.terminated,
            quota_full: s.quota_full,
            submissions: s.submissions,
        }
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct CreateSurveyBody {
    #[serde(default)]
    pub survey_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub project_id_from_client: String,
    #[serde(default)]
    pub project_id_from_inter: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub redirect_url: String,
    #[serde(default)]
    #[ts(optional)]
    pub max_responses: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, TS, Default)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSurveyBody {
    #[ts(optional)]
    pub survey_name: Option<String>,
    #[ts(optional)]
    pub description: Option<String>,
    #[ts(optional)]
    pub project_id_from_client: Option<String>,
    #[ts(optional)]
    pub project_id_from_inter: Option<String>,
    #[ts(optional)]
    pub questions: Option<Vec<Question>>,
    #[ts(optional)]
    pub redirect_url: Option<String>,
    #[ts(optional)]
    pub max_responses: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, TS, Default)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct SurveyListQuery {
    #[ts(optional)]
    pub page: Option<u64>,
    #[ts(optional)]
    pub limit: Option<u64>,
    #[ts(optional)]
    pub search: Option<String>,
    #[ts(optional)]
    pub sort_by: Option<String>,
    #[ts(optional)]
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub is_active: bool,
}

// ============ Clicks ============

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClickExportQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct ClickResponse {
    #[serde(rename = "_id")]
    pub id: i64,
    pub survey_id: Option<String>,
    pub user_id: String,
    pub project_id: String,
    pub ip_address: Option<String>,
    pub status: ClickStatus,
    pub raw_data: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl From<SurveyClick> for ClickResponse {
    fn from(c: SurveyClick) -> Self {
        Self {
            id: c.id,
            survey_id: c.survey_id,
            user_id: c.user_id,
            project_id: c.project_id,
            ip_address: c.ip_address,
            status: c.status,
            raw_data: c.raw_data,
            created_at: c.created_at,
        }
    }
}

// ============ Links ============

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[ts(optional)]
    pub status: Option<ClickStatus>,
}

#[derive(Debug, Clone, Deserialize, TS, Default)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLinkBody {
    #[ts(optional)]
    pub name: Option<String>,
    #[ts(optional)]
    pub parameters: Option<BTreeMap<String, String>>,
    #[ts(optional)]
    pub status: Option<ClickStatus>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct LinkStatusBody {
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub url: String,
    pub parameters: BTreeMap<String, String>,
    pub status: ClickStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SurveyLink> for LinkResponse {
    fn from(l: SurveyLink) -> Self {
        Self {
            id: l.id,
            name: l.name,
            url: l.url,
            parameters: l.parameters,
            status: l.status,
            is_active: l.is_active,
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

// ============ Submissions ============

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBody {
    #[serde(default)]
    pub responses: Vec<Answer>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub submission_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub survey_id: String,
    pub responses: Vec<Answer>,
    pub ip_address: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl From<Submission> for SubmissionResponse {
    fn from(s: Submission) -> Self {
        Self {
            id: s.id,
            survey_id: s.survey_id,
            responses: s.responses,
            ip_address: s.ip_address,
            submitted_at: s.submitted_at,
        }
    }
}

// ============ Registration & OTP ============

/// 面板注册表单
#[derive(Debug, Clone, Deserialize, TS, Default)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationBody {
    pub full_name: String,
    pub email: String,
    pub age: String,
    pub gender: String,
    pub location: String,
    pub education: String,
    pub household_size: String,
    pub marital_status: String,
    pub income: String,
    pub home_ownership: String,
    pub employment_status: String,
    pub job_title: String,
    pub industry: String,
    pub experience: String,
    pub designation: String,
    pub org_size: String,
    pub purchase_decision: String,
    pub vehicle: String,
    pub data_consent: String,
    pub nda: String,
    pub age_confirm: String,
    pub communication: String,
    pub final_consent: bool,
}

impl From<RegistrationBody> for RegistrationForm {
    fn from(b: RegistrationBody) -> Self {
        let answers = [
            ("education", b.education),
            ("householdSize", b.household_size),
            ("maritalStatus", b.marital_status),
            ("income", b.income),
            ("homeOwnership", b.home_ownership),
            ("employmentStatus", b.employment_status),
            ("jobTitle", b.job_title),
            ("industry", b.industry),
            ("experience", b.experience),
            ("designation", b.designation),
            ("orgSize", b.org_size),
            ("purchaseDecision", b.purchase_decision),
            ("vehicle", b.vehicle),
            ("dataConsent", b.data_consent),
            ("nda", b.nda),
            ("ageConfirm", b.age_confirm),
            ("communication", b.communication),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        RegistrationForm {
            full_name: b.full_name,
            email: b.email,
            age: b.age,
            gender: b.gender,
            location: b.location,
            final_consent: b.final_consent,
            answers,
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub age: String,
    pub gender: String,
    pub location: String,
    /// 其余问卷字段，展开到顶层
    #[serde(flatten)]
    #[ts(skip)]
    pub profile: BTreeMap<String, Value>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Registration> for RegistrationResponse {
    fn from(r: Registration) -> Self {
        Self {
            id: r.id,
            full_name: r.full_name,
            email: r.email,
            age: r.age,
            gender: r.gender,
            location: r.location,
            profile: r.profile,
            email_verified: r.email_verified,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, TS, Default)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationListQuery {
    #[ts(optional)]
    pub page: Option<u64>,
    #[ts(optional)]
    pub limit: Option<u64>,
    #[ts(optional)]
    pub search: Option<String>,
    #[ts(optional)]
    pub sort_by: Option<String>,
    #[ts(optional)]
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct OtpSendBody {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct OtpVerifyBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct OtpSentResponse {
    pub email: String,
    pub expires_in: u64,
}

// ============ Admin ============

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct LoginCredentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct AdminResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<Admin> for AdminResponse {
    fn from(a: Admin) -> Self {
        Self {
            id: a.id,
            username: a.username,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordBody {
    #[serde(default)]
    pub admin_id: String,
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

// ============ Dashboard ============

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DashboardQuery {
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct TodayStats {
    pub today_clicks: u64,
    pub today_completed: u64,
    pub today_terminated: u64,
    pub today_quota_full: u64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total_surveys: u64,
    pub total_clicks: u64,
    pub total_submissions: u64,
    pub completed_count: u64,
    pub terminated_count: u64,
    pub quota_full_count: u64,
    pub today: TodayStats,
}

impl From<DashboardSummary> for DashboardResponse {
    fn from(s: DashboardSummary) -> Self {
        Self {
            total_surveys: s.window.surveys,
            total_clicks: s.window.clicks,
            total_submissions: s.window.submissions,
            completed_count: s.window.completed,
            terminated_count: s.window.terminated,
            quota_full_count: s.window.quota_full,
            today: TodayStats {
                today_clicks: s.today.clicks,
                today_completed: s.today.completed,
                today_terminated: s.today.terminated,
                today_quota_full: s.today.quota_full,
            },
        }
    }
}

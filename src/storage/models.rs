//! 领域模型
//!
//! 数据库行（`migration::entities`）与 API 之间的中间层。JSON 列在这里
//! 已经解析为强类型结构。

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};
use ts_rs::TS;

use crate::config::TS_EXPORT_PATH;

/// 受访者结果状态
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, EnumIter, AsRefStr,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClickStatus {
    Complete,
    Terminate,
    QuotaFull,
}

impl std::fmt::Display for ClickStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl FromStr for ClickStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "complete" | "completed" => Ok(Self::Complete),
            "terminate" | "terminated" => Ok(Self::Terminate),
            "quota_full" | "quota-full" | "quotafull" => Ok(Self::QuotaFull),
            _ => Err(format!(
                "Invalid status: '{}'. Valid: complete, terminate, quota_full",
                s
            )),
        }
    }
}

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "lowercase")]
pub enum AnswerType {
    #[default]
    Text,
    /// 单选（旧版前端写作 "mcq"）
    #[serde(alias = "mcq")]
    Single,
    Multiple,
}

impl AnswerType {
    pub fn is_choice(&self) -> bool {
        !matches!(self, AnswerType::Text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    pub question_text: String,
    #[serde(default)]
    pub answer_type: AnswerType,
    #[serde(default)]
    pub options: Vec<String>,
}

/// 问卷派生状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyState {
    /// 启用且未满额
    Live,
    /// 手动停用且未满额
    Paused,
    /// 已达配额
    Full,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Survey {
    pub id: String,
    pub survey_name: String,
    pub description: String,
    pub project_id_from_client: String,
    pub project_id_from_inter: String,
    pub questions: Vec<Question>,
    pub redirect_url: String,
    /// 0 = 不限
    pub max_responses: u64,
    pub response_count: u64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Survey {
    pub fn is_full(&self) -> bool {
        self.max_responses > 0 && self.response_count >= self.max_responses
    }

    pub fn state(&self) -> SurveyState {
        if self.is_full() {
            SurveyState::Full
        } else if self.is_active {
            SurveyState::Live
        } else {
            SurveyState::Paused
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurveyClick {
    pub id: i64,
    pub survey_id: Option<String>,
    pub user_id: String,
    pub project_id: String,
    pub ip_address: Option<String>,
    pub status: ClickStatus,
    pub raw_data: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

/// 写入点击记录所需字段
#[derive(Debug, Clone)]
pub struct NewClick {
    pub survey_id: Option<String>,
    pub user_id: String,
    pub project_id: String,
    pub ip_address: Option<String>,
    pub status: ClickStatus,
    pub raw_data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurveyLink {
    pub id: String,
    pub name: String,
    pub url: String,
    pub parameters: BTreeMap<String, String>,
    pub status: ClickStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub id: String,
    pub survey_id: String,
    pub responses: Vec<Answer>,
    pub ip_address: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub age: String,
    pub gender: String,
    pub location: String,
    /// 其余问卷字段（教育、收入、职业……）
    pub profile: BTreeMap<String, serde_json::Value>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OtpRecord {
    pub id: i64,
    pub email: String,
    pub code_hash: String,
    pub attempts: u32,
    pub verified: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Admin {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 配额闸门结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaOutcome {
    /// 计数成功；`now_full` 表示本次恰好填满并已自动停用
    Accepted { count: u64, now_full: bool },
    /// 问卷已停用（未满）
    NotLive,
    /// 问卷已满
    Full,
}

/// 列表排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(format!("Invalid sortOrder: '{}'. Valid: asc, desc", s)),
        }
    }
}

/// 问卷列表可排序字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurveySortField {
    #[default]
    CreatedAt,
    SurveyName,
    ResponseCount,
    MaxResponses,
}

impl FromStr for SurveySortField {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "createdAt" | "created_at" => Ok(Self::CreatedAt),
            "surveyName" | "survey_name" | "name" => Ok(Self::SurveyName),
            "responseCount" | "response_count" => Ok(Self::ResponseCount),
            "maxResponses" | "max_responses" => Ok(Self::MaxResponses),
            _ => Err(format!(
                "Invalid sortBy: '{}'. Valid: createdAt, surveyName, responseCount, maxResponses",
                s
            )),
        }
    }
}

/// 注册列表可排序字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationSortField {
    #[default]
    CreatedAt,
    FullName,
    Email,
    Age,
}

impl FromStr for RegistrationSortField {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "createdAt" | "created_at" => Ok(Self::CreatedAt),
            "fullName" | "full_name" => Ok(Self::FullName),
            "email" => Ok(Self::Email),
            "age" => Ok(Self::Age),
            _ => Err(format!(
                "Invalid sortBy: '{}'. Valid: createdAt, fullName, email, age",
                s
            )),
        }
    }
}

/// 通用分页 + 搜索 + 排序
#[derive(Debug, Clone)]
pub struct ListQuery<F> {
    pub page: u64,
    pub limit: u64,
    pub search: Option<String>,
    pub sort_by: F,
    pub sort_order: SortOrder,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey(max: u64, count: u64, active: bool) -> Survey {
        let now = Utc::now();
        Survey {
            id: "s1".into(),
            survey_name: "n".into(),
            description: String::new(),
            project_id_from_client: String::new(),
            project_id_from_inter: String::new(),
            questions: Vec::new(),
            redirect_url: "https://example.com".into(),
            max_responses: max,
            response_count: count,
            is_active: active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_full_requires_positive_max() {
        assert!(!survey(0, 10, true).is_full());
        assert!(!survey(5, 4, true).is_full());
        assert!(survey(5, 5, true).is_full());
        assert!(survey(5, 7, false).is_full());
    }

    #[test]
    fn test_state_derivation() {
        assert_eq!(survey(5, 1, true).state(), SurveyState::Live);
        assert_eq!(survey(5, 1, false).state(), SurveyState::Paused);
        assert_eq!(survey(5, 5, true).state(), SurveyState::Full);
        assert_eq!(survey(0, 100, true).state(), SurveyState::Live);
    }

    #[test]
    fn test_click_status_parsing_is_case_insensitive() {
        assert_eq!("COMPLETE".parse::<ClickStatus>(), Ok(ClickStatus::Complete));
        assert_eq!(" Terminate ".parse::<ClickStatus>(), Ok(ClickStatus::Terminate));
        assert_eq!("Quota_Full".parse::<ClickStatus>(), Ok(ClickStatus::QuotaFull));
        assert!("done".parse::<ClickStatus>().is_err());
        assert_eq!(ClickStatus::QuotaFull.to_string(), "quota_full");
    }

    #[test]
    fn test_question_accepts_legacy_mcq() {
        let q: Question = serde_json::from_str(
            r#"{"questionText":"Pick","answerType":"mcq","options":["a","b"]}"#,
        )
        .unwrap();
        assert_eq!(q.answer_type, AnswerType::Single);
        assert!(q.id.is_empty());
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!(
            "responseCount".parse::<SurveySortField>(),
            Ok(SurveySortField::ResponseCount)
        );
        assert!("bogus".parse::<SurveySortField>().is_err());
        assert_eq!("ASC".parse::<SortOrder>(), Ok(SortOrder::Asc));
    }
}

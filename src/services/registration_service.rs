//! Panel registration (requires a verified e-mail)

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::info;

use super::{OtpService, Page, normalize_paging};
use crate::config::get_config;
use crate::errors::{Result, SurveyhubError};
use crate::storage::{
    ListQuery, Registration, RegistrationSortField, SeaOrmStorage, SortOrder,
};
use crate::utils::csv_handler::records_to_csv;
use crate::utils::validators::{require_non_blank, validate_email};

/// 问卷中除基本信息外的必填项（jobTitle 可选）
pub const REQUIRED_PROFILE_FIELDS: &[&str] = &[
    "education",
    "householdSize",
    "maritalStatus",
    "income",
    "homeOwnership",
    "employmentStatus",
    "industry",
    "experience",
    "designation",
    "orgSize",
    "purchaseDecision",
    "vehicle",
    "dataConsent",
    "nda",
    "ageConfirm",
    "communication",
];

pub const OPTIONAL_PROFILE_FIELDS: &[&str] = &["jobTitle"];

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub email: String,
    pub age: String,
    pub gender: String,
    pub location: String,
    pub final_consent: bool,
    /// 其余字段，key 为前端字段名（camelCase）
    pub answers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// 校验表单（不含邮箱验证状态），返回待存储的 profile
pub fn validate_form(form: &RegistrationForm) -> Result<BTreeMap<String, Value>> {
    if !form.final_consent {
        return Err(SurveyhubError::validation(
            "Please agree to the terms before submitting",
        ));
    }

    let answer = |key: &str| form.answers.get(key).map(|v| v.trim()).unwrap_or("");
    if answer("ageConfirm") != "Yes" {
        return Err(SurveyhubError::validation(
            "You must confirm you are 18 years or older",
        ));
    }

    for field in REQUIRED_PROFILE_FIELDS {
        if answer(field).is_empty() {
            return Err(SurveyhubError::validation(format!("{} is required", field)));
        }
    }

    let mut profile: BTreeMap<String, Value> = REQUIRED_PROFILE_FIELDS
        .iter()
        .chain(OPTIONAL_PROFILE_FIELDS)
        .filter(|f| !answer(f).is_empty())
        .map(|f| (f.to_string(), Value::String(answer(f).to_string())))
        .collect();
    profile.insert("finalConsent".to_string(), Value::Bool(true));
    Ok(profile)
}

fn parse_list_params(params: &RegistrationListParams) -> Result<ListQuery<RegistrationSortField>> {
    let (page, limit) = normalize_paging(params.page, params.limit);
    let sort_by = match params.sort_by.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(s) => s.parse().map_err(SurveyhubError::validation)?,
        None => RegistrationSortField::default(),
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

fn profile_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

pub fn registrations_to_csv(rows: &[Registration]) -> Result<String> {
    let mut headers: Vec<String> = ["Sr No.", "Full Name", "Email", "Age", "Gender", "Location"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let profile_keys: Vec<&str> = REQUIRED_PROFILE_FIELDS
        .iter()
        .chain(OPTIONAL_PROFILE_FIELDS)
        .copied()
        .collect();
    headers.extend(profile_keys.iter().map(|k| k.to_string()));
    headers.push("Email Verified".to_string());
    headers.push("Created At".to_string());

    let records: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(idx, r)| {
            let mut row = vec![
                (idx + 1).to_string(),
                r.full_name.clone(),
                r.email.clone(),
                r.age.clone(),
                r.gender.clone(),
                r.location.clone(),
            ];
            row.extend(profile_keys.iter().map(|k| profile_text(r.profile.get(*k))));
            row.push(if r.email_verified { "Yes" } else { "No" }.to_string());
            row.push(r.created_at.to_rfc3339());
            row
        })
        .collect();

    records_to_csv(&headers, &records)
}

pub struct RegistrationService {
    storage: Arc<SeaOrmStorage>,
    otp: Arc<OtpService>,
}

impl RegistrationService {
    pub fn new(storage: Arc<SeaOrmStorage>, otp: Arc<OtpService>) -> Self {
        Self { storage, otp }
    }

    pub async fn register(&self, form: RegistrationForm) -> Result<Registration> {
        let full_name = require_non_blank(&form.full_name, "fullName")?;
        let email = validate_email(&form.email)?;
        let age = require_non_blank(&form.age, "age")?;
        let gender = require_non_blank(&form.gender, "gender")?;
        let location = require_non_blank(&form.location, "location")?;
        let profile = validate_form(&form)?;

        if !self.otp.is_verified(&email).await? {
            return Err(SurveyhubError::validation(
                "Please verify your email before submitting",
            ));
        }
        if self.storage.registration_email_exists(&email).await? {
            return Err(SurveyhubError::conflict("This email is already registered"));
        }

        let registration = Registration {
            id: uuid::Uuid::new_v4().to_string(),
            full_name,
            email,
            age,
            gender,
            location,
            profile,
            email_verified: true,
            created_at: Utc::now(),
        };
        self.storage.insert_registration(&registration).await?;

        info!("Registration created: {}", registration.id);
        Ok(registration)
    }

    pub async fn list_registrations(
        &self,
        params: &RegistrationListParams,
    ) -> Result<Page<Registration>> {
        let query = parse_list_params(params)?;
        let (items, total) = self.storage.list_registrations(&query).await?;
        Ok(Page::new(items, query.page, query.limit, total))
    }

    pub async fn get_registration(&self, id: &str) -> Result<Registration> {
        self.storage
            .get_registration(id)
            .await?
            .ok_or_else(|| SurveyhubError::not_found(format!("Registration not found: {}", id)))
    }

    pub async fn export_csv(&self, search: Option<String>) -> Result<String> {
        let rows = self
            .storage
            .export_registrations(&search, get_config().survey.report_limit)
            .await?;
        registrations_to_csv(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_form() -> RegistrationForm {
        let mut answers: BTreeMap<String, String> = REQUIRED_PROFILE_FIELDS
            .iter()
            .map(|f| (f.to_string(), "x".to_string()))
            .collect();
        answers.insert("ageConfirm".into(), "Yes".into());
        RegistrationForm {
            full_name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            age: "25-34".into(),
            gender: "Female".into(),
            location: "London".into(),
            final_consent: true,
            answers,
        }
    }

    #[test]
    fn test_complete_form_passes() {
        let profile = validate_form(&complete_form()).unwrap();
        assert_eq!(profile.get("finalConsent"), Some(&Value::Bool(true)));
        assert!(!profile.contains_key("jobTitle"));
    }

    #[test]
    fn test_consent_required() {
        let mut form = complete_form();
        form.final_consent = false;
        assert!(validate_form(&form).is_err());
    }

    #[test]
    fn test_age_confirm_must_be_yes() {
        let mut form = complete_form();
        form.answers.insert("ageConfirm".into(), "No".into());
        let err = validate_form(&form).unwrap_err();
        assert!(err.message().contains("18"));
    }

    #[test]
    fn test_missing_field_named_in_error() {
        let mut form = complete_form();
        form.answers.insert("income".into(), "  ".into());
        assert_eq!(validate_form(&form).unwrap_err().message(), "income is required");
    }

    #[test]
    fn test_registrations_csv_header() {
        let csv = registrations_to_csv(&[]).unwrap();
        let header = csv.lines().next().unwrap();
        assert!(header.starts_with("Sr No.,Full Name,Email,Age,Gender,Location,education"));
        assert!(header.ends_with("jobTitle,Email Verified,Created At"));
    }
}

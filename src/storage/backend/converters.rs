//! Model (数据库行) ↔ 领域结构体 转换
//!
//! JSON 列（questions / raw_data / parameters / profile / responses）在这里
//! 解析；损坏的 JSON 记录警告并退化为空值，而不是让整页查询失败。

use std::collections::BTreeMap;

use sea_orm::ActiveValue::Set;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::storage::models::{
    Admin, ClickStatus, OtpRecord, Registration, Submission, Survey, SurveyClick, SurveyLink,
};
use migration::entities::{
    admin, otp_code, registration, submission, survey, survey_click, survey_link,
};

fn parse_json_column<T: DeserializeOwned + Default>(raw: &str, column: &str, id: &str) -> T {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("{} 列 JSON 解析失败 (id={}): {}", column, id, e);
        T::default()
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    // BTreeMap / Vec 等纯数据结构序列化不会失败
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

fn parse_status(raw: &str, id: &str) -> ClickStatus {
    raw.parse().unwrap_or_else(|e| {
        warn!("未知状态值 (id={}): {}", id, e);
        ClickStatus::Terminate
    })
}

pub fn model_to_survey(model: survey::Model) -> Survey {
    let questions = parse_json_column(&model.questions, "questions", &model.id);
    Survey {
        questions,
        survey_name: model.survey_name,
        description: model.description,
        project_id_from_client: model.project_id_from_client,
        project_id_from_inter: model.project_id_from_inter,
        redirect_url: model.redirect_url,
        max_responses: model.max_responses.max(0) as u64,
        response_count: model.response_count.max(0) as u64,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
        id: model.id,
    }
}

pub fn survey_to_active_model(s: &Survey) -> survey::ActiveModel {
    survey::ActiveModel {
        id: Set(s.id.clone()),
        survey_name: Set(s.survey_name.clone()),
        description: Set(s.description.clone()),
        project_id_from_client: Set(s.project_id_from_client.clone()),
        project_id_from_inter: Set(s.project_id_from_inter.clone()),
        questions: Set(to_json(&s.questions)),
        redirect_url: Set(s.redirect_url.clone()),
        max_responses: Set(s.max_responses as i64),
        response_count: Set(s.response_count as i64),
        is_active: Set(s.is_active),
        created_at: Set(s.created_at),
        updated_at: Set(s.updated_at),
    }
}

pub fn model_to_click(model: survey_click::Model) -> SurveyClick {
    let id = model.id.to_string();
    SurveyClick {
        id: model.id,
        survey_id: model.survey_id,
        user_id: model.user_id,
        project_id: model.project_id,
        ip_address: model.ip_address,
        status: parse_status(&model.status, &id),
        raw_data: parse_json_column::<BTreeMap<String, String>>(&model.raw_data, "raw_data", &id),
        created_at: model.created_at,
    }
}

pub fn model_to_link(model: survey_link::Model) -> SurveyLink {
    SurveyLink {
        parameters: parse_json_column(&model.parameters, "parameters", &model.id),
        status: parse_status(&model.status, &model.id),
        name: model.name,
        url: model.url,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
        id: model.id,
    }
}

pub fn link_to_active_model(link: &SurveyLink) -> survey_link::ActiveModel {
    survey_link::ActiveModel {
        id: Set(link.id.clone()),
        name: Set(link.name.clone()),
        url: Set(link.url.clone()),
        parameters: Set(to_json(&link.parameters)),
        status: Set(link.status.to_string()),
        is_active: Set(link.is_active),
        created_at: Set(link.created_at),
        updated_at: Set(link.updated_at),
    }
}

pub fn model_to_submission(model: submission::Model) -> Submission {
    Submission {
        responses: parse_json_column(&model.responses, "responses", &model.id),
        survey_id: model.survey_id,
        ip_address: model.ip_address,
        submitted_at: model.submitted_at,
        id: model.id,
    }
}

pub fn submission_to_active_model(s: &Submission) -> submission::ActiveModel {
    submission::ActiveModel {
        id: Set(s.id.clone()),
        survey_id: Set(s.survey_id.clone()),
        responses: Set(to_json(&s.responses)),
        ip_address: Set(s.ip_address.clone()),
        submitted_at: Set(s.submitted_at),
    }
}

pub fn model_to_registration(model: registration::Model) -> Registration {
    Registration {
        profile: parse_json_column(&model.profile, "profile", &model.id),
        full_name: model.full_name,
        email: model.email,
        age: model.age,
        gender: model.gender,
        location: model.location,
        email_verified: model.email_verified,
        created_at: model.created_at,
        id: model.id,
    }
}

pub fn registration_to_active_model(r: &Registration) -> registration::ActiveModel {
    registration::ActiveModel {
        id: Set(r.id.clone()),
        full_name: Set(r.full_name.clone()),
        email: Set(r.email.clone()),
        age: Set(r.age.clone()),
        gender: Set(r.gender.clone()),
        location: Set(r.location.clone()),
        profile: Set(to_json(&r.profile)),
        email_verified: Set(r.email_verified),
        created_at: Set(r.created_at),
    }
}

pub fn model_to_otp(model: otp_code::Model) -> OtpRecord {
    OtpRecord {
        id: model.id,
        email: model.email,
        code_hash: model.code_hash,
        attempts: model.attempts.max(0) as u32,
        verified: model.verified,
        expires_at: model.expires_at,
        created_at: model.created_at,
        verified_at: model.verified_at,
    }
}

pub fn model_to_admin(model: admin::Model) -> Admin {
    Admin {
        id: model.id,
        username: model.username,
        password_hash: model.password_hash,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

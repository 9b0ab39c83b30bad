//! `/api/submission` 端点

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, Responder, Result as ActixResult, web};

use crate::api::middleware::AdminAuth;
use crate::services::SubmissionService;
use crate::utils::ip::extract_client_ip;

use super::helpers::{ApiResponse, csv_response, error_from_surveyhub};
use super::types::{SubmissionResponse, SubmitBody, SubmitResponse, SurveyResponse};

/// 公开：提交答卷
pub async fn submit(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<SubmitBody>,
    submissions: web::Data<Arc<SubmissionService>>,
) -> ActixResult<impl Responder> {
    let ip = extract_client_ip(&req);

    Ok(
        match submissions
            .submit(&path, body.into_inner().responses, ip)
            .await
        {
            Ok(result) => ApiResponse::ok(SubmitResponse {
                submission_id: result.submission_id,
                redirect_url: result.redirect_url,
            })
            .with_message("Response submitted successfully")
            .respond(StatusCode::CREATED),
            Err(e) => error_from_surveyhub(&e),
        },
    )
}

pub async fn list_for_survey(
    path: web::Path<String>,
    submissions: web::Data<Arc<SubmissionService>>,
) -> ActixResult<impl Responder> {
    Ok(match submissions.list_for_survey(&path).await {
        Ok((survey, rows)) => {
            let rows: Vec<SubmissionResponse> =
                rows.into_iter().map(SubmissionResponse::from).collect();
            ApiResponse::ok(rows)
                .with_extra("survey", SurveyResponse::from(survey))
                .respond(StatusCode::OK)
        }
        Err(e) => error_from_surveyhub(&e),
    })
}

pub async fn export_for_survey(
    path: web::Path<String>,
    submissions: web::Data<Arc<SubmissionService>>,
) -> ActixResult<impl Responder> {
    Ok(match submissions.export_csv(&path).await {
        Ok((survey, csv)) => csv_response(&format!("submissions_{}", survey.id), csv),
        Err(e) => error_from_surveyhub(&e),
    })
}

/// 提交路由 `/api/submission`
pub fn submission_routes() -> actix_web::Scope {
    web::scope("/api/submission")
        .service(
            web::scope("/survey")
                .wrap(AdminAuth)
                .route("/{survey_id}", web::get().to(list_for_survey))
                .route("/{survey_id}/export", web::get().to(export_for_survey)),
        )
        .route("/{survey_id}", web::post().to(submit))
}

//! `/api/survey` 端点：问卷管理、点击回调、点击报表、受访者取卷

use std::collections::BTreeMap;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::LOCATION;
use actix_web::{HttpRequest, HttpResponse, Responder, Result as ActixResult, web};
use tracing::{info, trace};

use crate::api::middleware::AdminAuth;
use crate::errors::SurveyhubError;
use crate::services::{
    ClickService, CreateSurveyRequest, SubmissionService, SurveyListParams, SurveyService,
    UpdateSurveyRequest,
};
use crate::storage::ClickStatus;
use crate::utils::ip::extract_client_ip;

use super::helpers::{ApiResponse, api_result, csv_response, error_from_surveyhub};
use super::types::{
    ClickExportQuery, ClickResponse, CreateSurveyBody, PublicSurveyResponse, SearchQuery,
    SurveyListQuery, SurveyResponse, SurveyStatsResponse, ToggleResponse, UpdateSurveyBody,
};

/// 问卷列表（分页 + 搜索 + 排序）
pub async fn list_surveys(
    query: web::Query<SurveyListQuery>,
    surveys: web::Data<Arc<SurveyService>>,
) -> ActixResult<impl Responder> {
    trace!("Survey API: list with {:?}", query);
    let query = query.into_inner();
    let params = SurveyListParams {
        page: query.page,
        limit: query.limit,
        search: query.search,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
    };

    Ok(match surveys.list_surveys(&params).await {
        Ok(page) => {
            let items: Vec<SurveyResponse> =
                page.items.iter().cloned().map(SurveyResponse::from).collect();
            ApiResponse::ok(items)
                .with_pagination(&page)
                .respond(StatusCode::OK)
        }
        Err(e) => error_from_surveyhub(&e),
    })
}

pub async fn create_survey(
    body: web::Json<CreateSurveyBody>,
    surveys: web::Data<Arc<SurveyService>>,
) -> ActixResult<impl Responder> {
    let body = body.into_inner();
    let req = CreateSurveyRequest {
        survey_name: body.survey_name,
        description: body.description,
        project_id_from_client: body.project_id_from_client,
        project_id_from_inter: body.project_id_from_inter,
        questions: body.questions,
        redirect_url: body.redirect_url,
        max_responses: body.max_responses,
    };

    Ok(match surveys.create_survey(req).await {
        Ok(created) => ApiResponse::ok(SurveyResponse::from(created.survey))
            .with_message("Survey created successfully")
            .with_extra("generatedLink", created.generated_link)
            .respond(StatusCode::CREATED),
        Err(e) => error_from_surveyhub(&e),
    })
}

pub async fn get_survey(
    path: web::Path<String>,
    surveys: web::Data<Arc<SurveyService>>,
) -> ActixResult<impl Responder> {
    Ok(match surveys.get_survey(&path).await {
        Ok(detail) => ApiResponse::ok(SurveyResponse::from(detail.survey))
            .with_extra("stats", SurveyStatsResponse::from(detail.stats))
            .respond(StatusCode::OK),
        Err(e) => error_from_surveyhub(&e),
    })
}

pub async fn update_survey(
    path: web::Path<String>,
    body: web::Json<UpdateSurveyBody>,
    surveys: web::Data<Arc<SurveyService>>,
) -> ActixResult<impl Responder> {
    let body = body.into_inner();
    let req = UpdateSurveyRequest {
        survey_name: body.survey_name,
        description: body.description,
        project_id_from_client: body.project_id_from_client,
        project_id_from_inter: body.project_id_from_inter,
        questions: body.questions,
        redirect_url: body.redirect_url,
        max_responses: body.max_responses,
    };

    Ok(match surveys.update_survey(&path, req).await {
        Ok(survey) => ApiResponse::ok(SurveyResponse::from(survey))
            .with_message("Survey updated successfully")
            .respond(StatusCode::OK),
        Err(e) => error_from_surveyhub(&e),
    })
}

pub async fn delete_survey(
    path: web::Path<String>,
    surveys: web::Data<Arc<SurveyService>>,
) -> ActixResult<impl Responder> {
    Ok(match surveys.delete_survey(&path).await {
        Ok(()) => ApiResponse::message_only("Survey deleted successfully").respond(StatusCode::OK),
        Err(e) => error_from_surveyhub(&e),
    })
}

pub async fn toggle_survey(
    path: web::Path<String>,
    surveys: web::Data<Arc<SurveyService>>,
) -> ActixResult<impl Responder> {
    Ok(match surveys.toggle_survey(&path).await {
        Ok(survey) => {
            let message = if survey.is_active {
                "Survey activated"
            } else {
                "Survey deactivated"
            };
            ApiResponse::ok(ToggleResponse {
                is_active: survey.is_active,
            })
            .with_message(message)
            .respond(StatusCode::OK)
        }
        Err(e) => error_from_surveyhub(&e),
    })
}

/// 公开：点击回调。配置了落地页时 302，否则返回记录
pub async fn capture_click(
    req: HttpRequest,
    query: web::Query<BTreeMap<String, String>>,
    clicks: web::Data<Arc<ClickService>>,
) -> ActixResult<impl Responder> {
    let ip = extract_client_ip(&req);

    Ok(match clicks.capture(query.into_inner(), ip).await {
        Ok(outcome) => match outcome.landing_url {
            Some(url) => HttpResponse::Found()
                .insert_header((LOCATION, url))
                .finish(),
            None => ApiResponse::ok(ClickResponse::from(outcome.click))
                .with_message("Response recorded")
                .respond(StatusCode::OK),
        },
        Err(e) => error_from_surveyhub(&e),
    })
}

async fn click_report(
    clicks: &ClickService,
    status: Option<ClickStatus>,
    search: Option<String>,
) -> HttpResponse {
    let result = clicks.list_clicks(status, search).await.map(|rows| {
        rows.into_iter()
            .map(ClickResponse::from)
            .collect::<Vec<_>>()
    });
    if let Ok(ref rows) = result {
        info!(
            "Click report: status={:?}, {} rows",
            status.map(|s| s.to_string()),
            rows.len()
        );
    }
    api_result(result)
}

pub async fn complete_report(
    query: web::Query<SearchQuery>,
    clicks: web::Data<Arc<ClickService>>,
) -> ActixResult<impl Responder> {
    Ok(click_report(&clicks, Some(ClickStatus::Complete), query.into_inner().search).await)
}

pub async fn terminate_report(
    query: web::Query<SearchQuery>,
    clicks: web::Data<Arc<ClickService>>,
) -> ActixResult<impl Responder> {
    Ok(click_report(&clicks, Some(ClickStatus::Terminate), query.into_inner().search).await)
}

pub async fn quota_full_report(
    query: web::Query<SearchQuery>,
    clicks: web::Data<Arc<ClickService>>,
) -> ActixResult<impl Responder> {
    Ok(click_report(&clicks, Some(ClickStatus::QuotaFull), query.into_inner().search).await)
}

pub async fn all_clicks_report(
    query: web::Query<SearchQuery>,
    clicks: web::Data<Arc<ClickService>>,
) -> ActixResult<impl Responder> {
    Ok(click_report(&clicks, None, query.into_inner().search).await)
}

pub async fn export_clicks(
    query: web::Query<ClickExportQuery>,
    clicks: web::Data<Arc<ClickService>>,
) -> ActixResult<impl Responder> {
    let query = query.into_inner();
    let status = match query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => match raw.parse::<ClickStatus>() {
            Ok(status) => Some(status),
            Err(e) => return Ok(error_from_surveyhub(&SurveyhubError::validation(e))),
        },
        None => None,
    };

    let prefix = status.map_or("clicks".to_string(), |s| format!("clicks_{}", s));
    Ok(match clicks.export_csv(status, query.search).await {
        Ok(csv) => csv_response(&prefix, csv),
        Err(e) => error_from_surveyhub(&e),
    })
}

/// 公开：受访者取卷（仅 Live）
pub async fn public_survey(
    path: web::Path<String>,
    submissions: web::Data<Arc<SubmissionService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        submissions
            .public_survey(&path)
            .await
            .map(PublicSurveyResponse::from),
    ))
}

/// 问卷路由 `/api/survey`
///
/// 公开：
/// - GET /click - 结果回调
/// - GET /public/{id} - 受访者取卷
///
/// 其余需要管理员 token。
pub fn survey_routes() -> actix_web::Scope {
    web::scope("/api/survey")
        .route("/click", web::get().to(capture_click))
        .route("/public/{id}", web::get().to(public_survey))
        .service(
            web::scope("")
                .wrap(AdminAuth)
                .route("", web::get().to(list_surveys))
                .route("", web::post().to(create_survey))
                .route("/getServey", web::get().to(list_surveys))
                .route("/create", web::post().to(create_survey))
                .route("/getServey/{id}", web::get().to(get_survey))
                .route("/update/{id}", web::put().to(update_survey))
                .route("/surveys/{id}", web::delete().to(delete_survey))
                .route("/survey/toggle/{id}", web::patch().to(toggle_survey))
                .route("/complete-survey", web::get().to(complete_report))
                .route("/terminate-survey", web::get().to(terminate_report))
                .route("/quota-full-surveys", web::get().to(quota_full_report))
                .route("/get-clicks", web::get().to(all_clicks_report))
                .route("/clicks/export", web::get().to(export_clicks)),
        )
}

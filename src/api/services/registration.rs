//! `/api/registration` 与 `/api/otp` 端点

use std::sync::Arc;

use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::http::StatusCode;
use actix_web::{Responder, Result as ActixResult, web};
use governor::middleware::NoOpMiddleware;
use tracing::debug;

use crate::api::middleware::AdminAuth;
use crate::services::{OtpService, RegistrationListParams, RegistrationService};

use super::admin::ClientIpKeyExtractor;
use super::helpers::{ApiResponse, api_result, csv_response, error_from_surveyhub};
use super::types::{
    OtpSendBody, OtpSentResponse, OtpVerifyBody, RegistrationBody, RegistrationListQuery,
    RegistrationResponse, SearchQuery,
};

/// 公开：提交注册表单
pub async fn add_registration(
    body: web::Json<RegistrationBody>,
    registrations: web::Data<Arc<RegistrationService>>,
) -> ActixResult<impl Responder> {
    Ok(
        match registrations.register(body.into_inner().into()).await {
            Ok(reg) => ApiResponse::ok(RegistrationResponse::from(reg))
                .with_message("Registration successful")
                .respond(StatusCode::CREATED),
            Err(e) => error_from_surveyhub(&e),
        },
    )
}

pub async fn list_registrations(
    query: web::Query<RegistrationListQuery>,
    registrations: web::Data<Arc<RegistrationService>>,
) -> ActixResult<impl Responder> {
    let query = query.into_inner();
    let params = RegistrationListParams {
        page: query.page,
        limit: query.limit,
        search: query.search,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
    };

    Ok(match registrations.list_registrations(&params).await {
        Ok(page) => {
            let items: Vec<RegistrationResponse> = page
                .items
                .iter()
                .cloned()
                .map(RegistrationResponse::from)
                .collect();
            ApiResponse::ok(items)
                .with_pagination(&page)
                .respond(StatusCode::OK)
        }
        Err(e) => error_from_surveyhub(&e),
    })
}

pub async fn get_registration(
    path: web::Path<String>,
    registrations: web::Data<Arc<RegistrationService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        registrations
            .get_registration(&path)
            .await
            .map(RegistrationResponse::from),
    ))
}

pub async fn export_registrations(
    query: web::Query<SearchQuery>,
    registrations: web::Data<Arc<RegistrationService>>,
) -> ActixResult<impl Responder> {
    Ok(
        match registrations.export_csv(query.into_inner().search).await {
            Ok(csv) => csv_response("registrations", csv),
            Err(e) => error_from_surveyhub(&e),
        },
    )
}

/// 公开：发送验证码
pub async fn send_otp(
    body: web::Json<OtpSendBody>,
    otp: web::Data<Arc<OtpService>>,
) -> ActixResult<impl Responder> {
    Ok(match otp.send_otp(&body.email).await {
        Ok(sent) => ApiResponse::ok(OtpSentResponse {
            email: sent.email,
            expires_in: sent.expires_in_secs,
        })
        .with_message("OTP sent to your email")
        .respond(StatusCode::OK),
        Err(e) => error_from_surveyhub(&e),
    })
}

/// 公开：校验验证码
pub async fn verify_otp(
    body: web::Json<OtpVerifyBody>,
    otp: web::Data<Arc<OtpService>>,
) -> ActixResult<impl Responder> {
    Ok(match otp.verify_otp(&body.email, &body.otp).await {
        Ok(()) => ApiResponse::message_only("Email verified successfully").respond(StatusCode::OK),
        Err(e) => error_from_surveyhub(&e),
    })
}

/// 发送验证码的 IP 级限流（邮箱级冷却由服务层负责）
pub fn otp_rate_limiter() -> Governor<ClientIpKeyExtractor, NoOpMiddleware> {
    let config = GovernorConfigBuilder::default()
        .seconds_per_request(10)
        .burst_size(5)
        .key_extractor(ClientIpKeyExtractor)
        .finish()
        .expect("Invalid rate limit config");

    debug!("OTP rate limiter created: 1 req/10s, burst 5");
    Governor::new(&config)
}

/// 注册路由 `/api/registration`
pub fn registration_routes() -> actix_web::Scope {
    web::scope("/api/registration")
        .route("/add", web::post().to(add_registration))
        .service(
            web::scope("")
                .wrap(AdminAuth)
                .route("/get", web::get().to(list_registrations))
                .route("/getbyid/{id}", web::get().to(get_registration))
                .route("/export", web::get().to(export_registrations)),
        )
}

/// 验证码路由 `/api/otp`
pub fn otp_routes() -> actix_web::Scope {
    web::scope("/api/otp")
        .route("/send", web::post().to(send_otp).wrap(otp_rate_limiter()))
        .route("/verify", web::post().to(verify_otp))
}

//! `/api/admin` 端点：登录、资料、修改密码

use std::sync::Arc;

use actix_governor::{Governor, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError};
use actix_web::dev::ServiceRequest;
use actix_web::http::StatusCode;
use actix_web::{HttpMessage, HttpRequest, Responder, Result as ActixResult, web};
use governor::middleware::NoOpMiddleware;
use tracing::debug;

use crate::api::middleware::{AdminAuth, AdminIdentity};
use crate::errors::SurveyhubError;
use crate::services::AdminService;
use crate::utils::ip::extract_client_ip;

use super::helpers::{ApiResponse, error_from_surveyhub};
use super::types::{AdminResponse, ChangePasswordBody, LoginCredentials};

/// 基于客户端 IP 的限流 key 提取器
///
/// 只有来自可信代理（或私有地址）的连接才采用转发头里的地址。
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        let ip = extract_client_ip(req.request())
            .ok_or_else(|| SimpleKeyExtractionError::new("Unable to extract client IP"))?;
        debug!("Rate limit key: {}", ip);
        Ok(ip)
    }
}

/// 登录限流：每秒补充 1 个令牌，突发 5 次
pub fn login_rate_limiter() -> Governor<ClientIpKeyExtractor, NoOpMiddleware> {
    let config = GovernorConfigBuilder::default()
        .seconds_per_request(1)
        .burst_size(5)
        .key_extractor(ClientIpKeyExtractor)
        .finish()
        .expect("Invalid rate limit config");

    debug!("Login rate limiter created: 1 req/s, burst 5");
    Governor::new(&config)
}

pub async fn login(
    body: web::Json<LoginCredentials>,
    admins: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    Ok(match admins.login(&body.username, &body.password).await {
        Ok(result) => ApiResponse::message_only("Login successful")
            .with_extra("token", result.token)
            .with_extra("admin", AdminResponse::from(result.admin))
            .respond(StatusCode::OK),
        Err(e) => error_from_surveyhub(&e),
    })
}

pub async fn get_admin(
    path: web::Path<String>,
    admins: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    Ok(match admins.get_admin(&path).await {
        Ok(admin) => ApiResponse::empty()
            .with_extra("admin", AdminResponse::from(admin))
            .respond(StatusCode::OK),
        Err(e) => error_from_surveyhub(&e),
    })
}

/// 修改密码。`adminId` 为空时使用 token 中的管理员
pub async fn change_password(
    req: HttpRequest,
    body: web::Json<ChangePasswordBody>,
    admins: web::Data<Arc<AdminService>>,
) -> ActixResult<impl Responder> {
    let body = body.into_inner();
    let identity = req.extensions().get::<AdminIdentity>().cloned();

    let admin_id = match (body.admin_id.trim(), identity) {
        ("", Some(identity)) => identity.id,
        ("", None) => {
            return Ok(error_from_surveyhub(&SurveyhubError::validation(
                "adminId is required",
            )));
        }
        (id, Some(identity)) if id != identity.id => {
            return Ok(error_from_surveyhub(&SurveyhubError::unauthorized(
                "Cannot change another admin's password",
            )));
        }
        (id, _) => id.to_string(),
    };

    if body.current_password.is_empty() || body.new_password.is_empty() {
        return Ok(error_from_surveyhub(&SurveyhubError::validation(
            "currentPassword and newPassword are required",
        )));
    }

    Ok(
        match admins
            .change_password(&admin_id, &body.current_password, &body.new_password)
            .await
        {
            Ok(()) => {
                ApiResponse::message_only("Password changed successfully").respond(StatusCode::OK)
            }
            Err(e) => error_from_surveyhub(&e),
        },
    )
}

/// 管理员路由 `/api/admin`
///
/// - POST /login - 登录（带限流）
/// - GET /getAdmin/{id} - 管理员资料
/// - POST /changePassword - 修改密码
pub fn admin_routes() -> actix_web::Scope {
    web::scope("/api/admin")
        .route("/login", web::post().to(login).wrap(login_rate_limiter()))
        .service(
            web::scope("")
                .wrap(AdminAuth)
                .route("/getAdmin/{id}", web::get().to(get_admin))
                .route("/changePassword", web::post().to(change_password)),
        )
}

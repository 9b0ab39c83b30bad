//! `/api/surveylink` 端点：跳转链接管理（全部需要管理员 token）

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{Responder, Result as ActixResult, web};

use crate::api::middleware::AdminAuth;
use crate::services::{CreateLinkRequest, LinkService, UpdateLinkRequest};
use crate::storage::ClickStatus;

use super::helpers::{ApiResponse, api_result, error_from_surveyhub};
use super::types::{CreateLinkBody, LinkResponse, LinkStatusBody, UpdateLinkBody};

pub async fn list_links(links: web::Data<Arc<LinkService>>) -> ActixResult<impl Responder> {
    Ok(api_result(links.list_links().await.map(|rows| {
        rows.into_iter().map(LinkResponse::from).collect::<Vec<_>>()
    })))
}

pub async fn create_link(
    body: web::Json<CreateLinkBody>,
    links: web::Data<Arc<LinkService>>,
) -> ActixResult<impl Responder> {
    let body = body.into_inner();
    let req = CreateLinkRequest {
        name: body.name,
        parameters: body.parameters,
        status: body.status.unwrap_or(ClickStatus::Complete),
    };

    Ok(match links.create_link(req).await {
        Ok(link) => ApiResponse::ok(LinkResponse::from(link))
            .with_message("Link created successfully")
            .respond(StatusCode::CREATED),
        Err(e) => error_from_surveyhub(&e),
    })
}

pub async fn get_link(
    path: web::Path<String>,
    links: web::Data<Arc<LinkService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(links.get_link(&path).await.map(LinkResponse::from)))
}

pub async fn update_link(
    path: web::Path<String>,
    body: web::Json<UpdateLinkBody>,
    links: web::Data<Arc<LinkService>>,
) -> ActixResult<impl Responder> {
    let body = body.into_inner();
    let req = UpdateLinkRequest {
        name: body.name,
        parameters: body.parameters,
        status: body.status,
    };

    Ok(match links.update_link(&path, req).await {
        Ok(link) => ApiResponse::ok(LinkResponse::from(link))
            .with_message("Link updated successfully")
            .respond(StatusCode::OK),
        Err(e) => error_from_surveyhub(&e),
    })
}

pub async fn delete_link(
    path: web::Path<String>,
    links: web::Data<Arc<LinkService>>,
) -> ActixResult<impl Responder> {
    Ok(match links.delete_link(&path).await {
        Ok(()) => ApiResponse::message_only("Link deleted successfully").respond(StatusCode::OK),
        Err(e) => error_from_surveyhub(&e),
    })
}

pub async fn toggle_link_status(
    path: web::Path<String>,
    body: web::Json<LinkStatusBody>,
    links: web::Data<Arc<LinkService>>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        links
            .set_active(&path, body.is_active)
            .await
            .map(LinkResponse::from),
    ))
}

/// 链接路由 `/api/surveylink`
pub fn survey_link_routes() -> actix_web::Scope<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    web::scope("/api/surveylink")
        .wrap(AdminAuth)
        .route("/get-links", web::get().to(list_links))
        .route("/links", web::post().to(create_link))
        .route("/links/{id}/toggle-status", web::put().to(toggle_link_status))
        .route("/links/{id}", web::get().to(get_link))
        .route("/links/{id}", web::put().to(update_link))
        .route("/links/{id}", web::delete().to(delete_link))
}

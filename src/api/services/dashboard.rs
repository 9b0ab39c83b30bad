//! `/api/dashboard` 统计端点

use std::sync::Arc;

use actix_web::{Responder, Result as ActixResult, web};
use tracing::trace;

use crate::api::middleware::AdminAuth;
use crate::services::{DashboardFilter, DashboardService};

use super::helpers::{api_result, error_from_surveyhub};
use super::types::{DashboardQuery, DashboardResponse};

pub async fn dashboard(
    query: web::Query<DashboardQuery>,
    service: web::Data<Arc<DashboardService>>,
) -> ActixResult<impl Responder> {
    let filter = match query.filter.as_deref().unwrap_or("").parse::<DashboardFilter>() {
        Ok(filter) => filter,
        Err(e) => return Ok(error_from_surveyhub(&e)),
    };
    trace!("Dashboard summary requested, filter={:?}", filter);

    Ok(api_result(
        service.summary(filter).await.map(DashboardResponse::from),
    ))
}

pub fn dashboard_routes() -> actix_web::Scope<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    web::scope("/api/dashboard")
        .wrap(AdminAuth)
        .route("/dashboard", web::get().to(dashboard))
}

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::http::StatusCode;
use actix_web::{Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, trace};

use crate::storage::SeaOrmStorage;

use super::helpers::ApiResponse;

/// 应用启动时间
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthReport {
    status: &'static str,
    database: &'static str,
    backend: String,
    timestamp: String,
    uptime: i64,
    response_time_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// 存活 + 数据库检查，直接访问存储层
pub async fn health_check(
    storage: web::Data<Arc<SeaOrmStorage>>,
    app_start_time: web::Data<AppStartTime>,
) -> impl Responder {
    let start = Instant::now();
    trace!("Received health check request");

    let db_error = match tokio::time::timeout(Duration::from_secs(5), storage.ping()).await {
        Ok(Ok(())) => None,
        Ok(Err(e)) => {
            error!("Database health check failed: {}", e);
            Some("database error".to_string())
        }
        Err(_) => {
            error!("Database health check timeout");
            Some("timeout".to_string())
        }
    };

    let healthy = db_error.is_none();
    let now = Utc::now();
    let report = HealthReport {
        status: if healthy { "healthy" } else { "unhealthy" },
        database: if healthy { "up" } else { "down" },
        backend: storage.backend_name().to_string(),
        timestamp: now.to_rfc3339(),
        uptime: (now - app_start_time.start_datetime).num_seconds().max(0),
        response_time_ms: start.elapsed().as_millis(),
        error: db_error,
    };

    if healthy {
        ApiResponse::ok(report)
            .with_message("OK")
            .respond(StatusCode::OK)
    } else {
        let mut body = ApiResponse::ok(report).with_message("Service Unavailable");
        body.success = false;
        body.respond(StatusCode::SERVICE_UNAVAILABLE)
    }
}

pub fn health_routes() -> actix_web::Scope {
    web::scope("/health").route("", web::get().to(health_check))
}

//! API 帮助函数：统一响应信封、错误映射、CSV 下载

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use actix_web::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, RETRY_AFTER};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::errors::SurveyhubError;
use crate::services::Page;
use crate::utils::csv_handler::export_filename;

use super::types::PaginationInfo;

/// 统一响应信封 `{ success, message?, data?, pagination?, ...extra }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            pagination: None,
            extra: Map::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_pagination<I>(mut self, page: &Page<I>) -> Self {
        self.pagination = Some(PaginationInfo::from(page));
        self
    }

    /// 附加顶层字段；序列化失败的值记为 null
    pub fn with_extra(mut self, key: &str, value: impl Serialize) -> Self {
        self.extra.insert(
            key.to_string(),
            serde_json::to_value(value).unwrap_or(Value::Null),
        );
        self
    }

    pub fn respond(self, status: StatusCode) -> HttpResponse {
        HttpResponse::build(status)
            .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
            .json(self)
    }
}

impl ApiResponse<()> {
    /// 没有 data 的成功响应，字段通过 `with_extra` 附加
    pub fn empty() -> Self {
        Self {
            success: true,
            message: None,
            data: None,
            pagination: None,
            extra: Map::new(),
        }
    }

    pub fn message_only(message: impl Into<String>) -> Self {
        Self::empty().with_message(message)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            pagination: None,
            extra: Map::new(),
        }
    }
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    ApiResponse::ok(data).respond(StatusCode::OK)
}

/// 构建错误响应
pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    ApiResponse::failure(message).respond(status)
}

/// 从 SurveyhubError 构建错误响应（自动映射 HTTP 状态码）
pub fn error_from_surveyhub(err: &SurveyhubError) -> HttpResponse {
    let status = err.http_status();
    if err.is_internal() {
        error!("API error [{}]: {}", err.code(), err);
        // 内部错误不向客户端暴露细节
        return error_response(status, "Internal server error");
    }
    info!("API client error [{}]: {}", err.code(), err);

    if let SurveyhubError::RateLimited {
        message,
        retry_after_secs,
    } = err
    {
        return HttpResponse::build(status)
            .insert_header((RETRY_AFTER, retry_after_secs.to_string()))
            .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
            .json(ApiResponse::failure(message.clone()).with_extra("retryAfter", retry_after_secs));
    }

    error_response(status, err.message())
}

/// 统一 Result → HttpResponse 转换
///
/// 成功时返回 200 OK + `{success: true, data}`，失败时映射 SurveyhubError。
pub fn api_result<T, E>(result: Result<T, E>) -> HttpResponse
where
    T: Serialize,
    E: Into<SurveyhubError>,
{
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_surveyhub(&e.into()),
    }
}

/// CSV 下载响应，文件名带 UTC 日期
pub fn csv_response(prefix: &str, body: String) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/csv; charset=utf-8"))
        .insert_header((
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", export_filename(prefix)),
        ))
        .body(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(resp: HttpResponse) -> Value {
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_rt::test]
    async fn test_success_envelope() {
        let resp = success_response(vec![1, 2]);
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert!(json.get("message").is_none());
    }

    #[actix_rt::test]
    async fn test_extra_fields_are_top_level() {
        let resp = ApiResponse::ok("x")
            .with_extra("generatedLink", "http://h/survey/1")
            .respond(StatusCode::CREATED);
        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = body_json(resp).await;
        assert_eq!(json["generatedLink"], "http://h/survey/1");
    }

    #[actix_rt::test]
    async fn test_error_mapping() {
        let resp = error_from_surveyhub(&SurveyhubError::survey_quota_full("full"));
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "full");
    }

    #[actix_rt::test]
    async fn test_internal_error_is_masked() {
        let resp = error_from_surveyhub(&SurveyhubError::database_operation("secret dsn"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["message"], "Internal server error");
    }

    #[actix_rt::test]
    async fn test_rate_limited_sets_retry_after() {
        let resp = error_from_surveyhub(&SurveyhubError::rate_limited("wait", 42));
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers().get(RETRY_AFTER).unwrap(), "42");
        let json = body_json(resp).await;
        assert_eq!(json["retryAfter"], 42);
    }
}

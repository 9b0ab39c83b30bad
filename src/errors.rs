use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum SurveyhubError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    SurveyNotLive(String),
    SurveyQuotaFull(String),
    OtpInvalid(String),
    OtpExpired(String),
    RateLimited { message: String, retry_after_secs: u64 },
    Serialization(String),
    PasswordHash(String),
    TokenGeneration(String),
    DateParse(String),
}

impl SurveyhubError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            SurveyhubError::DatabaseConfig(_) => "E001",
            SurveyhubError::DatabaseConnection(_) => "E002",
            SurveyhubError::DatabaseOperation(_) => "E003",
            SurveyhubError::FileOperation(_) => "E004",
            SurveyhubError::Validation(_) => "E005",
            SurveyhubError::NotFound(_) => "E006",
            SurveyhubError::Conflict(_) => "E007",
            SurveyhubError::Unauthorized(_) => "E008",
            SurveyhubError::SurveyNotLive(_) => "E009",
            SurveyhubError::SurveyQuotaFull(_) => "E010",
            SurveyhubError::OtpInvalid(_) => "E011",
            SurveyhubError::OtpExpired(_) => "E012",
            SurveyhubError::RateLimited { .. } => "E013",
            SurveyhubError::Serialization(_) => "E014",
            SurveyhubError::PasswordHash(_) => "E015",
            SurveyhubError::TokenGeneration(_) => "E016",
            SurveyhubError::DateParse(_) => "E017",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            SurveyhubError::DatabaseConfig(_) => "Database Configuration Error",
            SurveyhubError::DatabaseConnection(_) => "Database Connection Error",
            SurveyhubError::DatabaseOperation(_) => "Database Operation Error",
            SurveyhubError::FileOperation(_) => "File Operation Error",
            SurveyhubError::Validation(_) => "Validation Error",
            SurveyhubError::NotFound(_) => "Resource Not Found",
            SurveyhubError::Conflict(_) => "Conflict",
            SurveyhubError::Unauthorized(_) => "Unauthorized",
            SurveyhubError::SurveyNotLive(_) => "Survey Not Live",
            SurveyhubError::SurveyQuotaFull(_) => "Survey Quota Full",
            SurveyhubError::OtpInvalid(_) => "Invalid OTP",
            SurveyhubError::OtpExpired(_) => "OTP Expired",
            SurveyhubError::RateLimited { .. } => "Rate Limited",
            SurveyhubError::Serialization(_) => "Serialization Error",
            SurveyhubError::PasswordHash(_) => "Password Hash Error",
            SurveyhubError::TokenGeneration(_) => "Token Generation Error",
            SurveyhubError::DateParse(_) => "Date Parse Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            SurveyhubError::DatabaseConfig(msg)
            | SurveyhubError::DatabaseConnection(msg)
            | SurveyhubError::DatabaseOperation(msg)
            | SurveyhubError::FileOperation(msg)
            | SurveyhubError::Validation(msg)
            | SurveyhubError::NotFound(msg)
            | SurveyhubError::Conflict(msg)
            | SurveyhubError::Unauthorized(msg)
            | SurveyhubError::SurveyNotLive(msg)
            | SurveyhubError::SurveyQuotaFull(msg)
            | SurveyhubError::OtpInvalid(msg)
            | SurveyhubError::OtpExpired(msg)
            | SurveyhubError::Serialization(msg)
            | SurveyhubError::PasswordHash(msg)
            | SurveyhubError::TokenGeneration(msg)
            | SurveyhubError::DateParse(msg) => msg,
            SurveyhubError::RateLimited { message, .. } => message,
        }
    }

    /// HTTP 状态码映射
    pub fn http_status(&self) -> StatusCode {
        match self {
            SurveyhubError::Validation(_)
            | SurveyhubError::OtpInvalid(_)
            | SurveyhubError::DateParse(_) => StatusCode::BAD_REQUEST,
            SurveyhubError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            SurveyhubError::SurveyNotLive(_) => StatusCode::FORBIDDEN,
            SurveyhubError::NotFound(_) => StatusCode::NOT_FOUND,
            SurveyhubError::Conflict(_) | SurveyhubError::SurveyQuotaFull(_) => {
                StatusCode::CONFLICT
            }
            SurveyhubError::OtpExpired(_) => StatusCode::GONE,
            SurveyhubError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            SurveyhubError::DatabaseConfig(_)
            | SurveyhubError::DatabaseConnection(_)
            | SurveyhubError::DatabaseOperation(_)
            | SurveyhubError::FileOperation(_)
            | SurveyhubError::Serialization(_)
            | SurveyhubError::PasswordHash(_)
            | SurveyhubError::TokenGeneration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 是否为服务端内部错误（需要 error 级别日志）
    pub fn is_internal(&self) -> bool {
        self.http_status().is_server_error()
    }

    /// 格式化为彩色输出（用于启动失败 / CLI）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for SurveyhubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for SurveyhubError {}

// 便捷的构造函数
impl SurveyhubError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        SurveyhubError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        SurveyhubError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        SurveyhubError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        SurveyhubError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        SurveyhubError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        SurveyhubError::NotFound(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        SurveyhubError::Conflict(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        SurveyhubError::Unauthorized(msg.into())
    }

    pub fn survey_not_live<T: Into<String>>(msg: T) -> Self {
        SurveyhubError::SurveyNotLive(msg.into())
    }

    pub fn survey_quota_full<T: Into<String>>(msg: T) -> Self {
        SurveyhubError::SurveyQuotaFull(msg.into())
    }

    pub fn otp_invalid<T: Into<String>>(msg: T) -> Self {
        SurveyhubError::OtpInvalid(msg.into())
    }

    pub fn otp_expired<T: Into<String>>(msg: T) -> Self {
        SurveyhubError::OtpExpired(msg.into())
    }

    pub fn rate_limited<T: Into<String>>(msg: T, retry_after_secs: u64) -> Self {
        SurveyhubError::RateLimited {
            message: msg.into(),
            retry_after_secs,
        }
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        SurveyhubError::Serialization(msg.into())
    }

    pub fn password_hash<T: Into<String>>(msg: T) -> Self {
        SurveyhubError::PasswordHash(msg.into())
    }

    pub fn token_generation<T: Into<String>>(msg: T) -> Self {
        SurveyhubError::TokenGeneration(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        SurveyhubError::DateParse(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for SurveyhubError {
    fn from(err: sea_orm::DbErr) -> Self {
        SurveyhubError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for SurveyhubError {
    fn from(err: std::io::Error) -> Self {
        SurveyhubError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for SurveyhubError {
    fn from(err: serde_json::Error) -> Self {
        SurveyhubError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for SurveyhubError {
    fn from(err: csv::Error) -> Self {
        SurveyhubError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for SurveyhubError {
    fn from(err: chrono::ParseError) -> Self {
        SurveyhubError::DateParse(err.to_string())
    }
}

impl From<crate::utils::password::PasswordError> for SurveyhubError {
    fn from(err: crate::utils::password::PasswordError) -> Self {
        SurveyhubError::PasswordHash(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SurveyhubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            SurveyhubError::validation("x").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SurveyhubError::survey_not_live("x").http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            SurveyhubError::survey_quota_full("x").http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            SurveyhubError::otp_expired("x").http_status(),
            StatusCode::GONE
        );
        assert_eq!(
            SurveyhubError::rate_limited("slow down", 30).http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            SurveyhubError::database_operation("x").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_message_and_display() {
        let err = SurveyhubError::not_found("survey abc not found");
        assert_eq!(err.message(), "survey abc not found");
        assert_eq!(err.code(), "E006");
        assert_eq!(
            err.to_string(),
            "Resource Not Found: survey abc not found"
        );
    }

    #[test]
    fn test_rate_limited_message() {
        let err = SurveyhubError::rate_limited("wait 42 seconds", 42);
        assert_eq!(err.message(), "wait 42 seconds");
        assert!(!err.is_internal());
    }

    #[test]
    fn test_from_db_err() {
        let err: SurveyhubError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, SurveyhubError::DatabaseOperation(_)));
        assert!(err.is_internal());
    }
}

//! 输入校验

use url::Url;

use crate::errors::{Result, SurveyhubError};

/// 危险协议列表
const DANGEROUS_PROTOCOLS: &[&str] = &[
    "javascript:",
    "data:",
    "file:",
    "vbscript:",
    "about:",
    "blob:",
];

/// 校验跳转地址：必须是合法的 http(s) URL
pub fn validate_redirect_url(raw: &str) -> Result<()> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(SurveyhubError::validation("Redirect URL is required"));
    }

    let lower = url.to_lowercase();
    if DANGEROUS_PROTOCOLS.iter().any(|p| lower.starts_with(p)) {
        return Err(SurveyhubError::validation(
            "Redirect URL protocol is not allowed",
        ));
    }
    if !lower.starts_with("http://") && !lower.starts_with("https://") {
        return Err(SurveyhubError::validation(
            "Redirect URL must start with http:// or https://",
        ));
    }

    Url::parse(url)
        .map(|_| ())
        .map_err(|e| SurveyhubError::validation(format!("Invalid redirect URL: {}", e)))
}

/// 简单邮箱格式校验：`local@domain.tld`
pub fn validate_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(email)
    } else {
        Err(SurveyhubError::validation("Invalid email address"))
    }
}

/// 必填字段：trim 后非空
pub fn require_non_blank(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(SurveyhubError::validation(format!("{} is required", field)))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_url() {
        assert!(validate_redirect_url("https://example.com/done").is_ok());
        assert!(validate_redirect_url("HTTP://example.com").is_ok());
        assert!(validate_redirect_url("").is_err());
        assert!(validate_redirect_url("javascript:alert(1)").is_err());
        assert!(validate_redirect_url("ftp://example.com").is_err());
        assert!(validate_redirect_url("http://").is_err());
    }

    #[test]
    fn test_email() {
        assert_eq!(
            validate_email("  Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
        assert!(validate_email("alice").is_err());
        assert!(validate_email("alice@localhost").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a b@example.com").is_err());
    }

    #[test]
    fn test_require_non_blank() {
        assert_eq!(require_non_blank("  x ", "name").unwrap(), "x");
        let err = require_non_blank("   ", "Survey name").unwrap_err();
        assert_eq!(err.message(), "Survey name is required");
    }
}

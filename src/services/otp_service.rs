//! E-mail OTP: send with resend cooldown, verify with attempt limit

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::{error, info, warn};

use crate::config::OtpConfig;
use crate::errors::{Result, SurveyhubError};
use crate::storage::SeaOrmStorage;
use crate::utils::generate_otp_code;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validators::validate_email;

/// 验证码投递通道
#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send(&self, email: &str, code: &str, ttl_secs: u64) -> Result<()>;
}

/// 默认实现：写日志（开发环境 / 未接入邮件服务时）
pub struct LogOtpSender;

#[async_trait]
impl OtpSender for LogOtpSender {
    async fn send(&self, email: &str, code: &str, ttl_secs: u64) -> Result<()> {
        info!(
            target: "surveyhub::otp",
            "OTP for {}: {} (valid for {} minutes)",
            email,
            code,
            ttl_secs / 60
        );
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct OtpSent {
    pub email: String,
    pub expires_in_secs: u64,
}

/// 验证码必须恰好 6 位数字
pub fn validate_code_format(code: &str) -> Result<&str> {
    let code = code.trim();
    if code.len() == 6 && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(code)
    } else {
        Err(SurveyhubError::otp_invalid("OTP must be exactly 6 digits"))
    }
}

pub struct OtpService {
    storage: Arc<SeaOrmStorage>,
    sender: Arc<dyn OtpSender>,
    config: OtpConfig,
}

impl OtpService {
    pub fn new(storage: Arc<SeaOrmStorage>, sender: Arc<dyn OtpSender>, config: OtpConfig) -> Self {
        Self {
            storage,
            sender,
            config,
        }
    }

    pub async fn send_otp(&self, email: &str) -> Result<OtpSent> {
        let email = validate_email(email)?;
        let now = Utc::now();

        if let Some(last) = self.storage.latest_otp(&email).await? {
            let ready_at = last.created_at + Duration::seconds(self.config.resend_cooldown_secs as i64);
            if ready_at > now {
                let wait = (ready_at - now).num_seconds().max(1) as u64;
                return Err(SurveyhubError::rate_limited(
                    format!("Please wait {} seconds before requesting a new code", wait),
                    wait,
                ));
            }
        }

        let code = generate_otp_code();
        let code_hash = hash_password(&code)?;
        let expires_at = now + Duration::seconds(self.config.code_ttl_secs as i64);
        let record = self.storage.insert_otp(&email, &code_hash, expires_at).await?;

        // 发送失败时撤回记录，不占用冷却时间
        if let Err(e) = self
            .sender
            .send(&email, &code, self.config.code_ttl_secs)
            .await
        {
            warn!("OTP delivery to {} failed: {}", email, e);
            if let Err(cleanup) = self.storage.delete_otp(record.id).await {
                error!("Failed to discard undelivered OTP {}: {}", record.id, cleanup);
            }
            return Err(e);
        }

        info!("OTP issued for {}", email);
        Ok(OtpSent {
            email,
            expires_in_secs: self.config.code_ttl_secs,
        })
    }

    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<()> {
        let email = validate_email(email)?;
        let code = validate_code_format(code)?;
        let now = Utc::now();

        let record = self
            .storage
            .latest_otp(&email)
            .await?
            .filter(|r| !r.verified)
            .ok_or_else(|| {
                SurveyhubError::otp_invalid("No pending code for this email, request a new one")
            })?;

        if record.expires_at <= now {
            return Err(SurveyhubError::otp_expired(
                "Code has expired, request a new one",
            ));
        }

        // 比对前先预占次数，并发猜测也不会超出上限
        let Some(attempts) = self
            .storage
            .reserve_otp_attempt(record.id, self.config.max_attempts)
            .await?
        else {
            return Err(SurveyhubError::otp_expired(
                "Too many failed attempts, request a new code",
            ));
        };

        if !verify_password(code, &record.code_hash)? {
            warn!("Wrong OTP for {} (attempt {})", email, attempts);
            if attempts >= self.config.max_attempts {
                return Err(SurveyhubError::otp_expired(
                    "Too many failed attempts, request a new code",
                ));
            }
            return Err(SurveyhubError::otp_invalid(format!(
                "Invalid code, {} attempts left",
                self.config.max_attempts - attempts
            )));
        }

        if !self.storage.mark_otp_verified(record.id, now).await? {
            return Err(SurveyhubError::otp_invalid("Code has already been used"));
        }
        info!("Email verified: {}", email);
        Ok(())
    }

    /// 验证窗口内是否有已验证的验证码
    pub async fn is_verified(&self, email: &str) -> Result<bool> {
        let since = Utc::now() - Duration::seconds(self.config.verification_window_secs as i64);
        self.storage.has_verified_otp_since(email, since).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_format() {
        assert_eq!(validate_code_format(" 012345 ").unwrap(), "012345");
        assert!(validate_code_format("12345").is_err());
        assert!(validate_code_format("1234567").is_err());
        assert!(matches!(
            validate_code_format("12a456"),
            Err(SurveyhubError::OtpInvalid(_))
        ));
    }
}

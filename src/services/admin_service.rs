//! Admin accounts: login, profile, password change and bootstrap

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::api::jwt::get_jwt_service;
use crate::errors::{Result, SurveyhubError};
use crate::storage::{Admin, SeaOrmStorage};
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validators::require_non_blank;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub token: String,
    pub admin: Admin,
}

pub fn validate_new_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(SurveyhubError::validation(format!(
            "New password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub struct AdminService {
    storage: Arc<SeaOrmStorage>,
}

impl AdminService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResult> {
        let username = require_non_blank(username, "username")?;
        if password.is_empty() {
            return Err(SurveyhubError::validation("password is required"));
        }

        // 用户不存在与密码错误返回相同信息
        let invalid = || SurveyhubError::unauthorized("Invalid username or password");
        let admin = self
            .storage
            .find_admin_by_username(&username)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password, &admin.password_hash)? {
            warn!("Failed login for admin: {}", username);
            return Err(invalid());
        }

        let token = get_jwt_service()
            .generate_access_token(&admin.id, &admin.username)
            .map_err(|e| SurveyhubError::token_generation(format!("Failed to issue token: {}", e)))?;

        info!("Admin logged in: {}", admin.username);
        Ok(LoginResult { token, admin })
    }

    pub async fn get_admin(&self, id: &str) -> Result<Admin> {
        self.storage
            .get_admin(id)
            .await?
            .ok_or_else(|| SurveyhubError::not_found(format!("Admin not found: {}", id)))
    }

    pub async fn change_password(&self, admin_id: &str, current: &str, new: &str) -> Result<()> {
        let admin = self.get_admin(admin_id).await?;

        if !verify_password(current, &admin.password_hash)? {
            return Err(SurveyhubError::unauthorized("Current password is incorrect"));
        }
        validate_new_password(new)?;
        if current == new {
            return Err(SurveyhubError::validation(
                "New password must differ from the current password",
            ));
        }

        let hash = hash_password(new)?;
        self.storage.update_admin_password(&admin.id, &hash).await?;
        info!("Password changed for admin: {}", admin.username);
        Ok(())
    }

    pub async fn create_admin(&self, username: &str, password: &str) -> Result<Admin> {
        let username = require_non_blank(username, "username")?;
        validate_new_password(password)?;

        let now = Utc::now();
        let admin = Admin {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            password_hash: hash_password(password)?,
            created_at: now,
            updated_at: now,
        };
        self.storage.insert_admin(&admin).await?;
        Ok(admin)
    }

    /// 按用户名重置密码（CLI 用，不校验旧密码）
    pub async fn reset_password(&self, username: &str, password: &str) -> Result<()> {
        validate_new_password(password)?;
        let admin = self
            .storage
            .find_admin_by_username(username)
            .await?
            .ok_or_else(|| SurveyhubError::not_found(format!("Admin not found: {}", username)))?;

        let hash = hash_password(password)?;
        self.storage.update_admin_password(&admin.id, &hash).await?;
        info!("Password reset for admin: {}", admin.username);
        Ok(())
    }

    /// 管理员表为空且配置了初始密码时创建一个管理员。返回是否创建
    pub async fn bootstrap(&self, username: &str, password: Option<&str>) -> Result<bool> {
        if self.storage.count_admins().await? > 0 {
            return Ok(false);
        }
        match password.filter(|p| !p.is_empty()) {
            Some(password) => {
                self.create_admin(username, password).await?;
                warn!("Bootstrap admin '{}' created from configuration", username);
                Ok(true)
            }
            None => {
                warn!(
                    "No admin account exists; set auth.bootstrap_password or run `surveyhub create-admin`"
                );
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length() {
        assert!(validate_new_password("12345").is_err());
        assert!(validate_new_password("123456").is_ok());
        // 按字符计数
        assert!(validate_new_password("密码密码密码").is_ok());
    }
}

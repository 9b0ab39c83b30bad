//! E-mail OTP codes

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ExprTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};

use super::converters::model_to_otp;
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, SurveyhubError};
use crate::storage::models::OtpRecord;

use migration::entities::otp_code;

/// 更新与读回在同一事务内，读到的是本次预占后的次数
async fn reserve_attempt_in_txn(
    db: &DatabaseConnection,
    id: i64,
    max_attempts: u32,
) -> std::result::Result<Option<u32>, DbErr> {
    let txn = db.begin().await?;

    let result = otp_code::Entity::update_many()
        .col_expr(
            otp_code::Column::Attempts,
            Expr::col(otp_code::Column::Attempts).add(1),
        )
        .filter(otp_code::Column::Id.eq(id))
        .filter(otp_code::Column::Verified.eq(false))
        .filter(otp_code::Column::Attempts.lt(max_attempts as i32))
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        txn.rollback().await?;
        return Ok(None);
    }

    let attempts = otp_code::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .map(|row| Ord::max(row.attempts, 0) as u32);

    txn.commit().await?;
    Ok(attempts)
}

impl SeaOrmStorage {
    pub async fn insert_otp(
        &self,
        email: &str,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<OtpRecord> {
        let db = &self.db;
        let model = otp_code::ActiveModel {
            id: NotSet,
            email: Set(email.to_string()),
            code_hash: Set(code_hash.to_string()),
            attempts: Set(0),
            verified: Set(false),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now()),
            verified_at: Set(None),
        };

        let inserted = retry::with_retry("insert_otp", self.retry_config, || async {
            model.clone().insert(db).await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("保存验证码失败: {}", e)))?;

        Ok(model_to_otp(inserted))
    }

    /// 该邮箱最近一次发出的验证码（不论状态）
    pub async fn latest_otp(&self, email: &str) -> Result<Option<OtpRecord>> {
        let db = &self.db;
        let model = retry::with_retry("latest_otp", self.retry_config, || async {
            otp_code::Entity::find()
                .filter(otp_code::Column::Email.eq(email))
                .order_by(otp_code::Column::CreatedAt, Order::Desc)
                .order_by(otp_code::Column::Id, Order::Desc)
                .one(db)
                .await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("查询验证码失败: {}", e)))?;

        Ok(model.map(model_to_otp))
    }

    /// 预占一次尝试：仅当未验证且次数 < `max_attempts` 时 +1。
    ///
    /// 返回预占后的次数；`None` 表示次数已用尽或已验证。
    pub async fn reserve_otp_attempt(&self, id: i64, max_attempts: u32) -> Result<Option<u32>> {
        let db = &self.db;
        retry::with_retry("reserve_otp_attempt", self.retry_config, || {
            reserve_attempt_in_txn(db, id, max_attempts)
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("更新验证码失败: {}", e)))
    }

    pub async fn delete_otp(&self, id: i64) -> Result<()> {
        let db = &self.db;
        retry::with_retry("delete_otp", self.retry_config, || async {
            otp_code::Entity::delete_by_id(id).exec(db).await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("删除验证码失败: {}", e)))?;
        Ok(())
    }

    /// 只有未验证的记录会被标记；返回是否成功标记
    pub async fn mark_otp_verified(&self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        let db = &self.db;
        let result = retry::with_retry("mark_otp_verified", self.retry_config, || async {
            otp_code::Entity::update_many()
                .col_expr(otp_code::Column::Verified, Expr::value(true))
                .col_expr(otp_code::Column::VerifiedAt, Expr::value(Some(at)))
                .filter(otp_code::Column::Id.eq(id))
                .filter(otp_code::Column::Verified.eq(false))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("更新验证码失败: {}", e)))?;

        Ok(result.rows_affected > 0)
    }

    /// `since` 之后是否有已验证的验证码
    pub async fn has_verified_otp_since(&self, email: &str, since: DateTime<Utc>) -> Result<bool> {
        let db = &self.db;
        let count = retry::with_retry("has_verified_otp_since", self.retry_config, || async {
            otp_code::Entity::find()
                .filter(otp_code::Column::Email.eq(email))
                .filter(otp_code::Column::Verified.eq(true))
                .filter(otp_code::Column::VerifiedAt.gte(since))
                .count(db)
                .await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("查询验证码失败: {}", e)))?;

        Ok(count > 0)
    }
}

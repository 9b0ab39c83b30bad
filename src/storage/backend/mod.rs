//! SeaORM storage backend
//!
//! Persists surveys, clicks, links, submissions, registrations, OTP codes
//! and admins through SeaORM, supporting SQLite, MySQL/MariaDB and
//! PostgreSQL. Each entity's operations live in their own file as an
//! `impl SeaOrmStorage` block.

mod admins;
mod clicks;
mod connection;
mod converters;
mod links;
mod otp;
mod registrations;
pub mod retry;
mod stats;
mod submissions;
mod surveys;

use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::sync::Cache;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, ExprTrait};
use tracing::{debug, warn};

use crate::errors::{Result, SurveyhubError};
use crate::storage::models::ClickStatus;

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use stats::{SurveyClickStats, WindowCounts};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(SurveyhubError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// 点击报表过滤条件
#[derive(Default, Clone, Debug)]
pub struct ClickFilter {
    pub status: Option<ClickStatus>,
    pub survey_id: Option<String>,
    /// 模糊匹配 userId / projectId / ipAddress
    pub search: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    /// 分页 COUNT 缓存（TTL 30秒）
    count_cache: Cache<String, u64>,
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(SurveyhubError::database_config("DATABASE_URL 未设置"));
        }

        let config = crate::config::get_config();
        let retry_config = retry::RetryConfig::from(&config.database);

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, backend_name).await?
        };

        run_migrations(&db).await?;

        let storage = Self::from_connection(db, backend_name, retry_config);
        warn!(
            "{} Storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    /// 使用已建立（且已迁移）的连接构造
    pub fn from_connection(
        db: DatabaseConnection,
        backend_name: &str,
        retry_config: retry::RetryConfig,
    ) -> Self {
        SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
            count_cache: Cache::builder()
                .time_to_live(Duration::from_secs(30))
                .max_capacity(100)
                .build(),
            retry_config,
        }
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// 获取数据库连接
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// 健康检查用
    pub async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| SurveyhubError::database_connection(format!("数据库不可用: {}", e)))
    }

    /// 清除分页 COUNT 缓存（数据变更时调用）
    pub fn invalidate_count_cache(&self) {
        self.count_cache.invalidate_all();
    }

    /// 带缓存的 COUNT
    async fn cached_count<F, Fut>(&self, cache_key: String, count: F) -> Result<u64>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<u64, sea_orm::DbErr>>,
    {
        if let Some(cached) = self.count_cache.get(&cache_key) {
            debug!("count cache hit: key={}, value={}", cache_key, cached);
            return Ok(cached);
        }

        let total = retry::with_retry(&cache_key, self.retry_config, count).await?;
        self.count_cache.insert(cache_key, total);
        Ok(total)
    }
}

/// 搜索词：trim 后为空视为未提供
pub(crate) fn search_term(search: &Option<String>) -> Option<String> {
    search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
}

/// 转义 LIKE 通配符，配合 `ESCAPE '\\'` 使用
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// 大小写不敏感的子串匹配（Postgres 的 LIKE 区分大小写，统一用 LOWER）
pub(crate) fn ilike<C: ColumnTrait>(col: C, term: &str) -> Condition {
    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
    Condition::all().add(
        Expr::expr(Func::lower(Expr::col((col.entity_name(), col))))
            .like(LikeExpr::new(pattern).escape('\\')),
    )
}

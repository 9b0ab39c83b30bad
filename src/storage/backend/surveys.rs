//! Survey persistence and the quota gate

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, ExprTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Select, TransactionTrait,
};
use tracing::{debug, info};

use super::converters::{model_to_survey, submission_to_active_model, survey_to_active_model};
use super::{SeaOrmStorage, ilike, retry, search_term};
use crate::errors::{Result, SurveyhubError};
use crate::storage::models::{
    ListQuery, QuotaOutcome, SortOrder, Submission, Survey, SurveySortField,
};

use migration::entities::{submission, survey};

/// 已满条件：max > 0 且 count >= max
fn full_condition() -> Condition {
    Condition::all()
        .add(survey::Column::MaxResponses.gt(0))
        .add(Expr::col(survey::Column::ResponseCount).gte(Expr::col(survey::Column::MaxResponses)))
}

/// 未满条件：max = 0 或 count < max
fn has_room_condition() -> Condition {
    Condition::any()
        .add(survey::Column::MaxResponses.eq(0))
        .add(Expr::col(survey::Column::ResponseCount).lt(Expr::col(survey::Column::MaxResponses)))
}

fn filtered_query(search: &Option<String>) -> Select<survey::Entity> {
    let mut query = survey::Entity::find();
    if let Some(term) = search_term(search) {
        query = query.filter(
            Condition::any()
                .add(ilike(survey::Column::SurveyName, &term))
                .add(ilike(survey::Column::Description, &term))
                .add(ilike(survey::Column::ProjectIdFromClient, &term))
                .add(ilike(survey::Column::ProjectIdFromInter, &term)),
        );
    }
    query
}

fn sort_column(field: SurveySortField) -> survey::Column {
    match field {
        SurveySortField::CreatedAt => survey::Column::CreatedAt,
        SurveySortField::SurveyName => survey::Column::SurveyName,
        SurveySortField::ResponseCount => survey::Column::ResponseCount,
        SurveySortField::MaxResponses => survey::Column::MaxResponses,
    }
}

pub(crate) fn order_of(order: SortOrder) -> Order {
    match order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    }
}

/// 事务内：满额时自动停用
async fn deactivate_if_full<C: ConnectionTrait>(conn: &C, id: &str) -> std::result::Result<u64, DbErr> {
    let result = survey::Entity::update_many()
        .col_expr(survey::Column::IsActive, Expr::value(false))
        .filter(survey::Column::Id.eq(id))
        .filter(survey::Column::IsActive.eq(true))
        .filter(full_condition())
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// 配额闸门事务。`None` 表示问卷不存在
///
/// 带 `record` 时答卷与计数在同一事务内写入，插入失败则计数一并回滚。
async fn increment_in_txn(
    db: &sea_orm::DatabaseConnection,
    id: &str,
    record: Option<&submission::ActiveModel>,
) -> std::result::Result<Option<QuotaOutcome>, DbErr> {
    let txn = db.begin().await?;

    let updated = survey::Entity::update_many()
        .col_expr(
            survey::Column::ResponseCount,
            Expr::col(survey::Column::ResponseCount).add(1),
        )
        .col_expr(survey::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(survey::Column::Id.eq(id))
        .filter(survey::Column::IsActive.eq(true))
        .filter(has_room_condition())
        .exec(&txn)
        .await?;

    let Some(row) = survey::Entity::find_by_id(id).one(&txn).await? else {
        txn.rollback().await?;
        return Ok(None);
    };

    let outcome = if updated.rows_affected == 1 {
        let count = Ord::max(row.response_count, 0) as u64;
        let now_full = deactivate_if_full(&txn, id).await? > 0;
        if let Some(model) = record {
            submission::Entity::insert(model.clone())
                .exec_without_returning(&txn)
                .await?;
        }
        QuotaOutcome::Accepted { count, now_full }
    } else {
        let current = model_to_survey(row);
        if current.is_full() {
            QuotaOutcome::Full
        } else {
            QuotaOutcome::NotLive
        }
    };

    txn.commit().await?;
    Ok(Some(outcome))
}

impl SeaOrmStorage {
    pub async fn insert_survey(&self, survey: &Survey) -> Result<()> {
        let db = &self.db;
        let model = survey_to_active_model(survey);

        retry::with_retry(
            &format!("insert_survey({})", survey.id),
            self.retry_config,
            || async { survey::Entity::insert(model.clone()).exec_without_returning(db).await },
        )
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("创建问卷失败: {}", e)))?;

        self.invalidate_count_cache();
        info!("Survey created: {} ({})", survey.survey_name, survey.id);
        Ok(())
    }

    pub async fn get_survey(&self, id: &str) -> Result<Option<Survey>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("get_survey({})", id), self.retry_config, || async {
            survey::Entity::find_by_id(id).one(db).await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("查询问卷失败: {}", e)))?;

        Ok(model.map(model_to_survey))
    }

    /// 分页查询，返回 (当前页, 总数)
    pub async fn list_surveys(&self, query: &ListQuery<SurveySortField>) -> Result<(Vec<Survey>, u64)> {
        let db = &self.db;
        let cache_key = format!(
            "surveys:{}",
            search_term(&query.search).unwrap_or_default()
        );

        let total = self
            .cached_count(cache_key, || async {
                filtered_query(&query.search).count(db).await
            })
            .await
            .map_err(|e| SurveyhubError::database_operation(format!("统计问卷失败: {}", e)))?;

        let page_query = filtered_query(&query.search)
            .order_by(sort_column(query.sort_by), order_of(query.sort_order))
            .order_by(survey::Column::Id, Order::Asc);

        let models = retry::with_retry("list_surveys", self.retry_config, || async {
            page_query
                .clone()
                .paginate(db, query.limit)
                .fetch_page(query.page.saturating_sub(1))
                .await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("查询问卷列表失败: {}", e)))?;

        debug!(
            "list_surveys: page={}, limit={}, total={}",
            query.page, query.limit, total
        );
        Ok((models.into_iter().map(model_to_survey).collect(), total))
    }

    /// 按内部项目 ID 查找（最新创建的优先）
    pub async fn find_survey_by_project_inter(&self, project_id: &str) -> Result<Option<Survey>> {
        let db = &self.db;
        let model = retry::with_retry("find_survey_by_project_inter", self.retry_config, || async {
            survey::Entity::find()
                .filter(survey::Column::ProjectIdFromInter.eq(project_id))
                .order_by(survey::Column::CreatedAt, Order::Desc)
                .one(db)
                .await
        })
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("查询问卷失败: {}", e)))?;

        Ok(model.map(model_to_survey))
    }

    /// 更新可编辑字段；`response_count` 不会被覆盖。
    /// 新的上限若已被当前计数达到，同一事务内停用问卷。
    pub async fn update_survey(&self, survey: &Survey) -> Result<Survey> {
        let questions = serde_json::to_string(&survey.questions)?;
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SurveyhubError::database_operation(format!("开始事务失败: {}", e)))?;

        let result = survey::Entity::update_many()
            .col_expr(survey::Column::SurveyName, Expr::value(survey.survey_name.clone()))
            .col_expr(survey::Column::Description, Expr::value(survey.description.clone()))
            .col_expr(
                survey::Column::ProjectIdFromClient,
                Expr::value(survey.project_id_from_client.clone()),
            )
            .col_expr(
                survey::Column::ProjectIdFromInter,
                Expr::value(survey.project_id_from_inter.clone()),
            )
            .col_expr(survey::Column::Questions, Expr::value(questions))
            .col_expr(survey::Column::RedirectUrl, Expr::value(survey.redirect_url.clone()))
            .col_expr(survey::Column::MaxResponses, Expr::value(survey.max_responses as i64))
            .col_expr(survey::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(survey::Column::Id.eq(survey.id.as_str()))
            .exec(&txn)
            .await
            .map_err(|e| SurveyhubError::database_operation(format!("更新问卷失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(SurveyhubError::not_found(format!("问卷不存在: {}", survey.id)));
        }

        if deactivate_if_full(&txn, &survey.id)
            .await
            .map_err(|e| SurveyhubError::database_operation(format!("更新问卷状态失败: {}", e)))?
            > 0
        {
            info!("Survey {} is full after max change, deactivated", survey.id);
        }

        let updated = survey::Entity::find_by_id(survey.id.as_str())
            .one(&txn)
            .await
            .map_err(|e| SurveyhubError::database_operation(format!("查询问卷失败: {}", e)))?
            .ok_or_else(|| SurveyhubError::not_found(format!("问卷不存在: {}", survey.id)))?;

        txn.commit()
            .await
            .map_err(|e| SurveyhubError::database_operation(format!("提交事务失败: {}", e)))?;

        self.invalidate_count_cache();
        Ok(model_to_survey(updated))
    }

    /// 删除问卷及其提交记录；点击记录保留
    pub async fn delete_survey(&self, id: &str) -> Result<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SurveyhubError::database_operation(format!("开始事务失败: {}", e)))?;

        let removed = submission::Entity::delete_many()
            .filter(submission::Column::SurveyId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| SurveyhubError::database_operation(format!("删除提交记录失败: {}", e)))?;

        let result = survey::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| SurveyhubError::database_operation(format!("删除问卷失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(SurveyhubError::not_found(format!("问卷不存在: {}", id)));
        }

        txn.commit()
            .await
            .map_err(|e| SurveyhubError::database_operation(format!("提交事务失败: {}", e)))?;

        self.invalidate_count_cache();
        info!(
            "Survey deleted: {} ({} submissions removed)",
            id, removed.rows_affected
        );
        Ok(())
    }

    /// 设置启用状态。启用只对未满问卷生效，返回是否有行被修改
    pub async fn set_survey_active(&self, id: &str, active: bool) -> Result<bool> {
        let db = &self.db;
        let result = retry::with_retry(
            &format!("set_survey_active({})", id),
            self.retry_config,
            || async {
                let mut update = survey::Entity::update_many()
                    .col_expr(survey::Column::IsActive, Expr::value(active))
                    .col_expr(survey::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(survey::Column::Id.eq(id));
                if active {
                    update = update.filter(has_room_condition());
                }
                update.exec(db).await
            },
        )
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("更新问卷状态失败: {}", e)))?;

        Ok(result.rows_affected > 0)
    }

    /// 配额闸门：原子地 `response_count + 1`，仅当问卷启用且未满。
    /// 本次恰好填满时同一事务内设置 `is_active = false`。
    pub async fn try_increment_response(&self, id: &str) -> Result<QuotaOutcome> {
        let db = &self.db;
        let outcome = retry::with_retry(
            &format!("try_increment_response({})", id),
            self.retry_config,
            || increment_in_txn(db, id, None),
        )
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("更新问卷计数失败: {}", e)))?
        .ok_or_else(|| SurveyhubError::not_found(format!("问卷不存在: {}", id)))?;

        if let QuotaOutcome::Accepted { now_full: true, count } = outcome {
            info!("Survey {} reached quota ({}), deactivated", id, count);
        }
        Ok(outcome)
    }

    /// 计数 + 写入答卷（同一事务）。只有 `Accepted` 时答卷才会落库
    pub async fn insert_submission_with_quota(&self, record: &Submission) -> Result<QuotaOutcome> {
        let db = &self.db;
        let id = record.survey_id.as_str();
        let model = submission_to_active_model(record);
        let model = &model;
        let outcome = retry::with_retry(
            &format!("insert_submission_with_quota({})", record.id),
            self.retry_config,
            || increment_in_txn(db, id, Some(model)),
        )
        .await
        .map_err(|e| SurveyhubError::database_operation(format!("保存提交记录失败: {}", e)))?
        .ok_or_else(|| SurveyhubError::not_found(format!("问卷不存在: {}", id)))?;

        if let QuotaOutcome::Accepted { now_full, count } = outcome {
            debug!("Submission stored: {} for survey {} ({})", record.id, id, count);
            if now_full {
                info!("Survey {} reached quota ({}), deactivated", id, count);
            }
        }
        Ok(outcome)
    }
}

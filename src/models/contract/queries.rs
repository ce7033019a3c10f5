use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use crate::errors::AppError;
use crate::models::template::FormValues;
use super::types::*;

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    user_id: Option<i64>,
    contract_type: String,
    title: String,
    content: String,
    form_data: Json<FormValues>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<Row> for Contract {
    type Error = AppError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Ok(Contract {
            id: row.id,
            user_id: row.user_id,
            contract_type: row.contract_type,
            title: row.title,
            content: row.content,
            form_data: row.form_data.0,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_contracts(rows: Vec<Row>) -> Result<Vec<Contract>, AppError> {
    rows.into_iter().map(Contract::try_from).collect()
}

const CONTRACT_COLUMNS: &str = "\
    id, user_id, contract_type, title, content, form_data, status, created_at, updated_at";

/// Escape LIKE wildcards so the search term matches literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub async fn insert(pool: &PgPool, new: &NewContract) -> Result<Contract, AppError> {
    let sql = format!(
        "INSERT INTO contracts (user_id, contract_type, title, content, form_data, status) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {CONTRACT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Row>(&sql)
        .bind(new.user_id)
        .bind(&new.contract_type)
        .bind(&new.title)
        .bind(&new.content)
        .bind(Json(&new.form_data))
        .bind(new.status.as_str())
        .fetch_one(pool)
        .await?;
    row.try_into()
}

/// The user's contracts, newest first.
pub async fn find_for_user(pool: &PgPool, user_id: i64, filter: &ContractFilter) -> Result<Vec<Contract>, AppError> {
    let sql = format!(
        "SELECT {CONTRACT_COLUMNS} FROM contracts \
         WHERE user_id = $1 \
           AND ($2::text IS NULL OR status = $2) \
           AND ($3::text IS NULL OR title ILIKE '%' || $3 || '%') \
         ORDER BY created_at DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, Row>(&sql)
        .bind(user_id)
        .bind(filter.status.map(ContractStatus::as_str))
        .bind(filter.search_term().map(escape_like))
        .fetch_all(pool)
        .await?;
    into_contracts(rows)
}

pub async fn stats_for_user(pool: &PgPool, user_id: i64) -> Result<ContractStats, AppError> {
    #[derive(sqlx::FromRow)]
    struct StatsRow {
        total: i64,
        draft: i64,
        completed: i64,
        pending: i64,
    }

    let row = sqlx::query_as::<_, StatsRow>(
        "SELECT COUNT(*) AS total, \
                COUNT(*) FILTER (WHERE status = 'draft') AS draft, \
                COUNT(*) FILTER (WHERE status = 'completed') AS completed, \
                COUNT(*) FILTER (WHERE status = 'pending') AS pending \
         FROM contracts WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(ContractStats {
        total: row.total,
        draft: row.draft,
        completed: row.completed,
        pending: row.pending,
    })
}

/// Contract by id, only if owned by `user_id`.
pub async fn find_owned(pool: &PgPool, id: i64, user_id: i64) -> Result<Option<Contract>, AppError> {
    let sql = format!("SELECT {CONTRACT_COLUMNS} FROM contracts WHERE id = $1 AND user_id = $2");
    let row = sqlx::query_as::<_, Row>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    row.map(Contract::try_from).transpose()
}

/// Overwrite an owned contract. `None` when no owned row matched.
pub async fn update_owned(
    pool: &PgPool,
    id: i64,
    user_id: i64,
    update: &ContractUpdate,
) -> Result<Option<Contract>, AppError> {
    let sql = format!(
        "UPDATE contracts \
         SET title = $3, content = $4, form_data = $5, status = $6, updated_at = now() \
         WHERE id = $1 AND user_id = $2 \
         RETURNING {CONTRACT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Row>(&sql)
        .bind(id)
        .bind(user_id)
        .bind(&update.title)
        .bind(&update.content)
        .bind(Json(&update.form_data))
        .bind(update.status.as_str())
        .fetch_optional(pool)
        .await?;
    row.map(Contract::try_from).transpose()
}

pub async fn delete_owned(pool: &PgPool, id: i64, user_id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM contracts WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

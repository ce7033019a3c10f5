use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::errors::AppError;
use super::types::{AuthCode, CodePurpose, NewUser, User};

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    company: Option<String>,
    email_confirmed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Row> for User {
    fn from(row: Row) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            company: row.company,
            email_confirmed_at: row.email_confirmed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "\
    id, email, password_hash, first_name, last_name, company, \
    email_confirmed_at, created_at, updated_at";

/// Insert a new account. A duplicate email (case-insensitive) is a `Conflict`.
pub async fn create(pool: &PgPool, new: &NewUser) -> Result<User, AppError> {
    let sql = format!(
        "INSERT INTO users (email, password_hash, first_name, last_name, company, email_confirmed_at) \
         VALUES ($1, $2, $3, $4, $5, CASE WHEN $6 THEN now() END) \
         RETURNING {USER_COLUMNS}"
    );
    let result = sqlx::query_as::<_, Row>(&sql)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.company)
        .bind(new.confirmed)
        .fetch_one(pool)
        .await;

    match result {
        Ok(row) => Ok(row.into()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(AppError::Conflict("User already registered".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
    let row = sqlx::query_as::<_, Row>(&sql)
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;
    Ok(row.map(User::from))
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, AppError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let row = sqlx::query_as::<_, Row>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(User::from))
}

/// Set `email_confirmed_at` if it is not set yet.
pub async fn confirm_email(pool: &PgPool, id: i64) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE users SET email_confirmed_at = COALESCE(email_confirmed_at, now()), updated_at = now() \
         WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_password(pool: &PgPool, id: i64, password_hash: &str) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Store the digest of a freshly issued one-time code.
pub async fn insert_code(
    pool: &PgPool,
    user_id: i64,
    purpose: CodePurpose,
    digest: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO auth_codes (code_digest, user_id, purpose, expires_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(digest)
    .bind(user_id)
    .bind(purpose.as_str())
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete the code and return what it was issued for. The DELETE makes the
/// code single-use even under concurrent exchanges.
pub async fn take_code(pool: &PgPool, digest: &str) -> Result<Option<AuthCode>, AppError> {
    #[derive(sqlx::FromRow)]
    struct CodeRow {
        user_id: i64,
        purpose: String,
        expires_at: DateTime<Utc>,
    }

    let row = sqlx::query_as::<_, CodeRow>(
        "DELETE FROM auth_codes WHERE code_digest = $1 RETURNING user_id, purpose, expires_at",
    )
    .bind(digest)
    .fetch_optional(pool)
    .await?;

    row.map(|r| {
        Ok(AuthCode {
            user_id: r.user_id,
            purpose: r.purpose.parse()?,
            expires_at: r.expires_at,
        })
    })
    .transpose()
}

/// Drop codes that can no longer be exchanged.
pub async fn purge_expired_codes(pool: &PgPool) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM auth_codes WHERE expires_at <= now()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

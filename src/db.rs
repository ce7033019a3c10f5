use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::errors::AppError;
use crate::models::template;

pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// Insert the built-in templates when `contract_templates` is empty. Returns
/// how many were inserted.
pub async fn seed_templates(pool: &PgPool) -> Result<usize, AppError> {
    if template::queries::count(pool).await? > 0 {
        log::info!("Template seed skipped: contract_templates already populated");
        return Ok(0);
    }
    let templates = template::builtin_templates()?;
    for t in &templates {
        template::queries::insert(pool, t).await?;
    }
    log::info!("Template seed: created={}", templates.len());
    Ok(templates.len())
}

use sqlx::PgPool;
use sqlx::types::Json;

use crate::errors::AppError;
use super::types::{ContractTemplate, FieldSpec};

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    contract_type: String,
    name: String,
    description: String,
    estimated_time: String,
    category: String,
    form_fields: Json<Vec<FieldSpec>>,
    template_content: String,
    is_active: bool,
}

impl From<Row> for ContractTemplate {
    fn from(row: Row) -> Self {
        ContractTemplate {
            id: row.id,
            contract_type: row.contract_type,
            name: row.name,
            description: row.description,
            estimated_time: row.estimated_time,
            category: row.category,
            fields: row.form_fields.0,
            body: row.template_content,
            is_active: row.is_active,
        }
    }
}

const SELECT_TEMPLATE: &str = "\
    SELECT id, contract_type, name, description, estimated_time, category, \
           form_fields, template_content, is_active \
    FROM contract_templates";

/// All active templates, ordered by contract type.
pub async fn find_active(pool: &PgPool) -> Result<Vec<ContractTemplate>, AppError> {
    let sql = format!("{SELECT_TEMPLATE} WHERE is_active = TRUE ORDER BY contract_type");
    let rows = sqlx::query_as::<_, Row>(&sql).fetch_all(pool).await?;
    Ok(rows.into_iter().map(ContractTemplate::from).collect())
}

/// Active template for a contract type.
pub async fn find_by_type(pool: &PgPool, contract_type: &str) -> Result<Option<ContractTemplate>, AppError> {
    let sql = format!("{SELECT_TEMPLATE} WHERE contract_type = $1 AND is_active = TRUE LIMIT 1");
    let row = sqlx::query_as::<_, Row>(&sql)
        .bind(contract_type)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(ContractTemplate::from))
}

pub async fn count(pool: &PgPool) -> Result<i64, AppError> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contract_templates")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

/// Insert a template definition, keeping any existing row for the same type.
pub async fn insert(pool: &PgPool, template: &ContractTemplate) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO contract_templates \
             (contract_type, name, description, estimated_time, category, form_fields, template_content, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (contract_type) DO NOTHING",
    )
    .bind(&template.contract_type)
    .bind(&template.name)
    .bind(&template.description)
    .bind(&template.estimated_time)
    .bind(&template.category)
    .bind(Json(&template.fields))
    .bind(&template.body)
    .bind(template.is_active)
    .execute(pool)
    .await?;
    Ok(())
}

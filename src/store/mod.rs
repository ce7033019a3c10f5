//! Persistence gateway. Handlers talk to `dyn Backend`; `PgBackend` is the
//! production implementation, `MemoryBackend` serves tests and database-less
//! development runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::models::contract::{Contract, ContractFilter, ContractStats, ContractUpdate, NewContract};
use crate::models::template::{self, ContractTemplate};
use crate::models::user::{AuthCode, CodePurpose, NewUser, User};

pub use memory::MemoryBackend;
pub use postgres::PgBackend;

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create an account. Duplicate emails yield `AppError::Conflict`.
    async fn create_user(&self, new: NewUser) -> Result<User, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn confirm_email(&self, user_id: i64) -> Result<(), AppError>;
    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), AppError>;
    async fn store_code(
        &self,
        user_id: i64,
        purpose: CodePurpose,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;
    /// Remove a code by digest and return it. A code can be taken at most once.
    async fn take_code(&self, digest: &str) -> Result<Option<AuthCode>, AppError>;
}

/// Contract rows. Every read or write of an existing row is scoped to its owner.
#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn insert_contract(&self, new: NewContract) -> Result<Contract, AppError>;
    async fn list_contracts(&self, user_id: i64, filter: &ContractFilter) -> Result<Vec<Contract>, AppError>;
    async fn contract_stats(&self, user_id: i64) -> Result<ContractStats, AppError>;
    async fn find_contract(&self, id: i64, user_id: i64) -> Result<Option<Contract>, AppError>;
    async fn update_contract(
        &self,
        id: i64,
        user_id: i64,
        update: ContractUpdate,
    ) -> Result<Option<Contract>, AppError>;
    async fn delete_contract(&self, id: i64, user_id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Active templates ordered by contract type.
    async fn active_templates(&self) -> Result<Vec<ContractTemplate>, AppError>;
    async fn template_by_type(&self, contract_type: &str) -> Result<Option<ContractTemplate>, AppError>;
}

pub trait Backend: AccountStore + ContractStore + TemplateStore {}

impl<T> Backend for T where T: AccountStore + ContractStore + TemplateStore {}

/// Active templates. An empty catalog or a failing backend yields the
/// built-in definitions.
pub async fn load_templates(backend: &dyn Backend) -> Result<Vec<ContractTemplate>, AppError> {
    let fallback = match backend.active_templates().await {
        Ok(templates) if !templates.is_empty() => return Ok(templates),
        Ok(_) => "no active templates stored".to_string(),
        Err(e) => e.to_string(),
    };
    log::warn!("Template listing unavailable ({fallback}); serving built-in catalog");
    let mut templates = template::builtin_templates()?;
    templates.sort_by(|a, b| a.contract_type.cmp(&b.contract_type));
    Ok(templates)
}

/// Template for `contract_type`. When the backend fails, a built-in
/// definition of the same type is served instead.
pub async fn load_template(backend: &dyn Backend, contract_type: &str) -> Result<ContractTemplate, AppError> {
    match backend.template_by_type(contract_type).await {
        Ok(Some(t)) => Ok(t),
        Ok(None) => Err(AppError::NotFound),
        Err(e) => match template::builtin_template(contract_type) {
            Some(t) => {
                log::warn!("Template lookup for '{contract_type}' failed ({e}); serving built-in definition");
                Ok(t)
            }
            None => Err(e),
        },
    }
}

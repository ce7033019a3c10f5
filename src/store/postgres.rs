use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::contract::{self, Contract, ContractFilter, ContractStats, ContractUpdate, NewContract};
use crate::models::template::{self, ContractTemplate};
use crate::models::user::{self, AuthCode, CodePurpose, NewUser, User};
use super::{AccountStore, ContractStore, TemplateStore};

#[derive(Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgBackend {
    async fn create_user(&self, new: NewUser) -> Result<User, AppError> {
        user::queries::create(&self.pool, &new).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        user::queries::find_by_email(&self.pool, email).await
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        user::queries::find_by_id(&self.pool, id).await
    }

    async fn confirm_email(&self, user_id: i64) -> Result<(), AppError> {
        user::queries::confirm_email(&self.pool, user_id).await
    }

    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), AppError> {
        user::queries::update_password(&self.pool, user_id, password_hash).await
    }

    async fn store_code(
        &self,
        user_id: i64,
        purpose: CodePurpose,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        user::queries::insert_code(&self.pool, user_id, purpose, digest, expires_at).await
    }

    async fn take_code(&self, digest: &str) -> Result<Option<AuthCode>, AppError> {
        user::queries::take_code(&self.pool, digest).await
    }
}

#[async_trait]
impl ContractStore for PgBackend {
    async fn insert_contract(&self, new: NewContract) -> Result<Contract, AppError> {
        contract::queries::insert(&self.pool, &new).await
    }

    async fn list_contracts(&self, user_id: i64, filter: &ContractFilter) -> Result<Vec<Contract>, AppError> {
        contract::queries::find_for_user(&self.pool, user_id, filter).await
    }

    async fn contract_stats(&self, user_id: i64) -> Result<ContractStats, AppError> {
        contract::queries::stats_for_user(&self.pool, user_id).await
    }

    async fn find_contract(&self, id: i64, user_id: i64) -> Result<Option<Contract>, AppError> {
        contract::queries::find_owned(&self.pool, id, user_id).await
    }

    async fn update_contract(
        &self,
        id: i64,
        user_id: i64,
        update: ContractUpdate,
    ) -> Result<Option<Contract>, AppError> {
        contract::queries::update_owned(&self.pool, id, user_id, &update).await
    }

    async fn delete_contract(&self, id: i64, user_id: i64) -> Result<bool, AppError> {
        contract::queries::delete_owned(&self.pool, id, user_id).await
    }
}

#[async_trait]
impl TemplateStore for PgBackend {
    async fn active_templates(&self) -> Result<Vec<ContractTemplate>, AppError> {
        template::queries::find_active(&self.pool).await
    }

    async fn template_by_type(&self, contract_type: &str) -> Result<Option<ContractTemplate>, AppError> {
        template::queries::find_by_type(&self.pool, contract_type).await
    }
}

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::models::contract::{Contract, ContractFilter, ContractStats, ContractUpdate, NewContract};
use crate::models::template::{self, ContractTemplate};
use crate::models::user::{AuthCode, CodePurpose, NewUser, User, normalize_email};
use super::{AccountStore, ContractStore, TemplateStore};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    codes: HashMap<String, AuthCode>,
    contracts: BTreeMap<i64, Contract>,
    next_user_id: i64,
    next_contract_id: i64,
}

/// In-process backend with the same semantics as the PostgreSQL one.
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    templates: Vec<ContractTemplate>,
    fail_writes: AtomicBool,
    fail_template_reads: AtomicBool,
}

impl MemoryBackend {
    /// Backend preloaded with the built-in template catalog.
    pub fn new() -> Result<Self, AppError> {
        Ok(Self::with_templates(template::builtin_templates()?))
    }

    pub fn with_templates(templates: Vec<ContractTemplate>) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            templates,
            fail_writes: AtomicBool::new(false),
            fail_template_reads: AtomicBool::new(false),
        }
    }

    /// Make contract inserts and updates fail with an internal error.
    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    /// Make template lookups fail with an internal error.
    pub fn fail_template_reads(&self, on: bool) {
        self.fail_template_reads.store(on, Ordering::SeqCst);
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Internal("contract store unavailable".to_string()));
        }
        Ok(())
    }

    fn check_templates_readable(&self) -> Result<(), AppError> {
        if self.fail_template_reads.load(Ordering::SeqCst) {
            return Err(AppError::Internal("template store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryBackend {
    async fn create_user(&self, new: NewUser) -> Result<User, AppError> {
        let mut t = self.tables();
        let email = normalize_email(&new.email);
        if t.users.values().any(|u| u.email == email) {
            return Err(AppError::Conflict("User already registered".to_string()));
        }
        t.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: t.next_user_id,
            email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            company: new.company,
            email_confirmed_at: new.confirmed.then_some(now),
            created_at: now,
            updated_at: now,
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = normalize_email(email);
        Ok(self.tables().users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.tables().users.get(&id).cloned())
    }

    async fn confirm_email(&self, user_id: i64) -> Result<(), AppError> {
        if let Some(user) = self.tables().users.get_mut(&user_id) {
            let now = Utc::now();
            user.email_confirmed_at.get_or_insert(now);
            user.updated_at = now;
        }
        Ok(())
    }

    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), AppError> {
        let mut t = self.tables();
        let user = t.users.get_mut(&user_id).ok_or(AppError::NotFound)?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn store_code(
        &self,
        user_id: i64,
        purpose: CodePurpose,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut t = self.tables();
        let now = Utc::now();
        t.codes.retain(|_, c| !c.is_expired(now));
        t.codes.insert(digest.to_string(), AuthCode { user_id, purpose, expires_at });
        Ok(())
    }

    async fn take_code(&self, digest: &str) -> Result<Option<AuthCode>, AppError> {
        Ok(self.tables().codes.remove(digest))
    }
}

#[async_trait]
impl ContractStore for MemoryBackend {
    async fn insert_contract(&self, new: NewContract) -> Result<Contract, AppError> {
        self.check_writable()?;
        let mut t = self.tables();
        t.next_contract_id += 1;
        let now = Utc::now();
        let contract = Contract {
            id: t.next_contract_id,
            user_id: new.user_id,
            contract_type: new.contract_type,
            title: new.title,
            content: new.content,
            form_data: new.form_data,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        t.contracts.insert(contract.id, contract.clone());
        Ok(contract)
    }

    async fn list_contracts(&self, user_id: i64, filter: &ContractFilter) -> Result<Vec<Contract>, AppError> {
        let t = self.tables();
        let mut rows: Vec<Contract> = t
            .contracts
            .values()
            .filter(|c| c.user_id == Some(user_id) && filter.matches(c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn contract_stats(&self, user_id: i64) -> Result<ContractStats, AppError> {
        let t = self.tables();
        Ok(ContractStats::tally(t.contracts.values().filter(|c| c.user_id == Some(user_id))))
    }

    async fn find_contract(&self, id: i64, user_id: i64) -> Result<Option<Contract>, AppError> {
        Ok(self
            .tables()
            .contracts
            .get(&id)
            .filter(|c| c.user_id == Some(user_id))
            .cloned())
    }

    async fn update_contract(
        &self,
        id: i64,
        user_id: i64,
        update: ContractUpdate,
    ) -> Result<Option<Contract>, AppError> {
        self.check_writable()?;
        let mut t = self.tables();
        let Some(row) = t.contracts.get_mut(&id).filter(|c| c.user_id == Some(user_id)) else {
            return Ok(None);
        };
        row.title = update.title;
        row.content = update.content;
        row.form_data = update.form_data;
        row.status = update.status;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete_contract(&self, id: i64, user_id: i64) -> Result<bool, AppError> {
        let mut t = self.tables();
        let owned = t.contracts.get(&id).is_some_and(|c| c.user_id == Some(user_id));
        if owned {
            t.contracts.remove(&id);
        }
        Ok(owned)
    }
}

#[async_trait]
impl TemplateStore for MemoryBackend {
    async fn active_templates(&self) -> Result<Vec<ContractTemplate>, AppError> {
        self.check_templates_readable()?;
        let mut active: Vec<ContractTemplate> = self.templates.iter().filter(|t| t.is_active).cloned().collect();
        active.sort_by(|a, b| a.contract_type.cmp(&b.contract_type));
        Ok(active)
    }

    async fn template_by_type(&self, contract_type: &str) -> Result<Option<ContractTemplate>, AppError> {
        self.check_templates_readable()?;
        Ok(self
            .templates
            .iter()
            .find(|t| t.is_active && t.contract_type == contract_type)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::contract::ContractStatus;
    use crate::models::template::FormValues;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "hash".into(),
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            company: None,
            confirmed: true,
        }
    }

    fn new_contract(user_id: Option<i64>, title: &str) -> NewContract {
        NewContract {
            user_id,
            contract_type: "nda".into(),
            title: title.into(),
            content: "body".into(),
            form_data: FormValues::new(),
            status: ContractStatus::Draft,
        }
    }

    #[actix_rt::test]
    async fn duplicate_email_conflicts_case_insensitively() {
        let backend = MemoryBackend::new().unwrap();
        backend.create_user(new_user("ann@example.com")).await.unwrap();
        let err = backend.create_user(new_user("ANN@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_rt::test]
    async fn codes_are_single_use() {
        let backend = MemoryBackend::new().unwrap();
        let expires = Utc::now() + chrono::Duration::minutes(5);
        backend.store_code(1, CodePurpose::Recovery, "d1", expires).await.unwrap();
        assert!(backend.take_code("d1").await.unwrap().is_some());
        assert!(backend.take_code("d1").await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn rows_are_scoped_to_owner() {
        let backend = MemoryBackend::new().unwrap();
        let mine = backend.insert_contract(new_contract(Some(1), "Mine")).await.unwrap();
        backend.insert_contract(new_contract(Some(2), "Theirs")).await.unwrap();
        backend.insert_contract(new_contract(None, "Anonymous")).await.unwrap();

        let listed = backend.list_contracts(1, &ContractFilter::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Mine");
        assert!(backend.find_contract(mine.id, 2).await.unwrap().is_none());
        assert!(!backend.delete_contract(mine.id, 2).await.unwrap());
        assert!(backend.delete_contract(mine.id, 1).await.unwrap());
    }

    #[actix_rt::test]
    async fn listing_is_newest_first() {
        let backend = MemoryBackend::new().unwrap();
        for title in ["first", "second", "third"] {
            backend.insert_contract(new_contract(Some(1), title)).await.unwrap();
        }
        let titles: Vec<String> = backend
            .list_contracts(1, &ContractFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, ["third", "second", "first"]);
    }

    #[actix_rt::test]
    async fn templates_are_ordered_by_type() {
        let backend = MemoryBackend::new().unwrap();
        let types: Vec<String> = backend
            .active_templates()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.contract_type)
            .collect();
        assert_eq!(types, ["contractor-agreement", "employment-contract", "lease-agreement", "nda"]);
    }
}

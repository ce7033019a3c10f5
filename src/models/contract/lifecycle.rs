//! Contract creation, re-rendering, and draft claiming on top of the store.

use crate::drafts::{Draft, DraftStore};
use crate::errors::AppError;
use crate::models::template::{ContractTemplate, FormValues};
use crate::store::{Backend, ContractStore};
use crate::templating;
use super::types::*;

/// Render `template` with `form_data` into an insertable row.
pub fn compose(
    template: &ContractTemplate,
    form_data: FormValues,
    title: Option<String>,
    status: ContractStatus,
    user_id: Option<i64>,
) -> NewContract {
    let content = templating::render(&template.body, &form_data, &template.fields);
    NewContract {
        user_id,
        contract_type: template.contract_type.clone(),
        title: resolve_title(title, template),
        content,
        form_data,
        status,
    }
}

/// Re-render an existing contract from new values. Title and status keep
/// their stored values unless replaced.
pub fn recompose(
    existing: &Contract,
    template: &ContractTemplate,
    form_data: FormValues,
    title: Option<String>,
    status: Option<ContractStatus>,
) -> ContractUpdate {
    ContractUpdate {
        title: title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| existing.title.clone()),
        content: templating::render(&template.body, &form_data, &template.fields),
        form_data,
        status: status.unwrap_or(existing.status),
    }
}

fn resolve_title(title: Option<String>, template: &ContractTemplate) -> String {
    title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| template.name.clone())
}

async fn persist_draft(backend: &dyn Backend, draft: &Draft, user_id: i64) -> Result<Contract, AppError> {
    let generated = draft
        .generated
        .as_ref()
        .ok_or_else(|| AppError::Internal("claimed draft has no generated payload".to_string()))?;
    backend
        .insert_contract(NewContract {
            user_id: Some(user_id),
            contract_type: draft.contract_type.clone(),
            title: generated.title.clone(),
            content: generated.content.clone(),
            form_data: generated.form_data.clone(),
            status: ContractStatus::Completed,
        })
        .await
}

/// Move the generated draft for `contract_type` into the user's account.
/// `Ok(None)` when the session has nothing generated for that type. On a
/// persistence failure the draft is put back and the error returned.
pub async fn claim(
    backend: &dyn Backend,
    drafts: &DraftStore,
    draft_key: &str,
    contract_type: &str,
    user_id: i64,
) -> Result<Option<Contract>, AppError> {
    let Some(draft) = drafts.take_generated(draft_key, contract_type) else {
        return Ok(None);
    };
    match persist_draft(backend, &draft, user_id).await {
        Ok(contract) => {
            log::info!("Claimed {contract_type} draft as contract {} for user {user_id}", contract.id);
            Ok(Some(contract))
        }
        Err(e) => {
            drafts.restore(draft_key, draft);
            Err(e)
        }
    }
}

/// Claim every generated draft of the session. Drafts that fail to persist
/// are restored and logged; the rest are still claimed.
pub async fn claim_all(backend: &dyn Backend, drafts: &DraftStore, draft_key: &str, user_id: i64) -> Vec<Contract> {
    let mut claimed = vec![];
    for draft in drafts.take_all_generated(draft_key) {
        match persist_draft(backend, &draft, user_id).await {
            Ok(contract) => claimed.push(contract),
            Err(e) => {
                log::error!("Failed to claim {} draft for user {user_id}: {e}", draft.contract_type);
                drafts.restore(draft_key, draft);
            }
        }
    }
    claimed
}

//! Session-scoped drafts: in-progress form data and a generated-but-unsaved
//! contract, keyed by (session draft key, contract type).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use actix_session::Session;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::auth::tokens::generate_token;
use crate::errors::AppError;
use crate::models::template::FormValues;

const SESSION_DRAFT_KEY: &str = "draft_key";

/// Contract text produced from a draft, waiting to be claimed by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedContract {
    pub title: String,
    pub content: String,
    pub form_data: FormValues,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Draft {
    pub contract_type: String,
    pub form_data: FormValues,
    pub disclaimer_accepted: bool,
    pub generated: Option<GeneratedContract>,
    pub updated_at: DateTime<Utc>,
}

type Slot = (String, String);

#[derive(Clone)]
pub struct DraftStore {
    drafts: Arc<Mutex<HashMap<Slot, Draft>>>,
    ttl: Duration,
}

/// Draft key for this session, created on first use.
pub fn session_draft_key(session: &Session) -> Result<String, AppError> {
    if let Ok(Some(key)) = session.get::<String>(SESSION_DRAFT_KEY) {
        return Ok(key);
    }
    let key = generate_token();
    session
        .insert(SESSION_DRAFT_KEY, &key)
        .map_err(|e| AppError::Internal(format!("Session error: {e}")))?;
    Ok(key)
}

/// Draft key if the session already has one; never creates it.
pub fn existing_draft_key(session: &Session) -> Option<String> {
    session.get::<String>(SESSION_DRAFT_KEY).unwrap_or(None)
}

fn slot(key: &str, contract_type: &str) -> Slot {
    (key.to_string(), contract_type.to_string())
}

impl DraftStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            drafts: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, HashMap<Slot, Draft>> {
        let mut map = self.drafts.lock().unwrap_or_else(|e| e.into_inner());
        let cutoff = Utc::now() - self.ttl;
        map.retain(|_, d| d.updated_at > cutoff);
        map
    }

    pub fn get(&self, key: &str, contract_type: &str) -> Option<Draft> {
        self.locked().get(&slot(key, contract_type)).cloned()
    }

    /// Store form progress. Changing the values drops any generated payload,
    /// since it no longer matches the form.
    pub fn save(&self, key: &str, contract_type: &str, form_data: FormValues, disclaimer_accepted: bool) -> Draft {
        let mut map = self.locked();
        let entry = map.entry(slot(key, contract_type)).or_insert_with(|| Draft {
            contract_type: contract_type.to_string(),
            form_data: FormValues::new(),
            disclaimer_accepted: false,
            generated: None,
            updated_at: Utc::now(),
        });
        if entry.form_data != form_data {
            entry.generated = None;
        }
        entry.form_data = form_data;
        entry.disclaimer_accepted = disclaimer_accepted;
        entry.updated_at = Utc::now();
        entry.clone()
    }

    /// Drop a draft. Returns whether one existed.
    pub fn abandon(&self, key: &str, contract_type: &str) -> bool {
        self.locked().remove(&slot(key, contract_type)).is_some()
    }

    /// Attach a generated payload to an existing draft.
    pub fn set_generated(&self, key: &str, contract_type: &str, generated: GeneratedContract) -> Option<Draft> {
        let mut map = self.locked();
        let draft = map.get_mut(&slot(key, contract_type))?;
        draft.generated = Some(generated);
        draft.updated_at = Utc::now();
        Some(draft.clone())
    }

    /// Remove and return the draft if it carries a generated payload. The
    /// check and the removal happen under one lock, so two concurrent claims
    /// cannot both receive it.
    pub fn take_generated(&self, key: &str, contract_type: &str) -> Option<Draft> {
        let mut map = self.locked();
        let slot = slot(key, contract_type);
        if map.get(&slot).is_some_and(|d| d.generated.is_some()) {
            map.remove(&slot)
        } else {
            None
        }
    }

    /// Remove every draft of this session that has a generated payload.
    pub fn take_all_generated(&self, key: &str) -> Vec<Draft> {
        let mut map = self.locked();
        let slots: Vec<Slot> = map
            .iter()
            .filter(|((k, _), d)| k == key && d.generated.is_some())
            .map(|(s, _)| s.clone())
            .collect();
        let mut taken: Vec<Draft> = slots.iter().filter_map(|s| map.remove(s)).collect();
        taken.sort_by(|a, b| a.contract_type.cmp(&b.contract_type));
        taken
    }

    /// Put a taken draft back after a failed claim, unless a newer one was saved meanwhile.
    pub fn restore(&self, key: &str, draft: Draft) {
        let mut map = self.locked();
        map.entry(slot(key, &draft.contract_type)).or_insert(draft);
    }

    pub fn len(&self) -> usize {
        self.locked().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

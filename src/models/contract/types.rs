use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::template::FormValues;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    #[default]
    Draft,
    Completed,
    Pending,
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 3] = [ContractStatus::Draft, ContractStatus::Completed, ContractStatus::Pending];

    pub fn as_str(self) -> &'static str {
        match self {
            ContractStatus::Draft => "draft",
            ContractStatus::Completed => "completed",
            ContractStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::BadRequest(format!("Invalid status: {s}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contract {
    pub id: i64,
    pub user_id: Option<i64>,
    pub contract_type: String,
    pub title: String,
    pub content: String,
    pub form_data: FormValues,
    pub status: ContractStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewContract {
    pub user_id: Option<i64>,
    pub contract_type: String,
    pub title: String,
    pub content: String,
    pub form_data: FormValues,
    pub status: ContractStatus,
}

/// Full overwrite of the mutable columns of a contract.
#[derive(Debug, Clone)]
pub struct ContractUpdate {
    pub title: String,
    pub content: String,
    pub form_data: FormValues,
    pub status: ContractStatus,
}

/// Listing filter: optional status and case-insensitive title substring.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractFilter {
    pub status: Option<ContractStatus>,
    pub search: Option<String>,
}

impl ContractFilter {
    /// Search term with surrounding whitespace removed; `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn matches(&self, contract: &Contract) -> bool {
        if self.status.is_some_and(|s| s != contract.status) {
            return false;
        }
        match self.search_term() {
            Some(term) => contract.title.to_lowercase().contains(&term.to_lowercase()),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContractStats {
    pub total: i64,
    pub draft: i64,
    pub completed: i64,
    pub pending: i64,
}

impl ContractStats {
    pub fn tally<'a>(contracts: impl IntoIterator<Item = &'a Contract>) -> Self {
        contracts.into_iter().fold(Self::default(), |mut acc, c| {
            acc.total += 1;
            match c.status {
                ContractStatus::Draft => acc.draft += 1,
                ContractStatus::Completed => acc.completed += 1,
                ContractStatus::Pending => acc.pending += 1,
            }
            acc
        })
    }
}

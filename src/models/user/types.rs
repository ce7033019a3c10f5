use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::AppError;

/// Account row, including the password hash. Never serialized.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    /// Mark the email as confirmed at creation time.
    pub confirmed: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserMetadata {
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub full_name: String,
}

/// What `/api/auth/user` and sign-in responses expose.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub user_metadata: UserMetadata,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        let full_name = format!("{} {}", u.first_name, u.last_name).trim().to_string();
        Self {
            id: u.id,
            email: u.email.clone(),
            email_confirmed_at: u.email_confirmed_at,
            created_at: u.created_at,
            user_metadata: UserMetadata {
                first_name: u.first_name.clone(),
                last_name: u.last_name.clone(),
                company: u.company.clone(),
                full_name,
            },
        }
    }
}

/// What a one-time code grants when exchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodePurpose {
    Verification,
    Recovery,
}

impl CodePurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            CodePurpose::Verification => "verification",
            CodePurpose::Recovery => "recovery",
        }
    }
}

impl fmt::Display for CodePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodePurpose {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verification" => Ok(CodePurpose::Verification),
            "recovery" => Ok(CodePurpose::Recovery),
            other => Err(AppError::Internal(format!("Unknown code purpose: {other}"))),
        }
    }
}

/// A consumed one-time code.
#[derive(Debug, Clone)]
pub struct AuthCode {
    pub user_id: i64,
    pub purpose: CodePurpose,
    pub expires_at: DateTime<Utc>,
}

impl AuthCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Lowercased, trimmed email used as the account key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

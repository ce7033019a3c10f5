//! One-time codes for email verification and password recovery. Only the
//! SHA-256 digest of a code is stored; the plain code travels in the email link.

use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::errors::AppError;
use crate::models::user::{AuthCode, CodePurpose};
use crate::store::{AccountStore, Backend};

/// Generate a random 32-byte hex token.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

pub fn digest(code: &str) -> String {
    hex::encode(Sha256::digest(code.trim().as_bytes()))
}

/// Create and store a code for `user_id`. Returns the plain code.
pub async fn issue_code(
    backend: &dyn Backend,
    user_id: i64,
    purpose: CodePurpose,
    ttl: Duration,
) -> Result<String, AppError> {
    let code = generate_token();
    backend
        .store_code(user_id, purpose, &digest(&code), Utc::now() + ttl)
        .await?;
    Ok(code)
}

/// Consume a code. Unknown, already used, and expired codes are all rejected
/// the same way.
pub async fn exchange_code(backend: &dyn Backend, code: &str) -> Result<AuthCode, AppError> {
    if code.trim().is_empty() {
        return Err(AppError::Unauthorized("Invalid or expired code".to_string()));
    }
    match backend.take_code(&digest(code)).await? {
        Some(found) if !found.is_expired(Utc::now()) => Ok(found),
        _ => Err(AppError::Unauthorized("Invalid or expired code".to_string())),
    }
}

use actix_session::Session;

use crate::errors::AppError;
use crate::models::user::User;

const USER_ID: &str = "user_id";
const EMAIL: &str = "email";
const RECOVERY: &str = "recovery";

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>(USER_ID).unwrap_or(None)
}

/// Signed-in user id, or 401.
pub fn require_user_id(session: &Session) -> Result<i64, AppError> {
    get_user_id(session).ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))
}

/// True when the session came from a password-recovery link.
pub fn is_recovery(session: &Session) -> bool {
    session.get::<bool>(RECOVERY).unwrap_or(None).unwrap_or(false)
}

fn establish(session: &Session, user: &User, recovery: bool) -> Result<(), AppError> {
    session.renew();
    session
        .insert(USER_ID, user.id)
        .and_then(|_| session.insert(EMAIL, &user.email))
        .map_err(|e| AppError::Internal(format!("Session error: {e}")))?;
    if recovery {
        session
            .insert(RECOVERY, true)
            .map_err(|e| AppError::Internal(format!("Session error: {e}")))?;
    } else {
        session.remove(RECOVERY);
    }
    Ok(())
}

/// Attach `user` to the session under a fresh session key. Other session
/// state (the draft key) is kept.
pub fn sign_in(session: &Session, user: &User) -> Result<(), AppError> {
    establish(session, user, false)
}

/// Like [`sign_in`], flagged so that only a password update is allowed next.
pub fn begin_recovery(session: &Session, user: &User) -> Result<(), AppError> {
    establish(session, user, true)
}

use actix_session::Session;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

use crate::auth::{password, session as auth_session, tokens, validate};
use crate::drafts;
use crate::errors::AppError;
use crate::mail::{Mailer, PasswordResetEmail, VerifyEmail, describe_minutes};
use crate::models::contract::lifecycle;
use crate::models::user::{CodePurpose, NewUser, PublicUser, User, normalize_email};
use crate::state::AppState;
use crate::store::AccountStore;

const AUTH_ERROR_PATH: &str = "/auth/auth-code-error";
const RESET_PASSWORD_PATH: &str = "/auth/reset-password";
const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for that email, a password reset link has been sent.";

#[derive(Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "firstName")]
    pub first_name: String,
    #[serde(default, alias = "lastName")]
    pub last_name: String,
    #[serde(default)]
    pub company: Option<String>,
}

#[derive(Deserialize)]
pub struct SigninRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "confirmPassword")]
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub next: Option<String>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub user: PublicUser,
    pub confirmation_required: bool,
    pub claimed_contract_ids: Vec<i64>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct CurrentUserResponse {
    pub user: Option<PublicUser>,
}

fn client_ip(req: &HttpRequest) -> IpAddr {
    req.peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", location))
        .finish()
}

/// Only same-site absolute paths are accepted as redirect targets.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
        _ => "/",
    }
}

fn callback_link(state: &AppState, code: &str, next: &str) -> String {
    format!("{}/api/auth/callback?code={code}&next={next}", state.config.app_url)
}

/// Claim any generated drafts the session carried in from before sign-in.
async fn claim_session_drafts(state: &AppState, session: &Session, user_id: i64) -> Vec<i64> {
    let Some(key) = drafts::existing_draft_key(session) else {
        return vec![];
    };
    lifecycle::claim_all(state.backend.as_ref(), &state.drafts, &key, user_id)
        .await
        .into_iter()
        .map(|c| c.id)
        .collect()
}

async fn send_verification(state: &AppState, user: &User) -> Result<(), AppError> {
    let code = tokens::issue_code(
        state.backend.as_ref(),
        user.id,
        CodePurpose::Verification,
        state.config.verify_token_ttl(),
    )
    .await?;
    let link = callback_link(state, &code, "/");
    let email = VerifyEmail { app_name: &state.config.app_name, link: &link }
        .compose(&state.config.email_from, &user.email)?;
    state.mailer.send(email).await
}

async fn send_password_reset(state: &AppState, user: &User) -> Result<(), AppError> {
    let code = tokens::issue_code(
        state.backend.as_ref(),
        user.id,
        CodePurpose::Recovery,
        state.config.reset_token_ttl(),
    )
    .await?;
    let link = callback_link(state, &code, RESET_PASSWORD_PATH);
    let expires_in = describe_minutes(state.config.reset_token_ttl_minutes);
    let email = PasswordResetEmail {
        app_name: &state.config.app_name,
        link: &link,
        expires_in: &expires_in,
    }
    .compose(&state.config.email_from, &user.email)?;
    state.mailer.send(email).await
}

/// POST /api/auth/signup
pub async fn signup(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
    if !state.config.registration_enabled {
        return Err(AppError::Forbidden("Registration is currently disabled".to_string()));
    }
    let req = body.into_inner();

    let missing = [&req.email, &req.password, &req.first_name, &req.last_name]
        .iter()
        .any(|v| v.trim().is_empty());
    if missing {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    }
    if validate::validate_email(&req.email).is_some() {
        return Err(AppError::BadRequest("Invalid email format".to_string()));
    }
    if let Some(msg) = validate::validate_password(&req.password) {
        return Err(AppError::BadRequest(msg));
    }
    for (value, name) in [(&req.first_name, "First name"), (&req.last_name, "Last name")] {
        if let Some(msg) = validate::validate_required(value, name, 100) {
            return Err(AppError::BadRequest(msg));
        }
    }

    let confirmation_required = state.config.require_email_confirmation;
    let user = state
        .backend
        .create_user(NewUser {
            email: normalize_email(&req.email),
            password_hash: password::hash_password(&req.password)?,
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            company: req.company.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
            confirmed: !confirmation_required,
        })
        .await?;
    log::info!("New account {} registered", user.id);

    let mut claimed_contract_ids = vec![];
    if confirmation_required {
        send_verification(&state, &user).await?;
    } else {
        auth_session::sign_in(&session, &user)?;
        claimed_contract_ids = claim_session_drafts(&state, &session, user.id).await;
    }

    Ok(HttpResponse::Ok().json(SessionResponse {
        user: PublicUser::from(&user),
        confirmation_required,
        claimed_contract_ids,
    }))
}

/// POST /api/auth/signin
pub async fn signin(
    req: HttpRequest,
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<SigninRequest>,
) -> Result<HttpResponse, AppError> {
    // Rate-limit check BEFORE any database access
    let ip = client_ip(&req);
    if state.login_limiter.is_blocked(ip) {
        log::warn!("Sign-in blocked for {ip}: too many attempts");
        return Err(AppError::RateLimited);
    }

    let form = body.into_inner();
    if form.email.trim().is_empty() || form.password.is_empty() {
        return Err(AppError::BadRequest("Email and password are required".to_string()));
    }

    let found = state.backend.find_user_by_email(&form.email).await?;
    let user = match found {
        Some(u) if password::verify_password(&form.password, &u.password_hash)? => u,
        _ => {
            state.login_limiter.record_failure(ip);
            log::info!("Failed sign-in attempt from {ip}");
            return Err(AppError::Unauthorized("Invalid login credentials".to_string()));
        }
    };
    if !user.is_confirmed() {
        return Err(AppError::Unauthorized("Email not confirmed".to_string()));
    }

    state.login_limiter.clear(ip);
    auth_session::sign_in(&session, &user)?;
    log::info!("User {} signed in", user.id);
    let claimed_contract_ids = claim_session_drafts(&state, &session, user.id).await;

    Ok(HttpResponse::Ok().json(SessionResponse {
        user: PublicUser::from(&user),
        confirmation_required: false,
        claimed_contract_ids,
    }))
}

/// POST /api/auth/signout
pub async fn signout(session: Session) -> Result<HttpResponse, AppError> {
    session.purge();
    Ok(see_other("/login"))
}

/// POST /api/auth/forgot-password - Same response whether or not the account exists
pub async fn forgot_password(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let ip = client_ip(&req);
    if state.reset_limiter.is_blocked(ip) {
        return Err(AppError::RateLimited);
    }
    let email = body.into_inner().email;
    if email.trim().is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }
    state.reset_limiter.record_failure(ip);

    match state.backend.find_user_by_email(&email).await? {
        Some(user) => {
            if let Err(e) = send_password_reset(&state, &user).await {
                log::error!("Password reset email for user {} failed: {e}", user.id);
            }
        }
        None => log::info!("Password reset requested for unknown email"),
    }

    Ok(HttpResponse::Ok().json(MessageResponse { message: FORGOT_PASSWORD_MESSAGE.to_string() }))
}

/// GET /api/auth/callback?code=..&next=.. - Exchange a one-time code for a session
pub async fn callback(
    state: web::Data<AppState>,
    session: Session,
    query: web::Query<CallbackQuery>,
) -> HttpResponse {
    let next = safe_next(query.next.as_deref()).to_string();
    let code = query.code.as_deref().unwrap_or("");

    match exchange(&state, &session, code).await {
        Ok(()) => see_other(&next),
        Err(e) => {
            log::info!("Auth code exchange failed: {e}");
            see_other(AUTH_ERROR_PATH)
        }
    }
}

async fn exchange(state: &AppState, session: &Session, code: &str) -> Result<(), AppError> {
    let grant = tokens::exchange_code(state.backend.as_ref(), code).await?;
    let user = state
        .backend
        .find_user(grant.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    // either kind of link proves control of the mailbox
    state.backend.confirm_email(user.id).await?;
    match grant.purpose {
        CodePurpose::Verification => auth_session::sign_in(session, &user),
        CodePurpose::Recovery => auth_session::begin_recovery(session, &user),
    }
}

/// POST /api/auth/reset-password - Requires a recovery session; signs out afterwards
pub async fn reset_password(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = match auth_session::get_user_id(&session) {
        Some(id) if auth_session::is_recovery(&session) => id,
        _ => return Err(AppError::Unauthorized("Invalid or expired reset link".to_string())),
    };
    let req = body.into_inner();
    if req.password != req.confirm_password {
        return Err(AppError::BadRequest("Passwords do not match".to_string()));
    }
    if let Some(msg) = validate::validate_password(&req.password) {
        return Err(AppError::BadRequest(msg));
    }

    let hash = password::hash_password(&req.password)?;
    state.backend.update_password(user_id, &hash).await?;
    session.purge();
    log::info!("Password updated for user {user_id}");

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Password updated. Please sign in with your new password.".to_string(),
    }))
}

/// GET /api/auth/user - Current user, or `null` when anonymous
pub async fn current_user(
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let user = match auth_session::get_user_id(&session) {
        Some(id) => state.backend.find_user(id).await?.as_ref().map(PublicUser::from),
        None => None,
    };
    Ok(HttpResponse::Ok().json(CurrentUserResponse { user }))
}

use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::session::require_user_id;
use crate::drafts::{self, Draft, GeneratedContract};
use crate::errors::AppError;
use crate::forms;
use crate::models::contract::lifecycle;
use crate::models::template::FormValues;
use crate::state::AppState;
use crate::store::load_template;
use crate::templating::{self, Rendered};

#[derive(Deserialize)]
pub struct SaveDraftRequest {
    #[serde(default, alias = "formData")]
    pub form_data: FormValues,
    #[serde(default, alias = "disclaimerAccepted")]
    pub disclaimer_accepted: bool,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub draft: Draft,
    pub content: String,
}

fn no_draft() -> AppError {
    AppError::NotFound
}

/// GET /api/drafts/{contract_type} - Saved progress for this session
pub async fn read(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let key = drafts::existing_draft_key(&session).ok_or_else(no_draft)?;
    let draft = state.drafts.get(&key, &path).ok_or_else(no_draft)?;
    Ok(HttpResponse::Ok().json(draft))
}

/// PUT /api/drafts/{contract_type} - Save form progress
pub async fn save(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<String>,
    body: web::Json<SaveDraftRequest>,
) -> Result<HttpResponse, AppError> {
    let contract_type = path.into_inner();
    // unknown types 404 before anything is stored
    load_template(state.backend.as_ref(), &contract_type).await?;

    let key = drafts::session_draft_key(&session)?;
    let req = body.into_inner();
    let draft = state
        .drafts
        .save(&key, &contract_type, req.form_data, req.disclaimer_accepted);
    Ok(HttpResponse::Ok().json(draft))
}

/// DELETE /api/drafts/{contract_type} - Abandon the draft
pub async fn abandon(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    if let Some(key) = drafts::existing_draft_key(&session) {
        state.drafts.abandon(&key, &path);
    }
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/drafts/{contract_type}/preview - Render the saved values
pub async fn preview(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let key = drafts::existing_draft_key(&session).ok_or_else(no_draft)?;
    let draft = state.drafts.get(&key, &path).ok_or_else(no_draft)?;
    let template = load_template(state.backend.as_ref(), &path).await?;
    let rendered: Rendered = templating::render_detailed(&template.body, &draft.form_data, &template.fields);
    Ok(HttpResponse::Ok().json(rendered))
}

/// POST /api/drafts/{contract_type}/generate - Validate and produce the contract text
pub async fn generate(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let contract_type = path.into_inner();
    let key = drafts::existing_draft_key(&session).ok_or_else(no_draft)?;
    let draft = state.drafts.get(&key, &contract_type).ok_or_else(no_draft)?;
    let template = load_template(state.backend.as_ref(), &contract_type).await?;

    let form_data = template.effective_values(&draft.form_data);
    forms::ensure_valid(&template.fields, &form_data, draft.disclaimer_accepted)?;

    let content = templating::render(&template.body, &form_data, &template.fields);
    let generated = GeneratedContract {
        title: template.name.clone(),
        content: content.clone(),
        form_data,
        generated_at: Utc::now(),
    };
    // abandoned between the read above and now
    let draft = state
        .drafts
        .set_generated(&key, &contract_type, generated)
        .ok_or_else(no_draft)?;
    Ok(HttpResponse::Ok().json(GenerateResponse { draft, content }))
}

/// POST /api/drafts/{contract_type}/claim - Persist the generated contract to the account
pub async fn claim(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user_id(&session)?;
    if !state.config.contract_creation_enabled {
        return Err(AppError::Forbidden("Contract creation is currently disabled".to_string()));
    }
    let key = drafts::existing_draft_key(&session).ok_or_else(no_draft)?;
    let contract = lifecycle::claim(state.backend.as_ref(), &state.drafts, &key, &path, user_id)
        .await?
        .ok_or_else(no_draft)?;
    Ok(HttpResponse::Created().json(contract))
}

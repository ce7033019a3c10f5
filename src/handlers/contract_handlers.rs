use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::session::{get_user_id, require_user_id};
use crate::download::{self, DownloadFormat};
use crate::errors::AppError;
use crate::forms;
use crate::models::contract::{lifecycle, ContractFilter, ContractStatus};
use crate::models::template::FormValues;
use crate::state::AppState;
use crate::store::{ContractStore, load_template};

#[derive(Deserialize)]
pub struct CreateContractRequest {
    #[serde(default, alias = "contractType")]
    pub contract_type: String,
    #[serde(default, alias = "formData")]
    pub form_data: FormValues,
    #[serde(default, alias = "disclaimerAccepted")]
    pub disclaimer_accepted: bool,
    pub title: Option<String>,
    pub status: Option<ContractStatus>,
}

#[derive(Deserialize)]
pub struct UpdateContractRequest {
    #[serde(alias = "formData")]
    pub form_data: FormValues,
    pub title: Option<String>,
    pub status: Option<ContractStatus>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

impl ListQuery {
    /// Blank or `all` status means no status filter.
    fn into_filter(self) -> Result<ContractFilter, AppError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(s) => Some(s.parse()?),
        };
        Ok(ContractFilter { status, search: self.search })
    }
}

#[derive(Deserialize)]
pub struct DownloadQuery {
    pub format: Option<String>,
}

fn ensure_creation_enabled(state: &AppState) -> Result<(), AppError> {
    if !state.config.contract_creation_enabled {
        return Err(AppError::Forbidden("Contract creation is currently disabled".to_string()));
    }
    Ok(())
}

/// POST /api/contracts - Validate, render and store a contract (anonymous allowed)
pub async fn create(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<CreateContractRequest>,
) -> Result<HttpResponse, AppError> {
    ensure_creation_enabled(&state)?;
    let req = body.into_inner();
    if req.contract_type.trim().is_empty() {
        return Err(AppError::BadRequest("Contract type is required".to_string()));
    }

    let template = load_template(state.backend.as_ref(), &req.contract_type).await?;
    let form_data = template.effective_values(&req.form_data);
    forms::ensure_valid(&template.fields, &form_data, req.disclaimer_accepted)?;

    let user_id = get_user_id(&session);
    let new = lifecycle::compose(
        &template,
        form_data,
        req.title,
        req.status.unwrap_or_default(),
        user_id,
    );
    let contract = state.backend.insert_contract(new).await?;
    match user_id {
        Some(uid) => log::info!("Contract {} ({}) created for user {uid}", contract.id, contract.contract_type),
        None => log::info!("Anonymous contract {} ({}) created", contract.id, contract.contract_type),
    }
    Ok(HttpResponse::Created().json(contract))
}

/// GET /api/contracts - The caller's contracts, newest first
/// Query params: status (draft|completed|pending|all), search (title substring)
pub async fn list(
    state: web::Data<AppState>,
    session: Session,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user_id(&session)?;
    let filter = query.into_inner().into_filter()?;
    let contracts = state.backend.list_contracts(user_id, &filter).await?;
    Ok(HttpResponse::Ok().json(contracts))
}

/// GET /api/contracts/stats - Counts per status
pub async fn stats(state: web::Data<AppState>, session: Session) -> Result<HttpResponse, AppError> {
    let user_id = require_user_id(&session)?;
    let stats = state.backend.contract_stats(user_id).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// GET /api/contracts/{id}
pub async fn read(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user_id(&session)?;
    let contract = state
        .backend
        .find_contract(path.into_inner(), user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(contract))
}

/// PUT /api/contracts/{id} - Re-render from new form values and overwrite
pub async fn update(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<UpdateContractRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user_id(&session)?;
    let id = path.into_inner();
    let req = body.into_inner();

    let existing = state
        .backend
        .find_contract(id, user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let template = load_template(state.backend.as_ref(), &existing.contract_type).await?;
    let form_data = template.effective_values(&req.form_data);
    forms::ensure_valid(&template.fields, &form_data, true)?;

    let update = lifecycle::recompose(&existing, &template, form_data, req.title, req.status);
    let contract = state
        .backend
        .update_contract(id, user_id, update)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(contract))
}

/// DELETE /api/contracts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user_id(&session)?;
    let id = path.into_inner();
    if !state.backend.delete_contract(id, user_id).await? {
        return Err(AppError::NotFound);
    }
    log::info!("Contract {id} deleted by user {user_id}");
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/contracts/{id}/download?format=txt|pdf|docx
pub async fn download(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<i64>,
    query: web::Query<DownloadQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user_id(&session)?;
    let format = match query.format.as_deref() {
        Some(f) => f.parse::<DownloadFormat>()?,
        None => DownloadFormat::default(),
    };
    let contract = state
        .backend
        .find_contract(path.into_inner(), user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(download::attachment(format, &contract.contract_type, &contract.content))
}

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::template::{FormValues, TemplateSummary};
use crate::state::AppState;
use crate::store::{load_template, load_templates};
use crate::templating;

#[derive(Deserialize)]
pub struct PreviewRequest {
    #[serde(default, alias = "formData")]
    pub form_data: FormValues,
}

/// GET /api/templates - Active templates ordered by contract type
pub async fn list(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let templates = load_templates(state.backend.as_ref()).await?;
    let summaries: Vec<TemplateSummary> = templates.iter().map(TemplateSummary::from).collect();
    Ok(HttpResponse::Ok().json(summaries))
}

/// GET /api/templates/{contract_type} - Full definition: form schema and body
pub async fn read(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let template = load_template(state.backend.as_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(template))
}

/// POST /api/templates/{contract_type}/preview - Render without persisting
pub async fn preview(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<PreviewRequest>,
) -> Result<HttpResponse, AppError> {
    let template = load_template(state.backend.as_ref(), &path).await?;
    let rendered = templating::render_detailed(&template.body, &body.form_data, &template.fields);
    Ok(HttpResponse::Ok().json(rendered))
}

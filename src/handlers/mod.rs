pub mod auth_handlers;
pub mod contract_handlers;
pub mod draft_handlers;
pub mod template_handlers;

use actix_web::{
    web, Error, HttpRequest, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::{Next, from_fn},
};

use crate::auth::middleware::require_auth;
use crate::errors::{AppError, ErrorBody};

/// CSRF protection for cookie-authenticated mutation endpoints.
///
/// Rejects POST/PUT/DELETE requests that don't have Content-Type: application/json.
/// Browsers cannot send cross-origin JSON with cookies via simple form POST,
/// so the Content-Type check acts as a CSRF guard without requiring tokens.
/// GET requests are exempt.
async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method().clone();

    if method == actix_web::http::Method::POST
        || method == actix_web::http::Method::PUT
        || method == actix_web::http::Method::DELETE
    {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let body = ErrorBody::message("Content-Type must be application/json for mutation requests");
            let response = HttpResponse::BadRequest().json(body);
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

fn json_error(err: actix_web::error::JsonPayloadError, _req: &HttpRequest) -> Error {
    AppError::BadRequest(format!("Invalid request body: {err}")).into()
}

fn query_error(err: actix_web::error::QueryPayloadError, _req: &HttpRequest) -> Error {
    AppError::BadRequest(format!("Invalid query string: {err}")).into()
}

/// JSON 404 for anything outside the routes below.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorBody::message("Not found"))
}

/// Configure all `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error));
    cfg.app_data(web::QueryConfig::default().error_handler(query_error));

    cfg.service(
        web::scope("/api/auth")
            .wrap(from_fn(require_json_content_type))
            .route("/signup", web::post().to(auth_handlers::signup))
            .route("/signin", web::post().to(auth_handlers::signin))
            .route("/signout", web::post().to(auth_handlers::signout))
            .route("/forgot-password", web::post().to(auth_handlers::forgot_password))
            .route("/reset-password", web::post().to(auth_handlers::reset_password))
            .route("/callback", web::get().to(auth_handlers::callback))
            .route("/user", web::get().to(auth_handlers::current_user)),
    );
    cfg.service(
        web::scope("/api/templates")
            .wrap(from_fn(require_json_content_type))
            .route("", web::get().to(template_handlers::list))
            .route("/{contract_type}", web::get().to(template_handlers::read))
            .route("/{contract_type}/preview", web::post().to(template_handlers::preview)),
    );
    cfg.service(
        web::scope("/api/contracts")
            .wrap(from_fn(require_json_content_type))
            // anonymous callers may create; listing checks the session itself
            .route("", web::post().to(contract_handlers::create))
            .route("", web::get().to(contract_handlers::list))
            .service(
                web::scope("")
                    .wrap(from_fn(require_auth))
                    // /stats BEFORE /{id}
                    .route("/stats", web::get().to(contract_handlers::stats))
                    .route("/{id}", web::get().to(contract_handlers::read))
                    .route("/{id}", web::put().to(contract_handlers::update))
                    .route("/{id}", web::delete().to(contract_handlers::delete))
                    .route("/{id}/download", web::get().to(contract_handlers::download)),
            ),
    );
    cfg.service(
        web::scope("/api/drafts")
            .wrap(from_fn(require_json_content_type))
            .route("/{contract_type}", web::get().to(draft_handlers::read))
            .route("/{contract_type}", web::put().to(draft_handlers::save))
            .route("/{contract_type}", web::delete().to(draft_handlers::abandon))
            .route("/{contract_type}/preview", web::get().to(draft_handlers::preview))
            .route("/{contract_type}/generate", web::post().to(draft_handlers::generate))
            .service(
                web::scope("")
                    .wrap(from_fn(require_auth))
                    .route("/{contract_type}/claim", web::post().to(draft_handlers::claim)),
            ),
    );
}

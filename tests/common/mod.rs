//! Shared test infrastructure for the HTTP integration tests.
//!
//! Every test runs the real route table against `MemoryBackend`, so no
//! database is needed.
//!
//! # Setup
//! - `harness()` - default configuration, signup signs in immediately
//! - `harness_with(config)` - custom configuration
//! - `harness_with_templates(templates)` - custom template catalog
//! - `test_app!(harness)` - initialise the actix service for a harness
//! - `Client` - cookie-carrying request helper

#![allow(dead_code, unused_macros)]

use std::collections::BTreeMap;
use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::{CONTENT_TYPE, HeaderMap};
use actix_web::test::{self, TestRequest};
use actix_web::web;
use serde_json::{Value, json};

use fastcontracts::SESSION_COOKIE;
use fastcontracts::config::AppConfig;
use fastcontracts::models::template::ContractTemplate;
use fastcontracts::mail::MemoryMailer;
use fastcontracts::state::AppState;
use fastcontracts::store::{Backend, MemoryBackend};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const TEST_PASSWORD: &str = "correct-horse-1";
pub const APP_URL: &str = "http://localhost:3000";

// ============================================================================
// APP SETUP
// ============================================================================

pub struct Harness {
    pub backend: Arc<MemoryBackend>,
    pub mailer: Arc<MemoryMailer>,
    pub state: web::Data<AppState>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        app_url: APP_URL.to_string(),
        ..AppConfig::default()
    }
}

pub fn harness() -> Harness {
    harness_with(test_config())
}

pub fn harness_with(config: AppConfig) -> Harness {
    let backend = MemoryBackend::new().expect("built-in templates load");
    build_harness(backend, config)
}

pub fn harness_with_templates(templates: Vec<ContractTemplate>) -> Harness {
    build_harness(MemoryBackend::with_templates(templates), test_config())
}

fn build_harness(backend: MemoryBackend, config: AppConfig) -> Harness {
    let backend = Arc::new(backend);
    let mailer = Arc::new(MemoryMailer::new());
    let state = web::Data::new(AppState::new(
        backend.clone() as Arc<dyn Backend>,
        mailer.clone(),
        config,
    ));
    Harness { backend, mailer, state }
}

/// Build the service the same way `main` does, minus the request logger.
macro_rules! test_app {
    ($harness:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(fastcontracts::session_middleware(actix_web::cookie::Key::generate(), false))
                .app_data($harness.state.clone())
                .configure(fastcontracts::handlers::configure)
                .default_service(actix_web::web::to(fastcontracts::handlers::not_found)),
        )
        .await
    };
}

// ============================================================================
// REQUESTS
// ============================================================================

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    pub fn error(&self) -> String {
        self.json()["error"].as_str().unwrap_or_default().to_string()
    }
}

/// A browser stand-in: remembers the session cookie between requests and
/// forgets it once the server clears it.
#[derive(Default)]
pub struct Client {
    session: Option<String>,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub async fn send<S, B>(&mut self, app: &S, mut req: TestRequest) -> TestResponse
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        if let Some(value) = &self.session {
            req = req.cookie(Cookie::new(SESSION_COOKIE, value.clone()));
        }
        let resp = test::call_service(app, req.to_request()).await;

        for cookie in resp.response().cookies() {
            if cookie.name() == SESSION_COOKIE {
                self.session = Some(cookie.value().to_string()).filter(|v| !v.is_empty());
            }
        }

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = test::read_body(resp).await.to_vec();
        TestResponse { status, headers, body }
    }

    pub async fn get<S, B>(&mut self, app: &S, uri: &str) -> TestResponse
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        self.send(app, TestRequest::get().uri(uri)).await
    }

    pub async fn post<S, B>(&mut self, app: &S, uri: &str, body: Value) -> TestResponse
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        self.send(app, TestRequest::post().uri(uri).set_json(body)).await
    }

    /// POST without a body, still declared as JSON.
    pub async fn post_empty<S, B>(&mut self, app: &S, uri: &str) -> TestResponse
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let req = TestRequest::post()
            .uri(uri)
            .insert_header((CONTENT_TYPE, "application/json"));
        self.send(app, req).await
    }

    pub async fn put<S, B>(&mut self, app: &S, uri: &str, body: Value) -> TestResponse
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        self.send(app, TestRequest::put().uri(uri).set_json(body)).await
    }

    pub async fn delete<S, B>(&mut self, app: &S, uri: &str) -> TestResponse
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let req = TestRequest::delete()
            .uri(uri)
            .insert_header((CONTENT_TYPE, "application/json"));
        self.send(app, req).await
    }

    /// Register a confirmed account and keep its session.
    pub async fn sign_up<S, B>(&mut self, app: &S, email: &str) -> TestResponse
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let body = json!({
            "email": email,
            "password": TEST_PASSWORD,
            "firstName": "Test",
            "lastName": "User",
        });
        self.post(app, "/api/auth/signup", body).await
    }

    pub async fn sign_in<S, B>(&mut self, app: &S, email: &str, password: &str) -> TestResponse
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let body = json!({ "email": email, "password": password });
        self.post(app, "/api/auth/signin", body).await
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn nda_values() -> BTreeMap<String, String> {
    values(&[
        ("disclosing_party", "Acme"),
        ("receiving_party", "Beta"),
        ("effective_date", "2024-01-01"),
        ("purpose", "evaluation"),
        ("duration", "2"),
    ])
}

/// A template whose required `law` field carries a default.
pub fn governed_template() -> ContractTemplate {
    serde_json::from_value(json!({
        "id": 1,
        "contract_type": "consulting",
        "name": "Consulting Agreement",
        "description": "Advisory services",
        "estimated_time": "5 min",
        "fields": [
            { "id": "client", "label": "Client Name", "type": "text", "required": true },
            { "id": "law", "label": "Governing Law", "type": "text", "required": true, "default": "Delaware" }
        ],
        "body": "Services for {{client}}, governed by the laws of {{law}}."
    }))
    .expect("valid template")
}

/// Body for `POST /api/contracts` with the NDA values above.
pub fn nda_request(title: Option<&str>) -> Value {
    let mut body = json!({
        "contractType": "nda",
        "formData": nda_values(),
        "disclaimerAccepted": true,
    });
    if let Some(title) = title {
        body["title"] = json!(title);
    }
    body
}

/// Pull the one-time code out of an emailed callback link.
pub fn code_from_link(text: &str) -> String {
    let re = regex::Regex::new(r"code=([0-9a-f]+)").expect("valid regex");
    re.captures(text)
        .map(|c| c[1].to_string())
        .expect("email contains a callback code")
}

/// `GET /api/auth/callback` URI as an emailed link would carry it.
pub fn callback_uri(code: &str, next: &str) -> String {
    let query = serde_urlencoded::to_string([("code", code), ("next", next)]).expect("encodable query");
    format!("/api/auth/callback?{query}")
}

use std::sync::Arc;
use std::time::Duration;

use crate::auth::rate_limit::RateLimiter;
use crate::config::AppConfig;
use crate::drafts::DraftStore;
use crate::mail::Mailer;
use crate::store::Backend;

/// Shared application state, registered once as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub drafts: DraftStore,
    pub login_limiter: RateLimiter,
    pub reset_limiter: RateLimiter,
    pub mailer: Arc<dyn Mailer>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(backend: Arc<dyn Backend>, mailer: Arc<dyn Mailer>, config: AppConfig) -> Self {
        let window = Duration::from_secs(config.login_window_secs);
        Self {
            backend,
            drafts: DraftStore::new(config.draft_ttl()),
            login_limiter: RateLimiter::new(config.login_max_attempts, window),
            reset_limiter: RateLimiter::new(config.login_max_attempts, window),
            mailer,
            config,
        }
    }
}

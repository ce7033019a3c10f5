pub mod auth;
pub mod config;
pub mod db;
pub mod download;
pub mod drafts;
pub mod errors;
pub mod forms;
pub mod handlers;
pub mod mail;
pub mod models;
pub mod state;
pub mod store;
pub mod templating;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;

pub const SESSION_COOKIE: &str = "fc_session";

/// Session encryption key from `SESSION_KEY` (64+ bytes), else a random one.
pub fn session_key(configured: Option<&str>) -> Key {
    match configured {
        Some(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Some(val) => {
            log::warn!("SESSION_KEY too short ({} bytes, need 64+); generating random key", val.len());
            Key::generate()
        }
        None => {
            log::warn!("No SESSION_KEY set; generating random key (sessions lost on restart)");
            Key::generate()
        }
    }
}

pub fn session_middleware(key: Key, cookie_secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE.to_string())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .build()
}

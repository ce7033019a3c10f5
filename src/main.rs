use std::sync::Arc;

use actix_web::{App, HttpServer, middleware, web};

use fastcontracts::config::AppConfig;
use fastcontracts::mail::{LogMailer, Mailer, SmtpMailer};
use fastcontracts::models::user;
use fastcontracts::state::AppState;
use fastcontracts::store::{Backend, MemoryBackend, PgBackend};
use fastcontracts::{db, handlers, session_key, session_middleware};

fn startup_error(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().map_err(startup_error)?;

    let backend: Arc<dyn Backend> = match config.database_url.as_deref() {
        Some(url) => {
            let pool = db::init_pool(url, config.db_max_connections)
                .await
                .map_err(startup_error)?;
            db::run_migrations(&pool).await.map_err(startup_error)?;
            db::seed_templates(&pool).await.map_err(startup_error)?;
            let purged = user::queries::purge_expired_codes(&pool).await.map_err(startup_error)?;
            if purged > 0 {
                log::info!("Removed {purged} expired auth codes");
            }
            Arc::new(PgBackend::new(pool))
        }
        None => {
            log::warn!("No DATABASE_URL set; using in-memory storage (data lost on restart)");
            Arc::new(MemoryBackend::new().map_err(startup_error)?)
        }
    };

    let secret_key = session_key(config.session_key.as_deref());
    let mailer: Arc<dyn Mailer> = match config.smtp_settings() {
        Some(smtp) => {
            log::info!("Sending email through {}:{}", smtp.host, smtp.port);
            Arc::new(SmtpMailer::new(&smtp).map_err(startup_error)?)
        }
        None => {
            log::warn!("EMAIL_HOST, EMAIL_USER or EMAIL_PASS not set; emails will only be logged");
            Arc::new(LogMailer)
        }
    };
    let state = web::Data::new(AppState::new(backend, mailer, config.clone()));

    log::info!("Starting {} at http://{}", config.app_name, config.bind_addr);

    let cookie_secure = config.cookie_secure;
    HttpServer::new(move || {
        App::new()
            .wrap(session_middleware(secret_key.clone(), cookie_secure))
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(handlers::configure)
            .default_service(web::to(handlers::not_found))
    })
    .bind(config.bind_addr.as_str())?
    .run()
    .await
}

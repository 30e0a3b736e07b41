use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;

use braniac::{
    auth::ensure_staff_account,
    cache::InMemoryCache,
    config::Config,
    db::{ContentRepository, MemoryStore, PgStore, UserRepository},
    jobs::{InMemoryJobQueue, WorkerPool},
    mail::{MailBackend, Mailer, MemoryMailer, SmtpMailer},
    routes, session_middleware, AppError, AppState, Settings,
};

fn startup_error(error: AppError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, error.to_string())
}

type Storage = (Arc<dyn UserRepository>, Arc<dyn ContentRepository>);

async fn storage(config: &Config) -> Result<Storage, AppError> {
    match config.database_url.as_deref() {
        Some(url) => {
            let store = Arc::new(PgStore::connect(url).await?);
            log::info!("Using PostgreSQL storage");
            let users: Arc<dyn UserRepository> = store.clone();
            let content: Arc<dyn ContentRepository> = store;
            Ok((users, content))
        }
        None => {
            log::warn!("DATABASE_URL is not set, data is kept in memory only");
            let store = Arc::new(MemoryStore::new());
            let users: Arc<dyn UserRepository> = store.clone();
            let content: Arc<dyn ContentRepository> = store;
            Ok((users, content))
        }
    }
}

fn mailer(config: &Config) -> Result<Arc<dyn Mailer>, AppError> {
    match (config.mail_backend, config.smtp.as_ref()) {
        (MailBackend::Smtp, Some(smtp)) => Ok(Arc::new(SmtpMailer::new(smtp)?)),
        (MailBackend::Smtp, None) => Err(AppError::ConfigError(
            "SMTP_HOST must be set when MAIL_BACKEND is 'smtp'".into(),
        )),
        (MailBackend::Memory, _) => {
            log::warn!("MAIL_BACKEND is 'memory', outgoing mail is not delivered");
            Ok(Arc::new(MemoryMailer::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(startup_error)?;
    let (users, content) = storage(&config).await.map_err(startup_error)?;

    let state = AppState {
        users,
        content,
        cache: Arc::new(InMemoryCache::new()),
        queue: Arc::new(InMemoryJobQueue::new(config.jobs.clone())),
        mailer: mailer(&config).map_err(startup_error)?,
        settings: Settings::from(&config),
    };

    if let Some(admin) = &config.admin {
        ensure_staff_account(state.users.as_ref(), admin)
            .await
            .map_err(startup_error)?;
    }

    let workers = WorkerPool::start(
        state.queue.clone(),
        Arc::new(state.job_context()),
        &config.jobs,
    );

    let key = config.session_key();
    let secure = config.session_cookie_secure;
    let data = web::Data::new(state);

    log::info!("Starting braniac server at {}", config.server_url());
    let result = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(session_middleware(key.clone(), secure))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .app_data(data.clone())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await;

    workers.shutdown().await;
    result
}

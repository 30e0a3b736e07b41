use actix_web::cookie::Key;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::jobs::JobsConfig;
use crate::mail::{MailBackend, SmtpConfig};

/// Process configuration, read once at startup from the environment
/// (after `dotenv` has loaded `.env`).
pub struct Config {
    /// PostgreSQL connection string. Without it the portal runs on in-memory storage.
    pub database_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    /// Secret used to sign session cookies, at least 64 bytes.
    pub session_secret: Option<String>,
    /// Send the session cookie over HTTPS only.
    pub session_cookie_secure: bool,
    pub mail_backend: MailBackend,
    pub smtp: Option<SmtpConfig>,
    pub jobs: JobsConfig,
    pub feedback_cache_ttl: Duration,
    pub feedback_mail_lock: Duration,
    pub admin: Option<AdminAccount>,
}

/// Staff account created at startup when it does not exist yet.
pub struct AdminAccount {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let mail_backend = match var("MAIL_BACKEND").as_deref() {
            None | Some("memory") => MailBackend::Memory,
            Some("smtp") => MailBackend::Smtp,
            Some(other) => {
                return Err(AppError::ConfigError(format!(
                    "MAIL_BACKEND must be 'memory' or 'smtp', got '{}'",
                    other
                )))
            }
        };

        let smtp = match var("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: parse_var("SMTP_PORT", 587)?,
                username: var("SMTP_USERNAME"),
                password: var("SMTP_PASSWORD"),
                starttls: parse_var("SMTP_STARTTLS", true)?,
            }),
            None => None,
        };
        if mail_backend == MailBackend::Smtp && smtp.is_none() {
            return Err(AppError::ConfigError(
                "SMTP_HOST must be set when MAIL_BACKEND is 'smtp'".into(),
            ));
        }

        let jobs = JobsConfig {
            worker_count: parse_var("JOBS_WORKER_COUNT", 2)?,
            max_retries: parse_var("JOBS_MAX_RETRIES", 3)?,
            retry_backoff_seconds: parse_var("JOBS_RETRY_BACKOFF_SECONDS", 5)?,
            poll_interval_ms: parse_var("JOBS_POLL_INTERVAL_MS", 100)?,
        };

        let admin = match (var("ADMIN_USERNAME"), var("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminAccount {
                email: var("ADMIN_EMAIL").unwrap_or_else(|| format!("{}@braniac.com", username)),
                username,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url: var("DATABASE_URL"),
            server_port: parse_var("SERVER_PORT", 8080)?,
            server_host: var("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            session_secret: var("SESSION_SECRET"),
            session_cookie_secure: parse_var("SESSION_COOKIE_SECURE", false)?,
            mail_backend,
            smtp,
            jobs,
            feedback_cache_ttl: Duration::from_secs(parse_var("FEEDBACK_CACHE_TTL_SECONDS", 300)?),
            feedback_mail_lock: Duration::from_secs(parse_var("FEEDBACK_MAIL_LOCK_SECONDS", 300)?),
            admin,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    /// Key signing the session cookie. Without a usable secret a random key is
    /// generated, which logs every user out on restart.
    pub fn session_key(&self) -> Key {
        match self.session_secret.as_deref() {
            Some(secret) if secret.len() >= 64 => Key::from(secret.as_bytes()),
            Some(_) => {
                log::warn!("SESSION_SECRET is shorter than 64 bytes, using a random session key");
                Key::generate()
            }
            None => {
                log::warn!("SESSION_SECRET is not set, using a random session key");
                Key::generate()
            }
        }
    }
}

/// Reads a variable, treating an empty value as unset.
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::ConfigError(format!("{} has an invalid value '{}'", name, raw))),
        None => Ok(default),
    }
}

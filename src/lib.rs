#![doc = "The `braniac` library crate."]
#![doc = ""]
#![doc = "The learning portal: accounts and sessions, news, courses with their cached"]
#![doc = "feedback lists, and the support mail sent by background workers. The binary"]
#![doc = "(`main.rs`) wires the configured backends into `AppState` and serves `routes::config`."]

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod mail;
pub mod messages;
pub mod models;
pub mod response;
pub mod routes;
pub mod state;
pub mod urls;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::Key;

pub use crate::error::AppError;
pub use crate::state::{AppState, Settings};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sessionid";

/// Signed cookie sessions. The whole session, queued messages included, lives in the cookie.
pub fn session_middleware(key: Key, secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE.to_string())
        .cookie_secure(secure)
        .build()
}

#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header;
use actix_web::{test, web, App, Error};
use lazy_static::lazy_static;
use serde_json::Value;
use std::sync::Arc;

use braniac::cache::InMemoryCache;
use braniac::db::{MemoryStore, UserRepository};
use braniac::jobs::{InMemoryJobQueue, JobsConfig};
use braniac::mail::MemoryMailer;
use braniac::models::{NewUser, User};
use braniac::{routes, session_middleware, AppState, Settings, SESSION_COOKIE};

pub const PASSWORD: &str = "correct-horse-battery";

lazy_static! {
    // Low cost keeps the suite fast; verification reads the cost from the hash.
    static ref PASSWORD_HASH: String = bcrypt::hash(PASSWORD, 4).unwrap();
}

/// In-memory backends plus the handles tests use to inspect them.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<InMemoryCache>,
    pub queue: Arc<InMemoryJobQueue>,
    pub mailer: MemoryMailer,
    pub state: web::Data<AppState>,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(InMemoryCache::new());
        let queue = Arc::new(InMemoryJobQueue::new(JobsConfig {
            worker_count: 1,
            max_retries: 0,
            retry_backoff_seconds: 0,
            poll_interval_ms: 5,
        }));
        let mailer = MemoryMailer::new();
        let state = web::Data::new(AppState {
            users: store.clone(),
            content: store.clone(),
            cache: cache.clone(),
            queue: queue.clone(),
            mailer: Arc::new(mailer.clone()),
            settings: Settings::default(),
        });
        Self {
            store,
            cache,
            queue,
            mailer,
            state,
        }
    }

    pub async fn create_user(&self, username: &str, is_staff: bool) -> User {
        self.store
            .create_user(NewUser {
                username: username.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                email: format!("{}@example.com", username),
                age: None,
                password_hash: PASSWORD_HASH.clone(),
                is_staff,
            })
            .await
            .unwrap()
    }
}

pub fn session_key() -> Key {
    Key::from(&[7u8; 64][..])
}

pub async fn init_app(
    ctx: &TestContext,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    init_app_with(ctx.state.clone()).await
}

/// An app over `state`, for tests that swap one of the services.
pub async fn init_app_with(
    state: web::Data<AppState>,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    test::init_service(
        App::new()
            .wrap(session_middleware(session_key(), false))
            .app_data(state)
            .configure(routes::config),
    )
    .await
}

/// The session cookie set by a response, if it set one.
pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.into_owned())
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .map(|value| value.to_str().unwrap().to_string())
        .unwrap_or_default()
}

/// Logs `username` in with the shared test password and returns the session cookie.
pub async fn login<S, B>(app: &S, username: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    login_with(app, username, PASSWORD).await
}

pub async fn login_with<S, B>(app: &S, username: &str, password: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/authapp/login/")
        .set_form(&[("username", username), ("password", password)])
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND, "login of '{}' failed", username);
    session_cookie(&resp).expect("login sets the session cookie")
}

/// GETs a page with an optional session and returns the status, the rendered
/// page and the cookie to use next (the updated one when the response set it).
pub async fn get_page<S, B>(
    app: &S,
    uri: &str,
    cookie: Option<&Cookie<'static>>,
) -> (actix_web::http::StatusCode, Value, Option<Cookie<'static>>)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let mut req = test::TestRequest::get().uri(uri);
    if let Some(cookie) = cookie {
        req = req.cookie(cookie.clone());
    }
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status();
    let next_cookie = session_cookie(&resp).or_else(|| cookie.cloned());
    let body = test::read_body(resp).await;
    let page = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, page, next_cookie)
}

/// Texts of the messages on a rendered page.
pub fn message_texts(page: &Value) -> Vec<String> {
    page["messages"]
        .as_array()
        .map(|messages| {
            messages
                .iter()
                .map(|m| m["text"].as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

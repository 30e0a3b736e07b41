use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

/// Health check endpoint
///
/// Returns the overall status, the health of the mailer, the job queue and the
/// cache, and the current timestamp. Any unhealthy service turns the response
/// into `503 Service Unavailable`.
#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    let mailer = state.mailer.is_healthy();
    let queue = state.queue.is_healthy();
    let cache = state.cache.is_healthy();
    let healthy = mailer && queue && cache;

    let body = json!({
        "status": if healthy { "ok" } else { "degraded" },
        "services": {
            "mailer": mailer,
            "queue": queue,
            "cache": cache,
        },
        "timestamp": Utc::now()
    });
    if healthy {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

use actix_web::{HttpResponse, Responder, get, web};
use serde::Serialize;
use tracing::error;

use crate::db::SharedStore;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    store: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn probe(store: &SharedStore, ok_status: &str, failed_status: &str) -> HttpResponse {
    match store.ping().await {
        Ok(()) => HttpResponse::Ok().json(HealthResponse {
            status: ok_status.to_string(),
            store: "connected".to_string(),
            error: None,
        }),
        Err(e) => {
            error!("{} probe failed: {}", ok_status, e);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: failed_status.to_string(),
                store: "disconnected".to_string(),
                error: Some(format!("Store error: {}", e)),
            })
        }
    }
}

/// General health check including store connectivity.
#[get("/health")]
async fn health_check(store: web::Data<SharedStore>) -> impl Responder {
    probe(store.get_ref(), "healthy", "unhealthy").await
}

/// Readiness probe: 503 while the store is unreachable.
#[get("/ready")]
async fn readiness_check(store: web::Data<SharedStore>) -> impl Responder {
    probe(store.get_ref(), "ready", "not_ready").await
}

/// Liveness probe. Does not check dependencies.
#[get("/live")]
async fn liveness_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "alive".to_string(),
        store: "not_checked".to_string(),
        error: None,
    })
}

pub fn health_config(config: &mut web::ServiceConfig) {
    config
        .service(health_check)
        .service(readiness_check)
        .service(liveness_check);
}

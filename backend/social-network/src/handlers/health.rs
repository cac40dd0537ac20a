use std::time::Instant;

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::repository::Repositories;

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    latency_ms: u64,
}

#[derive(Debug, Serialize)]
struct ReadinessResponse {
    ready: bool,
    storage: ComponentCheck,
}

/// Liveness with a storage ping
pub async fn health(repos: web::Data<Repositories>) -> HttpResponse {
    match repos.health.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "social-network",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "service": "social-network"
            }))
        }
    }
}

pub async fn readiness(repos: web::Data<Repositories>) -> HttpResponse {
    let start = Instant::now();
    let result = repos.health.ping().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let storage = match result {
        Ok(()) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "storage reachable".to_string(),
            latency_ms,
        },
        Err(e) => ComponentCheck {
            status: ComponentStatus::Unhealthy,
            message: format!("storage check failed: {e}"),
            latency_ms,
        },
    };

    let ready = matches!(storage.status, ComponentStatus::Healthy);
    let body = ReadinessResponse { ready, storage };
    if ready {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

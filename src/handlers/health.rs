//! # Health Check Handler
//!
//! Liveness endpoint for load balancers and monitoring.

use axum::Json;
use serde_json::{json, Value};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "civitas-auth"
    }))
}

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use super::AppState;

/// GET /health - Liveness probe
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// GET /ready - Readiness probe
/// Reports the size of the loaded ingredient registry. A registry with no
/// ingredients cannot serve any request.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.engine.registry();
    let ingredients = registry.ingredients().len();
    let recipes = registry.recipes().len();

    if ingredients == 0 {
        tracing::error!("Readiness check failed: registry has no ingredients");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "reason": "registry_empty"
            })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "status": "ready",
            "ingredients": ingredients,
            "recipes": recipes,
            "healthConcerns": registry.health_concerns().len(),
        })),
    )
}

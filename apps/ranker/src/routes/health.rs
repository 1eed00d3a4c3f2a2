use axum::Json;
use serde_json::{json, Value};

/// GET /
/// Service description and endpoint map.
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "name": "Resume Ranker API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Extracts ranking criteria from job descriptions and scores resumes against them",
        "endpoints": {
            "extract_criteria": "/extract-criteria",
            "score_resumes": "/score-resumes",
            "full_pipeline": "/all",
            "health": "/health"
        }
    }))
}

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": env!("CARGO_PKG_NAME")
    }))
}

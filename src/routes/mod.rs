pub mod cases;
pub mod health;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/case-types", get(cases::list_case_types))
        .route("/api/cases", post(cases::create_case))
        .with_state(state)
}

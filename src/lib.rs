pub mod config;
pub mod error;
pub mod finance;
pub mod llm;
pub mod pipeline;
pub mod research;
pub mod routes;
pub mod telemetry;

use std::sync::Arc;

pub use config::Config;
pub use pipeline::{CaseDocument, CaseOrchestrator, CaseRequest};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: CaseOrchestrator,
}

pub mod document;
pub mod orchestrator;
pub mod prompts;
pub mod quality;
pub mod request;
pub mod themes;

pub use document::CaseDocument;
pub use orchestrator::{CaseOrchestrator, GeneratedCase};
pub use request::{CASE_TYPES, CaseRequest};

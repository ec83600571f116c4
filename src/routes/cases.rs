use std::path::{Path, PathBuf};

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::pipeline::{CASE_TYPES, CaseRequest};

pub const ACCESS_HEADER: &str = "x-access-password";

#[derive(Debug, Deserialize)]
pub struct CreateCaseBody {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub learning_outcomes: String,
    pub case_focus: String,
    pub company_reference: String,
    #[serde(default)]
    pub case_type: String,
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateCaseResponse {
    pub id: Uuid,
    pub case_text: String,
    pub saved_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_error: Option<String>,
}

fn check_access(headers: &HeaderMap, access_password: &str) -> AppResult<()> {
    let supplied = headers
        .get(ACCESS_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if supplied == access_password {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Incorrect password!".into()))
    }
}

pub async fn create_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateCaseBody>,
) -> AppResult<Json<CreateCaseResponse>> {
    check_access(&headers, &state.config.access_password)?;

    if body.case_focus.trim().is_empty() {
        return Err(AppError::Validation("case_focus must not be empty".into()));
    }
    if body.company_reference.trim().is_empty() {
        return Err(AppError::Validation(
            "company_reference must not be empty".into(),
        ));
    }

    let request = CaseRequest {
        subject: body.subject,
        learning_outcomes: body.learning_outcomes,
        case_focus: body.case_focus,
        company_reference: body.company_reference,
        case_type: body.case_type,
    };

    let case = state.orchestrator.generate_case(&request).await;

    let (saved_to, save_error) = if body.save {
        match save_case(&state.config.output_dir, &case.text).await {
            Ok(path) => (Some(path.display().to_string()), None),
            Err(err) => {
                tracing::warn!(case.id = %case.id, error = %err, "case generated but not saved");
                (None, Some(err.to_string()))
            }
        }
    } else {
        (None, None)
    };

    Ok(Json(CreateCaseResponse {
        id: case.id,
        case_text: case.text,
        saved_to,
        save_error,
    }))
}

pub async fn list_case_types() -> Json<Vec<&'static str>> {
    Json(CASE_TYPES.to_vec())
}

async fn save_case(dir: &Path, text: &str) -> AppResult<PathBuf> {
    let filename = format!(
        "harvard_case_{}.txt",
        chrono::Local::now().format("%Y%m%d_%H%M")
    );
    let path = dir.join(filename);

    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(&path, text).await?;

    tracing::info!(path = %path.display(), bytes = text.len(), "case saved");
    Ok(path)
}

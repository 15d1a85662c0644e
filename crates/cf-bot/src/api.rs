use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use cf_store::ErrorKind;
use serde::Deserialize;
use tracing::{error, info};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub project_id: String,
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .with_state(state)
}

/// Relay a build-system event to the user owning the project.
async fn webhook(
    State(state): State<AppState>,
    Json(req): Json<WebhookRequest>,
) -> Result<StatusCode, ApiError> {
    info!(project_id = %req.project_id, kind = %req.kind, "api: webhook received");

    let user_id = match state.registry.user_for_project(&req.project_id).await {
        Ok(user_id) => user_id,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            error!(project_id = %req.project_id, "api: unknown project");
            return Err(ApiError::UnknownProject);
        }
        Err(e) => return Err(e.into()),
    };

    let text = format!("received webhook of type _{}_", req.kind);
    if let Err(e) = state.chat.im(&user_id, &text).await {
        error!(project_id = %req.project_id, error = %e, "api: could not send message");
    }

    Ok(StatusCode::NO_CONTENT)
}

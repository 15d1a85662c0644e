use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::config::ConfigError;
use crate::readiness::ReadinessError;
use crate::ssh::SshError;

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Store(#[from] cf_store::Error),

    #[error("{0}")]
    Infra(#[from] cf_infra::Error),

    #[error("chat error: {0}")]
    Chat(#[from] slack_api::Error),

    #[error("ssh error: {0}")]
    Ssh(#[from] SshError),

    #[error("{0}")]
    Readiness(#[from] ReadinessError),

    #[error("invalid trigger: {0}")]
    Trigger(#[from] regex::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Command(String),
}

/// Errors surfaced by the webhook endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unknown project")]
    UnknownProject,

    #[error("store error: {0}")]
    Store(#[from] cf_store::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::UnknownProject => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

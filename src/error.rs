use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("mail error: {0}")]
    Mail(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidArgument(String),
}

impl AppError {
    /// Client errors carry a message meant for the caller; everything else is a
    /// fault in one of our dependencies.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::NotFound(_) | AppError::InvalidArgument(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Database(_)
            | AppError::Mail(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        };

        let message = if self.is_client_error() {
            self.to_string()
        } else {
            error!("request failed: {self:?}");
            "Internal server error.".to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

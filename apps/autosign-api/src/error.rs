//! Error types for the signing API

use autosign_core::SignError;
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Please provide a PDF file with the key 'pdf'.")]
    MissingFile,

    /// Malformed or oversized multipart body.
    #[error("{}", .0.body_text())]
    Upload(#[from] MultipartError),

    #[error(transparent)]
    Sign(#[from] SignError),

    /// Signature self-check failure; always a server error.
    #[error("{0}")]
    SignatureCheck(SignError),

    #[error("General error: {0}")]
    General(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFile => StatusCode::BAD_REQUEST,
            ApiError::Upload(e) => e.status(),
            ApiError::Sign(e) => match e {
                SignError::ConfigDecode(_) => StatusCode::INTERNAL_SERVER_ERROR,
                SignError::MarkerNotFound(_) => StatusCode::NOT_FOUND,
                SignError::ImageDecode(_)
                | SignError::InvalidImage
                | SignError::DocumentParse(_)
                | SignError::OutOfBounds
                | SignError::Compositing(_) => StatusCode::BAD_REQUEST,
            },
            ApiError::SignatureCheck(_) | ApiError::General(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!("{} {}", status.as_u16(), message);
        } else {
            tracing::warn!("{} {}", status.as_u16(), message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

//! HTTP handlers for the signing API

use autosign_core::{describe_signature, load_signature_image, sign_document};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{TestSignatureResponse, PDF_FIELD, SIGNED_FILENAME};
use crate::state::AppState;

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Stamp the configured signature on an uploaded PDF.
pub async fn add_signature(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    // Anything that is not a multipart body has no 'pdf' field either
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!("Not a multipart upload: {}", rejection);
        ApiError::MissingFile
    })?;
    let pdf = read_pdf_field(&mut multipart)
        .await?
        .ok_or(ApiError::MissingFile)?;

    tracing::info!("Received PDF upload ({} bytes)", pdf.len());

    let encoded = state.config.signature_base64.clone();
    let options = state.config.signer_options();
    let signed = tokio::task::spawn_blocking(move || {
        let signature = load_signature_image(encoded.as_deref())?;
        sign_document(&pdf, &signature, &options)
    })
    .await
    .map_err(|e| ApiError::General(e.into()))??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", SIGNED_FILENAME),
            ),
        ],
        signed.bytes,
    ))
}

/// Decode the configured signature and report its dimensions.
pub async fn test_signature(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TestSignatureResponse>, ApiError> {
    let info = describe_signature(state.config.signature_base64.as_deref())
        .map_err(ApiError::SignatureCheck)?;

    tracing::info!(
        "Signature check: {}x{} ({} bytes)",
        info.width,
        info.height,
        info.size_bytes
    );
    Ok(Json(TestSignatureResponse::success(info)))
}

/// First field named `pdf`, other fields are skipped.
async fn read_pdf_field(multipart: &mut Multipart) -> Result<Option<Bytes>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(PDF_FIELD) {
            return Ok(Some(field.bytes().await?));
        }
    }
    Ok(None)
}

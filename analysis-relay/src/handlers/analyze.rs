use crate::models::{Upload, UploadError};
use crate::services::AnalysisError;
use crate::startup::AppState;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use service_core::error::AppError;

/// Multipart field carrying the video.
pub const UPLOAD_FIELD: &str = "file";

/// `POST /analyze`: relay the uploaded video and return the model's JSON.
pub async fn analyze_video(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AppError> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "Rejected non-multipart upload");
        AppError::from(AnalysisError::from(UploadError::Missing))
    })?;

    let upload = read_upload(&mut multipart, state.max_upload_bytes).await?;
    let result = state.relay.analyze(upload).await?;

    Ok(Json(result))
}

/// Take the first `file` field; other fields are ignored.
async fn read_upload(multipart: &mut Multipart, max_bytes: usize) -> Result<Upload, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;

        return Upload::new(bytes, mime_type, file_name, max_bytes)
            .map_err(|e| AnalysisError::from(e).into());
    }

    Err(AnalysisError::from(UploadError::Missing).into())
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!(
            "The uploaded video exceeds the size limit: {}",
            err.body_text()
        ))
    } else {
        AppError::BadRequest(anyhow::anyhow!(
            "Invalid multipart body: {}",
            err.body_text()
        ))
    }
}

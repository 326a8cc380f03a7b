use axum::extract::{Multipart, State};
use axum::response::Response;

use crate::auth::AuthUser;
use crate::integrations::ImageUpload;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

/// Forwards the multipart `file` field to the image host and returns its JSON answer.
pub async fn upload_image(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| "upload".to_string());
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::ValidationError(format!("Malformed upload: {e}")))?;

        upload = Some(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload = upload.ok_or_else(|| AppError::ValidationError("No file provided".to_string()))?;
    tracing::info!(uid = %principal.uid, file_name = %upload.file_name, size = upload.bytes.len(), "Uploading image");

    let result = state.images.upload(upload).await?;
    Ok(success(result, "Image uploaded"))
}

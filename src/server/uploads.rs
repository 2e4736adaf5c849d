use std::fs;
use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::UploadResponse;
use crate::server::response::ApiError;
use crate::server::validation::{is_image_mime, sanitize_filename};

pub const MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024; // 5 MB

/// POST /api/upload-image - store an article image under the data dir (admin)
pub async fn upload_image(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    mut multipart: axum::extract::Multipart,
) -> Result<impl IntoResponse, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read multipart: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let original_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| "upload".to_string());

        match content_type.as_deref() {
            Some(mime) if is_image_mime(mime) => {}
            _ => return Err(ApiError::bad_request("Only image uploads are allowed")),
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;
        if data.len() > MAX_UPLOAD_SIZE {
            return Err(ApiError::payload_too_large(format!(
                "File size ({} bytes) exceeds maximum allowed size ({MAX_UPLOAD_SIZE} bytes)",
                data.len()
            )));
        }

        let filename = format!(
            "{}_{}",
            Utc::now().timestamp_millis(),
            sanitize_filename(&original_name)
        );

        let uploads_dir = state.data_dir.join("uploads");
        fs::create_dir_all(&uploads_dir)
            .map_err(|_| ApiError::internal("Failed to create uploads directory"))?;
        fs::write(uploads_dir.join(&filename), &data)
            .map_err(|_| ApiError::internal("Failed to store upload"))?;

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                ok: true,
                url: format!("/uploads/{filename}"),
            }),
        ));
    }

    Err(ApiError::bad_request("No file received"))
}

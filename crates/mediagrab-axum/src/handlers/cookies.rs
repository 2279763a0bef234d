//! Cookie store handlers.

use axum::Json;
use axum::extract::{Multipart, Path, State};
use serde::Serialize;

use mediagrab_download::CookieRecord;

use crate::error::HttpError;
use crate::state::AppState;

/// The multipart field carrying the uploaded file.
const UPLOAD_FIELD: &str = "cookie_file";

/// List available cookie files (sweeps expired uploads first).
pub async fn list(State(state): State<AppState>) -> Json<Vec<CookieRecord>> {
    Json(state.engine.cookies().list())
}

/// Response from a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// The stored logical name to use in later requests.
    pub name: String,
}

/// Accept a cookie file upload.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(ToString::to_string)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| HttpError::BadRequest("No file selected".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| HttpError::BadRequest(e.to_string()))?;

        let record = state.engine.cookies().upload(&file_name, &data)?;
        return Ok(Json(UploadResponse { name: record.name }));
    }

    Err(HttpError::BadRequest("No file selected".to_string()))
}

/// Delete an uploaded cookie file.
pub async fn delete(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<(), HttpError> {
    state.engine.cookies().delete(&name)?;
    Ok(())
}

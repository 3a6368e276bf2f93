// SPDX-FileCopyrightText: 2026 Nimbus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST handlers: conversation CRUD, uploads, admin user creation.

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use nimbus_chat::is_allowed_mime;
use nimbus_core::{Message, NimbusError};
use nimbus_store::ConversationSummary;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::SessionUser;
use crate::server::AppState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Wrapper mapping [`NimbusError`] onto HTTP statuses with a JSON body.
#[derive(Debug)]
pub struct ApiError(pub NimbusError);

impl From<NimbusError> for ApiError {
    fn from(err: NimbusError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            NimbusError::NotFound(_) => StatusCode::NOT_FOUND,
            NimbusError::InvalidInput(_)
            | NimbusError::EmptyMessage
            | NimbusError::UnsupportedType(_) => StatusCode::BAD_REQUEST,
            NimbusError::Auth(_) => StatusCode::UNAUTHORIZED,
            NimbusError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            NimbusError::Provider { .. } => StatusCode::BAD_GATEWAY,
            NimbusError::Config(_)
            | NimbusError::Storage { .. }
            | NimbusError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// GET /api/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    Ok(Json(state.store.list().await?))
}

/// POST /api/conversations
pub async fn create_conversation(
    State(state): State<AppState>,
) -> Result<Json<ConversationSummary>, ApiError> {
    Ok(Json(state.store.create().await?))
}

/// GET /api/conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(state.store.read(&id).await?))
}

/// Body of PUT /api/conversations/{id}.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// Response of PUT /api/conversations/{id}.
#[derive(Debug, Serialize)]
pub struct RenameResponse {
    pub success: bool,
    pub new_title: String,
}

/// PUT /api/conversations/{id}
pub async fn rename_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RenameRequest>,
) -> Result<Json<RenameResponse>, ApiError> {
    let title = body
        .title
        .ok_or_else(|| NimbusError::InvalidInput("New title not provided".to_string()))?;
    let new_title = state.store.rename(&id, &title).await?;
    Ok(Json(RenameResponse {
        success: true,
        new_title,
    }))
}

/// Response of DELETE /api/conversations/{id}.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// DELETE /api/conversations/{id}
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.store.delete(&id).await?;
    Ok(Json(DeleteResponse { success: true }))
}

/// Response of POST /api/upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub file_id: String,
    pub original_name: String,
    pub mime_type: String,
    pub file_uri: String,
}

/// POST /api/upload
///
/// Accepts a single `file` field, validates its MIME type against the
/// allowlist, and stores the bytes under a unique name for later use as a
/// `pre_uploaded_files` reference.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| NimbusError::InvalidInput(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| NimbusError::InvalidInput("No file selected".to_string()))?;
        let mime_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_default();
        if !is_allowed_mime(&mime_type) {
            return Err(NimbusError::UnsupportedType(mime_type).into());
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| NimbusError::InvalidInput(format!("failed to read upload: {e}")))?;

        let file_id = format!("{}-{}", uuid::Uuid::new_v4(), original_name);
        let path = state.uploads_dir.join(&file_id);
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| NimbusError::storage("failed to store upload", e))?;

        info!(file_id = %file_id, mime_type = %mime_type, size = data.len(), "file uploaded");
        return Ok(Json(UploadResponse {
            success: true,
            file_id,
            original_name,
            mime_type,
            file_uri: path.to_string_lossy().into_owned(),
        }));
    }

    Err(NimbusError::InvalidInput("No file part".to_string()).into())
}

/// Body of POST /admin/users.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// POST /admin/users — admin-only user creation.
pub async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(body): Json<CreateUserRequest>,
) -> Response {
    if !user.is_admin {
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Unauthorized".to_string(),
            }),
        )
            .into_response();
    }

    if body.username.is_empty() || body.password.is_empty() {
        return ApiError(NimbusError::InvalidInput(
            "Missing username or password".to_string(),
        ))
        .into_response();
    }

    match state
        .users
        .create_user(&body.username, &body.password, body.is_admin)
        .await
    {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({"message": "User created successfully"})),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: NimbusError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn error_status_mapping() {
        assert_eq!(status_of(NimbusError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(NimbusError::InvalidInput("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(NimbusError::EmptyMessage), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(NimbusError::UnsupportedType("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(NimbusError::Auth("x".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(NimbusError::NotConfigured),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(NimbusError::provider("x")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(NimbusError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

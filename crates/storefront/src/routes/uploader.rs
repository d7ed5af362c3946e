//! Drag-and-drop product uploader.
//!
//! The API endpoints always answer with JSON, failures included, so the
//! front end can show a message:
//!
//! ```text
//! { "ok": true, "id": 12, "name": "Deore M6100 Cassette" }
//! { "ok": false, "error": "validation", "message": "Missing category" }
//! ```

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use bikeshop_core::ProductId;
use bikeshop_core::catalog::CATEGORIES;

use crate::middleware::RequireAuth;
use crate::services::uploader::{self, ProductUpload, UploadError, UploadedImage};
use crate::state::AppState;

/// Structured uploader API result.
#[derive(Debug)]
pub enum UploaderResponse {
    Created { id: ProductId, name: String },
    Deleted,
    Failed {
        status: StatusCode,
        error: &'static str,
        message: Option<String>,
    },
}

impl UploaderResponse {
    fn validation(message: impl Into<String>) -> Self {
        Self::Failed {
            status: StatusCode::BAD_REQUEST,
            error: "validation",
            message: Some(message.into()),
        }
    }

    fn server(error: &impl std::error::Error) -> Self {
        let event_id = sentry::capture_error(error);
        tracing::error!(error = %error, sentry_event_id = %event_id, "uploader failure");
        Self::Failed {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "server",
            message: Some("Internal server error".to_string()),
        }
    }

    const fn not_found() -> Self {
        Self::Failed {
            status: StatusCode::NOT_FOUND,
            error: "not_found",
            message: None,
        }
    }
}

#[derive(Serialize)]
struct Failure<'a> {
    ok: bool,
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

impl IntoResponse for UploaderResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created { id, name } => {
                Json(json!({ "ok": true, "id": id, "name": name })).into_response()
            }
            Self::Deleted => Json(json!({ "ok": true })).into_response(),
            Self::Failed {
                status,
                error,
                message,
            } => (
                status,
                Json(Failure {
                    ok: false,
                    error,
                    message: message.as_deref(),
                }),
            )
                .into_response(),
        }
    }
}

impl From<UploadError> for UploaderResponse {
    fn from(err: UploadError) -> Self {
        if err.is_client_error() {
            Self::validation(err.to_string())
        } else {
            Self::server(&err)
        }
    }
}

fn multipart_failure(err: &MultipartError) -> UploaderResponse {
    let status = err.status();
    if status.is_server_error() {
        return UploaderResponse::server(err);
    }
    UploaderResponse::Failed {
        status,
        error: "validation",
        message: Some(err.body_text()),
    }
}

/// Collect the uploader's multipart fields. Unknown fields are skipped.
async fn read_upload(mut multipart: Multipart) -> Result<ProductUpload, MultipartError> {
    let mut upload = ProductUpload::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "name" => upload.name = field.text().await?,
            "brand" => upload.brand = field.text().await?,
            "category" => upload.category = field.text().await?,
            "price" => upload.price = field.text().await?,
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was chosen.
                if !(file_name.is_empty() && bytes.is_empty()) {
                    upload.image = Some(UploadedImage { file_name, bytes });
                }
            }
            _ => {}
        }
    }
    Ok(upload)
}

/// `GET /uploader`
pub async fn page(RequireAuth(user): RequireAuth) -> impl IntoResponse {
    Json(json!({ "categories": CATEGORIES, "user": user.username }))
}

/// `POST /uploader/api/create`
#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> UploaderResponse {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(e) => return multipart_failure(&e),
    };

    match uploader::create_product(state.pool(), state.media(), upload).await {
        Ok(created) => UploaderResponse::Created {
            id: created.id,
            name: created.name,
        },
        Err(e) => e.into(),
    }
}

/// `POST /uploader/api/delete/{pk}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
) -> UploaderResponse {
    match uploader::delete_product(state.pool(), state.media(), id).await {
        Ok(true) => UploaderResponse::Deleted,
        Ok(false) => UploaderResponse::not_found(),
        Err(e) => UploaderResponse::server(&e),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_created_shape() {
        let response = UploaderResponse::Created {
            id: ProductId::new(12),
            name: "Deore M6100 Cassette".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "ok": true, "id": 12, "name": "Deore M6100 Cassette" })
        );
    }

    #[tokio::test]
    async fn test_validation_shape() {
        let response = UploaderResponse::from(UploadError::MissingCategory).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "ok": false, "error": "validation", "message": "Missing category" })
        );
    }

    #[tokio::test]
    async fn test_not_found_has_no_message() {
        let response = UploaderResponse::not_found().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({ "ok": false, "error": "not_found" })
        );
    }

    #[tokio::test]
    async fn test_server_error_hides_details() {
        let err = UploadError::Repository(crate::db::RepositoryError::Conflict(
            "product_name_key".to_string(),
        ));
        let response = UploaderResponse::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "server");
        assert_eq!(body["message"], "Internal server error");
    }
}

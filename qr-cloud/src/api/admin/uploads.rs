//! Image upload
//!
//! POST /api/admin/uploads/{kind} with a multipart `file` field, where kind is
//! `logo` or `menu`. A logo upload also becomes the restaurant's `logo_url`.

use axum::extract::multipart::MultipartError;
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
};
use http::StatusCode;
use shared::error::{AppError, ErrorCode};

use crate::api::{ApiResult, internal};
use crate::auth::{StaffIdentity, require_manager};
use crate::db;
use crate::state::AppState;
use crate::storage::{StoredImage, UploadKind};

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::new(ErrorCode::FileTooLarge);
    }
    AppError::invalid_request(format!("Multipart error: {e}"))
}

pub async fn upload(
    State(state): State<AppState>,
    Extension(identity): Extension<StaffIdentity>,
    Path(kind): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<StoredImage> {
    require_manager(&identity)?;
    let kind: UploadKind = kind.parse()?;

    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::new(ErrorCode::NoFilename))?;
        let data = field.bytes().await.map_err(multipart_error)?;
        file = Some((filename, data.to_vec()));
        break;
    }
    let (filename, data) = file.ok_or_else(|| AppError::new(ErrorCode::NoFileProvided))?;

    let ext = state.images.validate(&data, &filename)?;
    let stored = state
        .images
        .store(identity.restaurant_id, kind, &data, ext)
        .await?;

    if kind == UploadKind::Logo {
        db::restaurants::set_logo(&state.pool, identity.restaurant_id, &stored.url)
            .await
            .map_err(internal)?;
        tracing::info!(restaurant_id = identity.restaurant_id, url = %stored.url, "Logo updated");
    }
    Ok(Json(stored))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use http::{Request, StatusCode};
    use shared::error::ErrorCode;
    use shared::models::StaffRole;

    use crate::api::test_support::{send, state};
    use crate::auth::staff_auth::create_token;

    const BOUNDARY: &str = "qrcloudboundary";

    fn multipart(kind: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let token = create_token(10, 1, StaffRole::Manager, "test-jwt-secret").unwrap();
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::post(format!("/api/admin/uploads/{kind}"))
            .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                http::header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_text_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            state(dir.path()),
            multipart("menu", "notes.txt", b"plain text"),
        )
        .await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["code"], ErrorCode::UnsupportedFileFormat.code());
    }

    #[tokio::test]
    async fn test_disguised_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (status, _) = send(
            state(dir.path()),
            multipart("menu", "dish.png", b"definitely not a png"),
        )
        .await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_empty_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(state(dir.path()), multipart("menu", "dish.png", b"")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], ErrorCode::EmptyFile.code());
    }

    #[tokio::test]
    async fn test_unknown_kind_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (status, _) = send(state(dir.path()), multipart("avatar", "me.png", b"x")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_menu_image_stored() {
        let dir = tempfile::tempdir().unwrap();
        let png = crate::storage::tiny_png();

        let (status, body) = send(state(dir.path()), multipart("menu", "dish.PNG", &png)).await;
        assert_eq!(status, StatusCode::OK);
        let url = body["url"].as_str().unwrap();
        assert!(url.starts_with("/uploads/1/menu/"));
        assert!(url.ends_with(".png"));
        assert_eq!(body["size"], png.len());
    }
}

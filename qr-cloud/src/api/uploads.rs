//! Serve stored images
//!
//! GET /uploads/{restaurant_id}/{kind}/{file}

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use http::header;
use shared::error::AppError;

use crate::state::AppState;

pub async fn serve_upload(
    State(state): State<AppState>,
    Path((restaurant_id, kind, file)): Path<(i64, String, String)>,
) -> Result<Response, AppError> {
    let (data, mime) = state.images.read(restaurant_id, &kind, &file).await?;
    Ok((
        [
            (header::CONTENT_TYPE, mime),
            // Content-addressed, never changes
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        data,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::api::test_support::{send, state};
    use crate::storage::{UploadKind, tiny_png};

    #[tokio::test]
    async fn test_serves_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        let st = state(dir.path());
        let png = tiny_png();
        let stored = st.images.store(3, UploadKind::Logo, &png, "png").await.unwrap();

        let response = crate::api::create_router(st)
            .oneshot(Request::get(&stored.url).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[http::header::CONTENT_TYPE], "image/png");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), png.as_slice());
    }

    #[tokio::test]
    async fn test_missing_and_invalid_paths() {
        let dir = tempfile::tempdir().unwrap();
        let st = state(dir.path());
        let missing = format!("/uploads/3/menu/{}.png", "b".repeat(64));
        let (status, _) = send(st.clone(), Request::get(missing).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            st,
            Request::get("/uploads/3/menu/secret.png").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], shared::error::ErrorCode::InvalidFilePath.code());
    }
}

//! HTTP API for qr-cloud

pub mod admin;
pub mod auth;
pub mod billing_webhook;
pub mod health;
pub mod public;
pub mod uploads;

use axum::routing::{get, post};
use axum::{Router, middleware};
use http::{HeaderName, HeaderValue};
use shared::error::AppError;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;

use crate::auth::rate_limit::login_rate_limit;
use crate::state::AppState;

pub type ApiResult<T> = Result<axum::Json<T>, AppError>;

pub use crate::error::internal;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// All routes with state, no outer middleware
pub fn create_router(state: AppState) -> Router {
    // Login and registration (per-IP rate limited)
    let auth = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));

    // Gateway webhook (signature-verified, raw body)
    let webhook =
        Router::new().route("/api/billing/webhook", post(billing_webhook::handle_webhook));

    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/uploads/{restaurant_id}/{kind}/{file}",
            get(uploads::serve_upload),
        )
        .merge(auth)
        .merge(webhook)
        .merge(public::router(state.clone()))
        .merge(admin::router(state.clone()))
        .with_state(state)
}

/// Router plus the tower-http stack used by the server
pub fn build_app(state: AppState, cors_origins: &[String]) -> Router {
    create_router(state)
        .layer(cors_layer(cors_origins))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
}

/// Explicit origins when configured, permissive otherwise
fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if parsed.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::state::AppState;
    use crate::storage::ImageStore;

    /// State over a pool that never connects; only paths that fail before any
    /// query can be exercised.
    pub fn state(upload_dir: &std::path::Path) -> AppState {
        let config = Config::for_tests();
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy("postgres://qr:qr@127.0.0.1:9/qr")
            .unwrap();
        AppState::with_pool(&config, pool, ImageStore::new(upload_dir, 64 * 1024))
    }

    pub async fn send(state: AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = super::create_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use http::{Request, StatusCode};

    use super::test_support::{send, state};

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(state(dir.path()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "qr-cloud");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::get("/api/nope").body(Body::empty()).unwrap();
        let (status, _) = send(state(dir.path()), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_cors_layer_tolerates_bad_origins() {
        let _ = super::cors_layer(&["https://ok.example.com".into(), "bad\norigin".into()]);
        let _ = super::cors_layer(&[]);
    }
}

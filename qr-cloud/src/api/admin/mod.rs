//! Staff API under `/api/admin`
//!
//! Every route needs a staff Bearer token. Handlers that change configuration
//! (zones, tables, menu, staff, inventory, billing) additionally call
//! [`require_manager`](crate::auth::require_manager).

mod billing;
mod customers;
mod inventory;
mod live;
mod menu;
mod orders;
mod requests;
mod restaurant;
mod staff;
mod stats;
mod tables;
mod uploads;
mod zones;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::{Router, middleware};

use crate::auth::staff_auth::staff_auth_middleware;
use crate::state::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new().nest("/api/admin", routes(state))
}

/// Multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

fn routes(state: AppState) -> Router<AppState> {
    let upload_limit = DefaultBodyLimit::max(state.images.max_bytes() + MULTIPART_OVERHEAD);

    let restaurant_routes = Router::new()
        .route(
            "/restaurant",
            get(restaurant::get_restaurant).put(restaurant::update_restaurant),
        )
        .route("/settings", get(restaurant::list_settings))
        .route(
            "/settings/{key}",
            put(restaurant::upsert_setting).delete(restaurant::delete_setting),
        )
        .route(
            "/uploads/{kind}",
            post(uploads::upload).layer(upload_limit),
        )
        .route("/stats", get(stats::dashboard))
        .route("/live", get(live::stream));

    let floor_routes = Router::new()
        .route("/zones", get(zones::list).post(zones::create))
        .route("/zones/{id}", put(zones::update).delete(zones::delete))
        .route("/tables", get(tables::list).post(tables::create))
        .route("/tables/{id}", put(tables::update).delete(tables::delete))
        .route("/tables/{id}/qr", get(tables::qr_link))
        .route("/tables/{id}/regenerate-qr", post(tables::regenerate_qr));

    let menu_routes = Router::new()
        .route("/menu", get(menu::list).post(menu::create))
        .route(
            "/menu/{id}",
            get(menu::get).put(menu::update).delete(menu::delete),
        )
        .route("/menu/{id}/availability", put(menu::set_availability));

    let service_routes = Router::new()
        .route("/orders", get(orders::list))
        .route("/orders/{id}", get(orders::get))
        .route("/orders/{id}/status", put(orders::update_status))
        .route("/orders/{id}/payments", post(orders::record_payment))
        .route("/staff-calls", get(requests::list_staff_calls))
        .route(
            "/staff-calls/{id}/acknowledge",
            post(requests::acknowledge_staff_call),
        )
        .route("/staff-calls/{id}/resolve", post(requests::resolve_staff_call))
        .route("/zone-requests", get(requests::list_zone_requests))
        .route("/zone-requests/{id}", get(requests::get_zone_request))
        .route(
            "/zone-requests/{id}/approve",
            post(requests::approve_zone_request),
        )
        .route(
            "/zone-requests/{id}/reject",
            post(requests::reject_zone_request),
        )
        .route("/customers", get(customers::list))
        .route("/customers/{id}", get(customers::get));

    let people_routes = Router::new()
        .route("/staff", get(staff::list).post(staff::create))
        .route("/staff/{id}", put(staff::update).delete(staff::delete));

    let stock_routes = Router::new()
        .route("/inventory", get(inventory::list).post(inventory::create))
        .route("/inventory/low-stock", get(inventory::low_stock))
        .route(
            "/inventory/{id}",
            get(inventory::get)
                .put(inventory::update)
                .delete(inventory::delete),
        )
        .route("/inventory/{id}/restock", post(inventory::restock))
        .route("/deductions", get(inventory::list_deductions))
        .route(
            "/wastage",
            get(inventory::list_wastage).post(inventory::record_wastage),
        )
        .route("/wastage/summary", get(inventory::wastage_summary));

    let billing_routes = Router::new()
        .route(
            "/subscription",
            get(billing::overview).post(billing::create_subscription),
        )
        .route("/subscription/verify", post(billing::verify_subscription))
        .route("/payments", get(billing::list_payments));

    Router::new()
        .merge(restaurant_routes)
        .merge(floor_routes)
        .merge(menu_routes)
        .merge(service_routes)
        .merge(people_routes)
        .merge(stock_routes)
        .merge(billing_routes)
        .route_layer(middleware::from_fn_with_state(
            state,
            staff_auth_middleware,
        ))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use http::{Request, StatusCode};
    use shared::error::ErrorCode;
    use shared::models::StaffRole;

    use crate::api::test_support::{send, state};
    use crate::auth::staff_auth::create_token;

    fn bearer(role: StaffRole) -> String {
        let token = create_token(10, 1, role, "test-jwt-secret").unwrap();
        format!("Bearer {token}")
    }

    #[tokio::test]
    async fn test_missing_token() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            state(dir.path()),
            Request::get("/api/admin/orders").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], ErrorCode::NotAuthenticated.code());
    }

    #[tokio::test]
    async fn test_token_from_other_secret() {
        let dir = tempfile::tempdir().unwrap();
        let token = create_token(10, 1, StaffRole::Owner, "another-secret").unwrap();
        let (status, body) = send(
            state(dir.path()),
            Request::get("/api/admin/zones")
                .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], ErrorCode::TokenInvalid.code());
    }

    #[tokio::test]
    async fn test_session_token_is_not_a_staff_token() {
        let dir = tempfile::tempdir().unwrap();
        let st = state(dir.path());
        let (session, _) = st
            .sessions
            .issue(1, 2, chrono::Utc::now().timestamp())
            .unwrap();
        let (status, _) = send(
            st,
            Request::get("/api/admin/menu")
                .header(http::header::AUTHORIZATION, format!("Bearer {session}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_waiter_cannot_manage() {
        let dir = tempfile::tempdir().unwrap();
        for (method, uri) in [
            ("POST", "/api/admin/zones"),
            ("DELETE", "/api/admin/tables/5"),
            ("GET", "/api/admin/staff"),
            ("GET", "/api/admin/inventory"),
            ("GET", "/api/admin/payments"),
            ("GET", "/api/admin/stats"),
        ] {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header(http::header::AUTHORIZATION, bearer(StaffRole::Waiter))
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"name":"Patio"}"#))
                .unwrap();
            let (status, body) = send(state(dir.path()), request).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
            assert_eq!(body["code"], ErrorCode::ManagerRequired.code());
        }
    }

    #[tokio::test]
    async fn test_unknown_admin_route_is_404_not_401() {
        let dir = tempfile::tempdir().unwrap();
        let (status, _) = send(
            state(dir.path()),
            Request::get("/api/admin/nothing-here")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

//! QR scan: open a table session and browse the menu

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{PublicMenuItem, Restaurant, Zone, is_plausible_qr_token, visible_menu};

use crate::api::{ApiResult, internal};
use crate::auth::TableSession;
use crate::db;
use crate::state::AppState;

use super::session_table;

#[derive(Serialize)]
pub struct PublicRestaurant {
    pub id: i64,
    pub name: String,
    pub currency: String,
    pub tax_rate: Decimal,
    pub logo_url: Option<String>,
}

impl From<Restaurant> for PublicRestaurant {
    fn from(r: Restaurant) -> Self {
        Self {
            id: r.id,
            name: r.name,
            currency: r.currency,
            tax_rate: r.tax_rate,
            logo_url: r.logo_url,
        }
    }
}

#[derive(Serialize)]
pub struct SessionTable {
    pub id: i64,
    pub name: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    /// Unix seconds
    pub expires_at: i64,
    pub restaurant: PublicRestaurant,
    pub table: SessionTable,
    pub zone: Option<Zone>,
    pub menu: Vec<PublicMenuItem>,
}

fn table_not_found() -> AppError {
    AppError::with_message(ErrorCode::TableNotFound, "Unknown or inactive table")
}

/// GET /api/public/tables/{qr_token}/session
pub async fn open_session(
    State(state): State<AppState>,
    Path(qr_token): Path<String>,
) -> ApiResult<SessionResponse> {
    if !is_plausible_qr_token(&qr_token) {
        return Err(table_not_found());
    }

    let table = db::tables::find_by_qr_token(&state.pool, &qr_token)
        .await
        .map_err(internal)?
        .filter(|t| t.is_active)
        .ok_or_else(table_not_found)?;

    let restaurant = db::restaurants::get(&state.pool, table.restaurant_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound))?;

    let zone = match table.zone_id {
        Some(zone_id) => db::zones::get(&state.pool, restaurant.id, zone_id)
            .await
            .map_err(internal)?,
        None => None,
    };

    let items = db::menu::list_available(&state.pool, restaurant.id)
        .await
        .map_err(internal)?;
    let menu = visible_menu(&items, table.zone_id);

    let (token, expires_at) = state
        .sessions
        .issue(
            restaurant.id,
            table.id,
            chrono::Utc::now().timestamp(),
        )
        .map_err(internal)?;

    tracing::info!(
        restaurant_id = restaurant.id,
        table_id = table.id,
        zone_id = ?table.zone_id,
        "Table session opened"
    );

    Ok(Json(SessionResponse {
        token,
        expires_at,
        restaurant: restaurant.into(),
        table: SessionTable {
            id: table.id,
            name: table.name,
        },
        zone,
        menu,
    }))
}

/// GET /api/public/menu
///
/// Visible from the zone the table is in now, not the one it was in when the
/// session opened.
pub async fn menu(
    State(state): State<AppState>,
    session: TableSession,
) -> ApiResult<Vec<PublicMenuItem>> {
    let table = session_table(&state, &session).await?;
    let items = db::menu::list_available(&state.pool, session.restaurant_id)
        .await
        .map_err(internal)?;
    Ok(Json(visible_menu(&items, table.zone_id)))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use http::{Request, StatusCode};

    use crate::api::test_support::{send, state};
    use shared::error::ErrorCode;

    #[tokio::test]
    async fn test_implausible_token_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            state(dir.path()),
            Request::get("/api/public/tables/short/session")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], ErrorCode::TableNotFound.code());
    }

    #[tokio::test]
    async fn test_menu_requires_session() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            state(dir.path()),
            Request::get("/api/public/menu").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], ErrorCode::NotAuthenticated.code());
    }

    #[tokio::test]
    async fn test_expired_session_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let st = state(dir.path());
        let issued = chrono::Utc::now().timestamp() - 4 * 3600;
        let (token, _) = st.sessions.issue(1, 2, issued).unwrap();
        let (status, body) = send(
            st,
            Request::get("/api/public/menu")
                .header(crate::auth::session::SESSION_HEADER, token)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], ErrorCode::SessionExpired.code());
    }
}

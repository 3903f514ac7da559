//! Customer-facing API
//!
//! Everything except opening a session needs the `X-Session-Token` header
//! obtained by scanning a table's QR code.

mod chat;
mod orders;
mod requests;
mod session;

use axum::routing::{get, post};
use axum::{Router, middleware};
use shared::error::{AppError, ErrorCode};
use shared::models::DiningTable;

use crate::auth::TableSession;
use crate::auth::rate_limit::public_write_rate_limit;
use crate::db;
use crate::state::AppState;

use super::internal;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new().nest("/api/public", routes(state))
}

fn routes(state: AppState) -> Router<AppState> {
    let read_routes = Router::new()
        .route("/tables/{qr_token}/session", get(session::open_session))
        .route("/menu", get(session::menu))
        .route("/orders/{id}", get(orders::get_order));

    let write_routes = Router::new()
        .route("/orders", post(orders::place_order))
        .route("/staff-calls", post(requests::create_staff_call))
        .route("/zone-requests", post(requests::create_zone_request))
        .route("/chat", post(chat::chat))
        .layer(middleware::from_fn_with_state(state, public_write_rate_limit));

    read_routes.merge(write_routes)
}

/// The session's table, still live and accepting guests
async fn session_table(state: &AppState, session: &TableSession) -> Result<DiningTable, AppError> {
    let table = db::tables::get(&state.pool, session.restaurant_id, session.table_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::TableNotFound))?;
    if !table.is_active {
        return Err(AppError::new(ErrorCode::TableInactive));
    }
    Ok(table)
}

//! Restaurant registration and staff login

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{Restaurant, StaffMember, normalize_email, validate_email, validate_password};

use crate::auth::staff_auth::create_token;
use crate::db;
use crate::state::AppState;
use crate::util::{hash_password, verify_password};

use super::{ApiResult, internal};

/// POST /api/auth/register
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub restaurant_name: String,
    pub owner_name: String,
    pub email: String,
    pub password: String,
}

/// POST /api/auth/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub restaurant: Restaurant,
    pub staff: StaffMember,
}

fn token_error(e: jsonwebtoken::errors::Error) -> AppError {
    tracing::error!("JWT creation failed: {e}");
    AppError::new(ErrorCode::InternalError)
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    if req.restaurant_name.trim().is_empty() {
        return Err(AppError::required("restaurant_name"));
    }
    if req.owner_name.trim().is_empty() {
        return Err(AppError::required("owner_name"));
    }
    validate_email(&req.email)?;
    validate_password(&req.password)?;

    let email = normalize_email(&req.email);
    let password_hash = hash_password(&req.password).map_err(internal)?;

    let (restaurant, owner) = db::restaurants::create_with_owner(
        &state.pool,
        &db::restaurants::NewRestaurant {
            name: &req.restaurant_name,
            owner_name: &req.owner_name,
            owner_email: &email,
            password_hash: &password_hash,
        },
    )
    .await?;

    let token = create_token(owner.id, restaurant.id, owner.role, &state.jwt_secret)
        .map_err(token_error)?;

    tracing::info!(restaurant_id = restaurant.id, slug = %restaurant.slug, "Restaurant registered");

    Ok(Json(AuthResponse {
        token,
        restaurant,
        staff: owner,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let email = normalize_email(&req.email);
    let staff = db::staff::find_auth_by_email(&state.pool, &email)
        .await
        .map_err(|e| {
            tracing::error!("DB error during login: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .ok_or_else(|| AppError::invalid_credentials())?;

    if !verify_password(&req.password, &staff.password_hash) {
        return Err(AppError::invalid_credentials());
    }
    if !staff.is_active {
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let restaurant = db::restaurants::get(&state.pool, staff.restaurant_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound))?;

    let token = create_token(staff.id, staff.restaurant_id, staff.role, &state.jwt_secret)
        .map_err(token_error)?;

    tracing::info!(restaurant_id = staff.restaurant_id, staff_id = staff.id, "Staff logged in");

    Ok(Json(AuthResponse {
        token,
        restaurant,
        staff: staff.into_member(),
    }))
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use serde_json::json;

    use crate::api::test_support::{json_request, send, state};

    #[tokio::test]
    async fn test_register_validates_before_db() {
        let dir = tempfile::tempdir().unwrap();
        let st = state(dir.path());

        let (status, body) = send(
            st.clone(),
            json_request(
                "POST",
                "/api/auth/register",
                json!({"restaurant_name": "Spice Route", "owner_name": "Asha", "email": "asha@spice.in", "password": "short"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], shared::error::ErrorCode::PasswordTooShort as u16);

        let (status, _) = send(
            st,
            json_request(
                "POST",
                "/api/auth/register",
                json!({"restaurant_name": " ", "owner_name": "Asha", "email": "asha@spice.in", "password": "long enough"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_rate_limited() {
        let dir = tempfile::tempdir().unwrap();
        let st = state(dir.path());
        let bad = || {
            json_request(
                "POST",
                "/api/auth/register",
                json!({"restaurant_name": "X", "owner_name": "Y", "email": "nope", "password": "long enough"}),
            )
        };
        for _ in 0..5 {
            let (status, _) = send(st.clone(), bad()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
        let (status, _) = send(st, bad()).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }
}

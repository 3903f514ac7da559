//! Staff JWT authentication for the admin API

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::StaffRole;

use crate::state::AppState;

/// JWT claims for staff authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct StaffClaims {
    /// Staff member ID
    pub sub: i64,
    pub restaurant_id: i64,
    pub role: StaffRole,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated staff member extracted from the JWT
#[derive(Debug, Clone, Copy)]
pub struct StaffIdentity {
    pub staff_id: i64,
    pub restaurant_id: i64,
    pub role: StaffRole,
}

const JWT_EXPIRY_HOURS: i64 = 24;

pub fn create_token(
    staff_id: i64,
    restaurant_id: i64,
    role: StaffRole,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = StaffClaims {
        sub: staff_id,
        restaurant_id,
        role,
        exp: (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn decode_token(token: &str, secret: &str) -> AppResult<StaffIdentity> {
    let token_data = jsonwebtoken::decode::<StaffClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::new(ErrorCode::TokenExpired)
            }
            _ => AppError::new(ErrorCode::TokenInvalid),
        }
    })?;

    Ok(StaffIdentity {
        staff_id: token_data.claims.sub,
        restaurant_id: token_data.claims.restaurant_id,
        role: token_data.claims.role,
    })
}

/// Middleware that verifies the Bearer token and stores a [`StaffIdentity`]
pub async fn staff_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::NotAuthenticated, "Missing Authorization header")
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::with_message(ErrorCode::NotAuthenticated, "Invalid Authorization format")
    })?;

    let identity = decode_token(token, &state.jwt_secret)?;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Owners and managers only
pub fn require_manager(identity: &StaffIdentity) -> AppResult<()> {
    if identity.role.can_manage() {
        Ok(())
    } else {
        Err(AppError::new(ErrorCode::ManagerRequired).with_detail("role", identity.role.as_str()))
    }
}

//! Table session tokens
//!
//! Scanning a table's QR code opens a session: a short-lived HS256 token
//! naming the restaurant and table. Customer endpoints read it from the
//! `X-Session-Token` header. The table's zone is looked up per request, so a
//! table moved to another zone takes effect for sessions already open. It is
//! signed with its own secret, so a session token is never accepted as a staff
//! token or the other way round.

use axum::extract::FromRequestParts;
use http::request::Parts;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};

use crate::state::AppState;

pub const SESSION_HEADER: &str = "x-session-token";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub restaurant_id: i64,
    pub table_id: i64,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// `iat + ttl` (Unix seconds)
    pub exp: i64,
}

/// Verified session of a customer seated at a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSession {
    pub restaurant_id: i64,
    pub table_id: i64,
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct SessionKeys {
    secret: String,
    ttl_secs: i64,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            secret: secret.to_string(),
            ttl_secs: ttl_minutes.max(1) * 60,
        }
    }

    /// Sign a session issued at `now_secs`; returns the token and its expiry
    pub fn issue(
        &self,
        restaurant_id: i64,
        table_id: i64,
        now_secs: i64,
    ) -> Result<(String, i64), jsonwebtoken::errors::Error> {
        let claims = SessionClaims {
            restaurant_id,
            table_id,
            iat: now_secs,
            exp: now_secs + self.ttl_secs,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok((token, claims.exp))
    }

    /// Check signature and `now < iat + ttl`
    pub fn verify(&self, token: &str, now_secs: i64) -> AppResult<TableSession> {
        let mut validation = Validation::default();
        // Expiry is checked below against the caller's clock
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!("Session token rejected: {e}");
            AppError::invalid_token("Invalid session token")
        })?;

        let claims = data.claims;
        if now_secs >= claims.iat.saturating_add(self.ttl_secs) || now_secs >= claims.exp {
            return Err(AppError::new(ErrorCode::SessionExpired));
        }

        Ok(TableSession {
            restaurant_id: claims.restaurant_id,
            table_id: claims.table_id,
            expires_at: claims.exp,
        })
    }

    /// Verify the session header if present
    pub fn from_headers(&self, headers: &http::HeaderMap) -> AppResult<Option<TableSession>> {
        match headers.get(SESSION_HEADER) {
            None => Ok(None),
            Some(value) => {
                let token = value.to_str().map_err(|_| {
                    AppError::invalid_token("Invalid session token")
                })?;
                self.verify(token, chrono::Utc::now().timestamp()).map(Some)
            }
        }
    }
}

impl FromRequestParts<AppState> for TableSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state.sessions.from_headers(&parts.headers)?.ok_or_else(|| {
            AppError::with_message(ErrorCode::NotAuthenticated, "Missing session token")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_760_000_000;

    #[test]
    fn test_issue_and_verify() {
        let keys = SessionKeys::new("session-secret", 180);
        let (token, exp) = keys.issue(1, 2, NOW).unwrap();
        assert_eq!(exp, NOW + 180 * 60);

        let session = keys.verify(&token, NOW + 60).unwrap();
        assert_eq!(session.restaurant_id, 1);
        assert_eq!(session.table_id, 2);
    }

    #[test]
    fn test_token_carries_no_zone() {
        let keys = SessionKeys::new("session-secret", 180);
        let (token, _) = keys.issue(1, 2, NOW).unwrap();

        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        let raw = jsonwebtoken::decode::<serde_json::Value>(
            &token,
            &DecodingKey::from_secret(b"session-secret"),
            &validation,
        )
        .unwrap()
        .claims;
        assert_eq!(raw["restaurant_id"], 1);
        assert_eq!(raw["table_id"], 2);
        assert!(raw.get("zone_id").is_none());
    }

    #[test]
    fn test_expired_session() {
        let keys = SessionKeys::new("session-secret", 30);
        let (token, _) = keys.issue(1, 2, NOW).unwrap();
        assert!(keys.verify(&token, NOW + 30 * 60 - 1).is_ok());
        assert_eq!(
            keys.verify(&token, NOW + 30 * 60).unwrap_err().code,
            ErrorCode::SessionExpired
        );
    }

    #[test]
    fn test_forged_session() {
        let keys = SessionKeys::new("session-secret", 30);
        let forger = SessionKeys::new("guessed-secret", 30);
        let (token, _) = forger.issue(1, 2, NOW).unwrap();
        assert_eq!(
            keys.verify(&token, NOW).unwrap_err().code,
            ErrorCode::TokenInvalid
        );
        assert_eq!(
            keys.verify("not.a.jwt", NOW).unwrap_err().code,
            ErrorCode::TokenInvalid
        );
    }

    #[test]
    fn test_staff_token_is_not_a_session() {
        let keys = SessionKeys::new("shared-secret", 30);
        let staff = crate::auth::staff_auth::create_token(
            1,
            1,
            shared::models::StaffRole::Owner,
            "shared-secret",
        )
        .unwrap();
        // Same secret still fails: the claims do not describe a table
        assert!(keys.verify(&staff, NOW).is_err());
    }

    #[test]
    fn test_ttl_shortened_after_issue() {
        let long = SessionKeys::new("s", 180);
        let short = SessionKeys::new("s", 10);
        let (token, _) = long.issue(1, 2, NOW).unwrap();
        assert_eq!(
            short.verify(&token, NOW + 11 * 60).unwrap_err().code,
            ErrorCode::SessionExpired
        );
    }
}

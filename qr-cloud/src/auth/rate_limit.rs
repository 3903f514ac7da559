//! Per-client request budgets for login and customer writes
//!
//! Each (bucket, client) pair gets a fixed one-minute window. The client is
//! the TCP peer address; `X-Forwarded-For` is only honoured when the service
//! is configured to sit behind a trusted proxy, since any caller can set it.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use shared::error::{AppError, ErrorCode};

use crate::state::AppState;

const WINDOW: Duration = Duration::from_secs(60);

/// A named request budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// Login and registration
    Login,
    /// Orders, staff calls, zone requests, chat
    PublicWrite,
}

impl Bucket {
    /// Requests allowed per window
    fn limit(self) -> u32 {
        match self {
            Bucket::Login => 5,
            Bucket::PublicWrite => 30,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Bucket::Login => "login",
            Bucket::PublicWrite => "public_write",
        }
    }
}

/// `None` groups every caller whose address could not be determined
type ClientKey = (Bucket, Option<IpAddr>);

#[derive(Debug, Clone, Copy)]
struct Window {
    opened: Instant,
    hits: u32,
}

#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<DashMap<ClientKey, Window>>,
    trust_forwarded_for: bool,
}

impl RateLimiter {
    pub fn new(trust_forwarded_for: bool) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            trust_forwarded_for,
        }
    }

    /// Count one request at `now`; `false` once the client's budget is spent
    fn allow_at(&self, bucket: Bucket, client: Option<IpAddr>, now: Instant) -> bool {
        let mut window = self.windows.entry((bucket, client)).or_insert(Window {
            opened: now,
            hits: 0,
        });
        if now.saturating_duration_since(window.opened) >= WINDOW {
            *window = Window {
                opened: now,
                hits: 0,
            };
        }
        window.hits = window.hits.saturating_add(1);
        window.hits <= bucket.limit()
    }

    fn allow(&self, bucket: Bucket, client: Option<IpAddr>) -> bool {
        self.allow_at(bucket, client, Instant::now())
    }

    /// Drop windows that have run out; an expired window and no window
    /// behave the same.
    fn prune_at(&self, now: Instant) {
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.opened) < WINDOW);
    }

    pub fn prune(&self) {
        self.prune_at(Instant::now());
    }

    /// Address the budget is charged to
    fn client_of(&self, request: &Request) -> Option<IpAddr> {
        if self.trust_forwarded_for
            && let Some(ip) = forwarded_for(request)
        {
            return Some(ip);
        }
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip())
    }

    fn enforce(&self, bucket: Bucket, request: &Request) -> Result<(), AppError> {
        let client = self.client_of(request);
        if self.allow(bucket, client) {
            return Ok(());
        }
        tracing::warn!(client = ?client, bucket = bucket.as_str(), "Rate limit exceeded");
        Err(AppError::with_message(
            ErrorCode::TooManyRequests,
            "Too many requests, try again later",
        ))
    }
}

/// First parseable address in `X-Forwarded-For`
fn forwarded_for(request: &Request) -> Option<IpAddr> {
    request
        .headers()
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Login and registration
pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    state.rate_limiter.enforce(Bucket::Login, &request)?;
    Ok(next.run(request).await)
}

/// Customer writes; reads are not counted
pub async fn public_write_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if request.method() != http::Method::GET {
        state.rate_limiter.enforce(Bucket::PublicWrite, &request)?;
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn ip(s: &str) -> Option<IpAddr> {
        Some(s.parse().unwrap())
    }

    fn request_from(peer: &str, forwarded: Option<&str>) -> Request {
        let mut builder = Request::builder();
        if let Some(value) = forwarded {
            builder = builder.header("x-forwarded-for", value);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        request
    }

    #[test]
    fn test_budget_per_bucket_and_client() {
        let limiter = RateLimiter::new(false);
        let now = Instant::now();
        for _ in 0..5 {
            assert!(limiter.allow_at(Bucket::Login, ip("10.0.0.1"), now));
        }
        assert!(!limiter.allow_at(Bucket::Login, ip("10.0.0.1"), now));
        assert!(limiter.allow_at(Bucket::Login, ip("10.0.0.2"), now));
        assert!(limiter.allow_at(Bucket::PublicWrite, ip("10.0.0.1"), now));
    }

    #[test]
    fn test_window_reopens_after_a_minute() {
        let limiter = RateLimiter::new(false);
        let start = Instant::now();
        for _ in 0..30 {
            limiter.allow_at(Bucket::PublicWrite, None, start);
        }
        assert!(!limiter.allow_at(Bucket::PublicWrite, None, start + Duration::from_secs(59)));
        assert!(limiter.allow_at(Bucket::PublicWrite, None, start + WINDOW));
    }

    #[test]
    fn test_prune_keeps_open_windows() {
        let limiter = RateLimiter::new(false);
        let start = Instant::now();
        limiter.allow_at(Bucket::Login, ip("10.0.0.1"), start);
        limiter.allow_at(Bucket::Login, ip("10.0.0.2"), start + Duration::from_secs(30));

        limiter.prune_at(start + Duration::from_secs(61));
        assert_eq!(limiter.windows.len(), 1);
        assert!(limiter.windows.contains_key(&(Bucket::Login, ip("10.0.0.2"))));
    }

    #[test]
    fn test_forwarded_for_ignored_by_default() {
        let limiter = RateLimiter::new(false);
        let request = request_from("198.51.100.4:5000", Some("203.0.113.7"));
        assert_eq!(limiter.client_of(&request), ip("198.51.100.4"));

        // Rotating the header does not buy a fresh budget
        for n in 0..5 {
            let request = request_from("198.51.100.4:5000", Some(&format!("203.0.113.{n}")));
            assert!(limiter.enforce(Bucket::Login, &request).is_ok());
        }
        let request = request_from("198.51.100.4:5000", Some("203.0.113.99"));
        assert_eq!(
            limiter.enforce(Bucket::Login, &request).unwrap_err().code,
            ErrorCode::TooManyRequests
        );
    }

    #[test]
    fn test_forwarded_for_behind_trusted_proxy() {
        let limiter = RateLimiter::new(true);
        let request = request_from("10.0.0.1:5000", Some("203.0.113.7, 10.0.0.1"));
        assert_eq!(limiter.client_of(&request), ip("203.0.113.7"));

        // Garbage in the header falls back to the peer
        let request = request_from("10.0.0.1:5000", Some("not-an-ip"));
        assert_eq!(limiter.client_of(&request), ip("10.0.0.1"));

        let bare = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(limiter.client_of(&bare), None);
    }
}

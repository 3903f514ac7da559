//! Application state shared by every handler

use sqlx::PgPool;

use crate::auth::rate_limit::RateLimiter;
use crate::auth::session::SessionKeys;
use crate::config::Config;
use crate::db::BoxError;
use crate::gateway::GatewayClient;
use crate::live::LiveHub;
use crate::llm::LlmClient;
use crate::storage::ImageStore;

#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Signing secret for staff JWTs
    pub jwt_secret: String,
    /// Table session token signer/verifier
    pub sessions: SessionKeys,
    /// Base URL printed into table QR codes
    pub public_base_url: String,
    /// Rate limiter for login and public write routes
    pub rate_limiter: RateLimiter,
    /// Per-restaurant live event channels
    pub live: LiveHub,
    pub gateway: GatewayClient,
    pub llm: LlmClient,
    pub images: ImageStore,
}

impl AppState {
    /// Connect to PostgreSQL, run migrations and build the state
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        let images = ImageStore::new(&config.upload_dir, config.max_upload_bytes);
        images.ensure_root().await?;

        Ok(Self::with_pool(config, pool, images))
    }

    pub fn with_pool(config: &Config, pool: PgPool, images: ImageStore) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self {
            pool,
            jwt_secret: config.jwt_secret.clone(),
            sessions: SessionKeys::new(&config.session_secret, config.qr_session_ttl_minutes),
            public_base_url: config.public_base_url.clone(),
            rate_limiter: RateLimiter::new(config.trust_forwarded_for),
            live: LiveHub::new(),
            gateway: GatewayClient::new(http.clone(), config.gateway.clone()),
            llm: LlmClient::new(http, config.llm.clone()),
            images,
        }
    }
}

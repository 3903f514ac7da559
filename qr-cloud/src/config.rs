//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Server configuration, read once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Signing secret for staff JWTs
    pub jwt_secret: String,
    /// Signing secret for table session tokens
    pub session_secret: String,
    pub qr_session_ttl_minutes: i64,
    /// Customer-facing base URL that QR codes point at
    pub public_base_url: String,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    pub gateway: GatewayConfig,
    pub llm: LlmConfig,
    /// Allowed CORS origins, empty means any
    pub cors_origins: Vec<String>,
    /// Charge rate limits to the first `X-Forwarded-For` address instead of
    /// the TCP peer. Only set behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

/// Payment gateway credentials and plan ids
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub webhook_secret: String,
    pub base_url: String,
    pub plan_basic: String,
    pub plan_pro: String,
    /// Plan id for enterprise, only set when sold self-serve
    pub plan_enterprise: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub host: String,
    pub model: String,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: parse_env("HTTP_PORT").unwrap_or(8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            session_secret: Self::require_secret("SESSION_SECRET", &environment)?,
            qr_session_ttl_minutes: parse_env("QR_SESSION_TTL_MINUTES").unwrap_or(180),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES").unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            gateway: GatewayConfig {
                key_id: Self::require_secret("GATEWAY_KEY_ID", &environment)?,
                key_secret: Self::require_secret("GATEWAY_KEY_SECRET", &environment)?,
                webhook_secret: Self::require_secret("GATEWAY_WEBHOOK_SECRET", &environment)?,
                base_url: std::env::var("GATEWAY_BASE_URL")
                    .unwrap_or_else(|_| "https://api.razorpay.com".into()),
                plan_basic: std::env::var("GATEWAY_PLAN_BASIC")
                    .unwrap_or_else(|_| "plan_basic_monthly".into()),
                plan_pro: std::env::var("GATEWAY_PLAN_PRO")
                    .unwrap_or_else(|_| "plan_pro_monthly".into()),
                plan_enterprise: std::env::var("GATEWAY_PLAN_ENTERPRISE")
                    .ok()
                    .filter(|s| !s.is_empty()),
            },
            llm: LlmConfig {
                host: std::env::var("LLM_HOST")
                    .unwrap_or_else(|_| "http://localhost:11434".into()),
                model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "llama3.2".into()),
            },
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            trust_forwarded_for: parse_env("TRUST_FORWARDED_FOR").unwrap_or(false),
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
impl Config {
    /// Development config for router tests (no env access)
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/qr_cloud_test".into(),
            http_port: 0,
            environment: "development".into(),
            jwt_secret: "test-jwt-secret".into(),
            session_secret: "test-session-secret".into(),
            qr_session_ttl_minutes: 180,
            public_base_url: "https://order.example.com".into(),
            upload_dir: "uploads".into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            gateway: GatewayConfig {
                key_id: "rzp_test_key".into(),
                key_secret: "test-key-secret".into(),
                webhook_secret: "test-webhook-secret".into(),
                base_url: "http://127.0.0.1:9".into(),
                plan_basic: "plan_basic".into(),
                plan_pro: "plan_pro".into(),
                plan_enterprise: None,
            },
            llm: LlmConfig {
                host: "http://127.0.0.1:9".into(),
                model: "llama3.2".into(),
            },
            cors_origins: Vec::new(),
            trust_forwarded_for: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list(" https://a.example , ,https://b.example"),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_require_secret_in_development() {
        let val = Config::require_secret("QR_CLOUD_TEST_UNSET_SECRET", "development").unwrap();
        assert_eq!(val, "dev-QR_CLOUD_TEST_UNSET_SECRET-not-for-production");
        assert!(Config::require_secret("QR_CLOUD_TEST_UNSET_SECRET", "production").is_err());
    }
}

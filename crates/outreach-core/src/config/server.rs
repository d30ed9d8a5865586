use std::env;

const PORT: u16 = 4000;
const MAX_PAYLOAD_MB: u64 = 150;
const MAX_REQUEST_BODY_MB: u64 = 256;

/// Ingestion server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub storage_path: String,
    pub public_base_url: String,
    /// Expected bearer token; any bearer token is accepted when unset (development only)
    pub api_token: Option<String>,
    /// Total payload gate across all fields; `None` disables the gate
    pub max_payload_bytes: Option<u64>,
    /// Hard transport limit on the request body
    pub max_request_body_bytes: u64,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let port = env::var("PORT")
            .unwrap_or_else(|_| PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let max_payload_mb: u64 = env::var("MAX_PAYLOAD_MB")
            .unwrap_or_else(|_| MAX_PAYLOAD_MB.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("MAX_PAYLOAD_MB must be a valid number"))?;

        let max_request_body_mb: u64 = env::var("MAX_REQUEST_BODY_MB")
            .unwrap_or_else(|_| MAX_REQUEST_BODY_MB.to_string())
            .parse()
            .unwrap_or(MAX_REQUEST_BODY_MB);

        let config = Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            environment,
            cors_origins,
            storage_path: env::var("STORAGE_PATH").unwrap_or_else(|_| "./data/uploads".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}/files", port)),
            api_token: env::var("API_TOKEN").ok().filter(|s| !s.trim().is_empty()),
            max_payload_bytes: (max_payload_mb > 0).then_some(max_payload_mb * 1024 * 1024),
            max_request_body_bytes: max_request_body_mb * 1024 * 1024,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() {
            if self.api_token.is_none() {
                return Err(anyhow::anyhow!("API_TOKEN must be set in production"));
            }
            if self.cors_origins.iter().any(|o| o == "*") {
                return Err(anyhow::anyhow!(
                    "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
                ));
            }
        }

        if let Some(gate) = self.max_payload_bytes {
            if gate > self.max_request_body_bytes {
                return Err(anyhow::anyhow!(
                    "MAX_PAYLOAD_MB must not exceed MAX_REQUEST_BODY_MB"
                ));
            }
        }

        if self.public_base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("PUBLIC_BASE_URL must not be empty"));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

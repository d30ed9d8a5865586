use std::time::Duration;

const API_URL: &str = "http://localhost:4000";
const TRANSFER_TIMEOUT_SECS: u64 = 120;
const DELETE_CONCURRENCY: usize = 1;

/// Client-side pipeline configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    /// Opaque bearer credential supplied by the authentication collaborator
    pub api_token: Option<String>,
    pub transfer_timeout: Duration,
    pub compression_concurrency: usize,
    pub delete_concurrency: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: API_URL.to_string(),
            api_token: None,
            transfer_timeout: Duration::from_secs(TRANSFER_TIMEOUT_SECS),
            compression_concurrency: default_compression_concurrency(),
            delete_concurrency: DELETE_CONCURRENCY,
        }
    }
}

fn default_compression_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
}

impl ClientConfig {
    /// Load from the environment: `OUTREACH_API_URL`, `OUTREACH_API_TOKEN`,
    /// `TRANSFER_TIMEOUT_SECS`, `COMPRESSION_CONCURRENCY`, `DELETE_CONCURRENCY`.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let transfer_timeout_secs: u64 = match lookup("TRANSFER_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("TRANSFER_TIMEOUT_SECS must be a valid number"))?,
            None => TRANSFER_TIMEOUT_SECS,
        };

        let compression_concurrency = match lookup("COMPRESSION_CONCURRENCY") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("COMPRESSION_CONCURRENCY must be a valid number"))?,
            None => defaults.compression_concurrency,
        };

        let delete_concurrency = match lookup("DELETE_CONCURRENCY") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("DELETE_CONCURRENCY must be a valid number"))?,
            None => DELETE_CONCURRENCY,
        };

        let config = Self {
            api_url: lookup("OUTREACH_API_URL").unwrap_or(defaults.api_url),
            api_token: lookup("OUTREACH_API_TOKEN").filter(|s| !s.trim().is_empty()),
            transfer_timeout: Duration::from_secs(transfer_timeout_secs),
            compression_concurrency,
            delete_concurrency,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "OUTREACH_API_URL must start with http:// or https://"
            ));
        }
        if self.transfer_timeout.is_zero() {
            return Err(anyhow::anyhow!("TRANSFER_TIMEOUT_SECS must be greater than zero"));
        }
        if self.compression_concurrency == 0 {
            return Err(anyhow::anyhow!("COMPRESSION_CONCURRENCY must be at least 1"));
        }
        if self.delete_concurrency == 0 {
            return Err(anyhow::anyhow!("DELETE_CONCURRENCY must be at least 1"));
        }
        Ok(())
    }

    /// Token required for network operations
    pub fn require_token(&self) -> Result<&str, anyhow::Error> {
        self.api_token
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Missing API token. Set OUTREACH_API_TOKEN"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_url, "http://localhost:4000");
        assert_eq!(config.transfer_timeout, Duration::from_secs(120));
        assert_eq!(config.delete_concurrency, 1);
        assert!(config.api_token.is_none());
        assert!(config.require_token().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("OUTREACH_API_URL", "https://media.example.org"),
            ("OUTREACH_API_TOKEN", "secret"),
            ("TRANSFER_TIMEOUT_SECS", "30"),
            ("DELETE_CONCURRENCY", "4"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://media.example.org");
        assert_eq!(config.require_token().unwrap(), "secret");
        assert_eq!(config.transfer_timeout, Duration::from_secs(30));
        assert_eq!(config.delete_concurrency, 4);
    }

    #[test]
    fn test_invalid_values() {
        assert!(ClientConfig::from_lookup(lookup_from(&[("TRANSFER_TIMEOUT_SECS", "0")])).is_err());
        assert!(ClientConfig::from_lookup(lookup_from(&[("DELETE_CONCURRENCY", "x")])).is_err());
        assert!(ClientConfig::from_lookup(lookup_from(&[("OUTREACH_API_URL", "ftp://x")])).is_err());
    }
}

//! Drift persistence configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;

/// Where drift records go and how often delivery is retried
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Directory of the durable local queue
    #[serde(default = "default_queue_dir")]
    pub queue_dir: PathBuf,

    /// Base URL of the REST drift store; records stay queued locally when unset
    pub store_url: Option<String>,

    /// API key for the REST drift store
    pub store_api_key: Option<SecretString>,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl PersistenceConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn has_remote_store(&self) -> bool {
        self.store_url.as_ref().is_some_and(|u| !u.is_empty())
    }

    /// Validate persistence configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::MustBePositive("poll_interval_ms"));
        }
        if self.batch_size == 0 {
            return Err(ValidationError::MustBePositive("batch_size"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::MustBePositive("request_timeout_secs"));
        }
        if let Some(url) = self.store_url.as_deref().filter(|u| !u.is_empty()) {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidStoreUrl);
            }
            if self.store_api_key.is_none() {
                return Err(ValidationError::MissingRequired("STORE_API_KEY"));
            }
        }
        Ok(())
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            queue_dir: default_queue_dir(),
            store_url: None,
            store_api_key: None,
            poll_interval_ms: default_poll_interval_ms(),
            batch_size: default_batch_size(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_queue_dir() -> PathBuf {
    PathBuf::from("./data/drift-queue")
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_batch_size() -> usize {
    50
}

fn default_request_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    #[test]
    fn test_persistence_defaults() {
        let config = PersistenceConfig::default();
        assert_eq!(config.queue_dir, PathBuf::from("./data/drift-queue"));
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(!config.has_remote_store());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_store_url_requires_key() {
        let config = PersistenceConfig {
            store_url: Some("https://db.example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("STORE_API_KEY"))
        );

        let config = PersistenceConfig {
            store_api_key: Some(Secret::new("key".to_string())),
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_store_url_must_be_http() {
        let config = PersistenceConfig {
            store_url: Some("ftp://db.example.com".to_string()),
            store_api_key: Some(Secret::new("key".to_string())),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidStoreUrl));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = PersistenceConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MustBePositive("batch_size"))
        );
    }
}

//! REST drift store - appends drift records to a PostgREST-style
//! `drift_logs` table over HTTP.
//!
//! # Configuration
//!
//! ```ignore
//! let config = RestDriftStoreConfig::new("https://db.example.com", api_key)
//!     .with_timeout(Duration::from_secs(5));
//!
//! let store = RestDriftRecordStore::new(config)?;
//! ```
//!
//! Inserts are conflict-ignoring on `shipment_id` (the observation id), so a
//! record delivered twice leaves exactly one row.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::domain::drift::DriftRecord;
use crate::ports::{DriftRecordStore, PersistenceError};

const DRIFT_LOGS_TABLE: &str = "drift_logs";
const CONFLICT_COLUMN: &str = "shipment_id";

/// Configuration for the REST drift store.
#[derive(Debug, Clone)]
pub struct RestDriftStoreConfig {
    /// Base URL of the REST backend, without the `/rest/v1` suffix.
    pub base_url: String,
    api_key: Secret<String>,
    pub timeout: Duration,
}

impl RestDriftStoreConfig {
    pub fn new(base_url: impl Into<String>, api_key: Secret<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// One row of the `drift_logs` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftLogRow {
    pub forwarder_id: String,
    pub shipment_id: String,
    pub drift_type: String,
    pub magnitude: f64,
    pub drift_time: f64,
    pub drift_cost: f64,
    pub predicted_time: f64,
    pub predicted_cost: f64,
    pub actual_time: f64,
    pub actual_cost: f64,
    pub weight_delta: BTreeMap<String, f64>,
    pub weights_version: u64,
    pub adjustment_reason: String,
    pub logged_at: String,
}

impl From<&DriftRecord> for DriftLogRow {
    fn from(record: &DriftRecord) -> Self {
        Self {
            forwarder_id: record.alternative_id.to_string(),
            shipment_id: record.observation_id.to_string(),
            drift_type: record.drift_kind.as_str().to_string(),
            magnitude: record.drift_magnitude,
            drift_time: record.drift_time,
            drift_cost: record.drift_cost,
            predicted_time: record.predicted.time,
            predicted_cost: record.predicted.cost,
            actual_time: record.actual.time,
            actual_cost: record.actual.cost,
            weight_delta: record.proposed_weight_delta.clone(),
            weights_version: record.weights_version.value(),
            adjustment_reason: record.reasoning.clone(),
            logged_at: record.recorded_at.to_rfc3339(),
        }
    }
}

/// Drift record store backed by a REST table endpoint.
pub struct RestDriftRecordStore {
    config: RestDriftStoreConfig,
    client: Client,
}

impl RestDriftRecordStore {
    pub fn new(config: RestDriftStoreConfig) -> Result<Self, PersistenceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PersistenceError::unavailable(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.base_url, DRIFT_LOGS_TABLE)
    }

    fn insert_url(&self) -> String {
        format!("{}?on_conflict={}", self.table_url(), CONFLICT_COLUMN)
    }

    fn map_transport_error(err: reqwest::Error) -> PersistenceError {
        if err.is_timeout() {
            PersistenceError::unavailable("request timed out")
        } else {
            PersistenceError::unavailable(err.to_string())
        }
    }
}

#[async_trait]
impl DriftRecordStore for RestDriftRecordStore {
    async fn insert(&self, record: &DriftRecord) -> Result<(), PersistenceError> {
        let row = DriftLogRow::from(record);

        let response = self
            .client
            .post(self.insert_url())
            .header("apikey", self.config.api_key())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .header("Prefer", "resolution=ignore-duplicates,return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status();
        if status.is_success() || status == StatusCode::CONFLICT {
            debug!(observation_id = %record.observation_id, status = %status, "Drift record stored");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(PersistenceError::unavailable(format!("status {}: {}", status, body)));
        }

        Err(PersistenceError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    async fn is_available(&self) -> bool {
        let probe = self
            .client
            .get(self.table_url())
            .query(&[("select", CONFLICT_COLUMN), ("limit", "1")])
            .header("apikey", self.config.api_key())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .send()
            .await;

        matches!(probe, Ok(response) if response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RestDriftStoreConfig {
        RestDriftStoreConfig::new("https://db.example.com/", Secret::new("key".to_string()))
    }

    #[test]
    fn row_carries_original_column_names() {
        let record = DriftRecord::test_fixture("SHP-42");
        let row = DriftLogRow::from(&record);
        let json = serde_json::to_value(&row).unwrap();

        assert_eq!(json["forwarder_id"], "dhl");
        assert_eq!(json["shipment_id"], "SHP-42");
        assert_eq!(json["drift_type"], "combined");
        assert_eq!(json["magnitude"], 5.0);
        assert_eq!(json["weights_version"], 2);
        assert_eq!(
            json["adjustment_reason"],
            "Detected drift: delivery late, cost higher than expected"
        );
        assert_eq!(json["weight_delta"]["reliability"], -0.05);
    }

    #[test]
    fn urls_strip_trailing_slash() {
        let store = RestDriftRecordStore::new(config()).unwrap();
        assert_eq!(store.table_url(), "https://db.example.com/rest/v1/drift_logs");
        assert_eq!(
            store.insert_url(),
            "https://db.example.com/rest/v1/drift_logs?on_conflict=shipment_id"
        );
    }

    #[test]
    fn config_debug_does_not_leak_key() {
        let debug = format!("{:?}", config().with_timeout(Duration::from_secs(3)));
        assert!(!debug.contains("\"key\""));
        assert!(debug.contains("REDACTED"));
    }

    #[tokio::test]
    async fn unreachable_backend_is_unavailable() {
        let config = RestDriftStoreConfig::new("http://127.0.0.1:9", Secret::new("k".to_string()))
            .with_timeout(Duration::from_millis(500));
        let store = RestDriftRecordStore::new(config).unwrap();

        assert!(!store.is_available().await);
        let err = store
            .insert(&DriftRecord::test_fixture("SHP-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Unavailable(_)));
    }
}

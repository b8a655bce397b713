//! # rxtrace-summary — Alert Summarization Client
//!
//! Typed client for the external summarization service. The contract is a
//! black box: a list of alerts goes in, one free-text summary comes out.
//!
//! ```text
//! POST {base}/v1/summaries
//! { "alerts": [ { "alertId", "batchId", "timestamp", "type", "details" } ] }
//! → 200 { "summary": "..." }
//! ```
//!
//! Severity is not sent. Nothing here is on the transition write path; a
//! failed summary never blocks a custody change.

pub mod config;
pub mod error;
pub mod retry;

pub use config::{ConfigError, SummaryConfig};
pub use error::SummaryError;
pub use retry::RetryPolicy;

use std::time::Duration;

use rxtrace_core::{Alert, Timestamp};
use serde::{Deserialize, Serialize};

/// One alert as sent to the summarizer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryAlert<'a> {
    pub alert_id: &'a str,
    pub batch_id: &'a str,
    pub timestamp: Timestamp,
    #[serde(rename = "type")]
    pub alert_type: &'a str,
    pub details: &'a str,
}

impl<'a> From<&'a Alert> for SummaryAlert<'a> {
    fn from(alert: &'a Alert) -> Self {
        Self {
            alert_id: alert.alert_id.as_str(),
            batch_id: alert.batch_id.as_str(),
            timestamp: alert.timestamp,
            alert_type: &alert.alert_type,
            details: &alert.details,
        }
    }
}

/// Request body.
#[derive(Debug, Serialize)]
pub struct SummaryRequest<'a> {
    pub alerts: Vec<SummaryAlert<'a>>,
}

/// Response body.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// Client for the summarization service.
#[derive(Debug, Clone)]
pub struct SummaryClient {
    http: reqwest::Client,
    base_url: url::Url,
    retry: RetryPolicy,
}

impl SummaryClient {
    /// Create a client from configuration.
    pub fn new(config: SummaryConfig) -> Result<Self, SummaryError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = &config.api_token {
            headers.insert(
                reqwest::header::AUTHORIZATION,
                reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|_| ConfigError::InvalidToken)?,
            );
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| SummaryError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self {
            http,
            base_url: config.base_url,
            retry: RetryPolicy {
                max_retries: config.max_retries,
                ..RetryPolicy::default()
            },
        })
    }

    /// Replace the backoff policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }

    /// Summarize a list of alerts.
    ///
    /// Calls `POST {base_url}v1/summaries`. An empty list is rejected
    /// locally without a request. Unavailability (connect failures,
    /// timeouts, 429/502/503/504) is retried per the client's
    /// [`RetryPolicy`]; the last answer is reported as-is.
    pub async fn summarize(&self, alerts: &[&Alert]) -> Result<String, SummaryError> {
        if alerts.is_empty() {
            return Err(SummaryError::NoAlerts);
        }
        let endpoint = "POST /v1/summaries";
        let url = format!("{}v1/summaries", self.base_url);
        let body = SummaryRequest {
            alerts: alerts.iter().map(|a| SummaryAlert::from(*a)).collect(),
        };

        let resp = self
            .retry
            .run(|| self.http.post(&url).json(&body).send())
            .await
            .map_err(|e| SummaryError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SummaryError::Api {
                endpoint: endpoint.into(),
                status,
                body,
            });
        }

        let parsed: SummaryResponse =
            resp.json().await.map_err(|e| SummaryError::Deserialization {
                endpoint: endpoint.into(),
                source: e,
            })?;
        tracing::debug!(alerts = alerts.len(), "alert summary received");
        Ok(parsed.summary)
    }
}

//! HTTP client for the fleet application's internal job endpoints.
//!
//! Each job maps to `POST {base}/internal/jobs/{job-name}`. The fleet app
//! answers `{"processed": n}`; an empty body counts as zero.

use std::time::Duration;

use async_trait::async_trait;
use fleetcron_core::settings::jobs;
use fleetcron_core::AppConfig;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::effects::{ReminderDispatcher, TripFinalizer, TripOptimizer};
use crate::error::EffectError;

const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Deserialize)]
struct JobResponse {
    #[serde(default)]
    processed: usize,
}

#[derive(Debug, Clone)]
pub struct FleetApiClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl FleetApiClient {
    /// # Errors
    ///
    /// Returns [`EffectError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`EffectError::InvalidUrl`] if `base_url` does not parse.
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, EffectError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("fleetcron/0.1")
            .build()?;

        // Exactly one trailing slash, so joins append to the base path
        // instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| EffectError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.map(str::to_owned),
        })
    }

    /// # Errors
    ///
    /// See [`FleetApiClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, EffectError> {
        Self::new(
            &config.fleet_api_url,
            config.fleet_api_key.as_deref(),
            config.http_timeout_secs,
        )
    }

    fn endpoint(&self, job: &str) -> Result<Url, EffectError> {
        self.base_url
            .join(&format!("internal/jobs/{job}"))
            .map_err(|e| EffectError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn post_job(&self, job: &str, body: serde_json::Value) -> Result<usize, EffectError> {
        let url = self.endpoint(job)?;
        let mut request = self.client.post(url.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EffectError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(0);
        }
        let parsed: JobResponse =
            serde_json::from_str(&text).map_err(|e| EffectError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        tracing::debug!(job, processed = parsed.processed, "scheduler: fleet API call complete");
        Ok(parsed.processed)
    }
}

#[async_trait]
impl TripOptimizer for FleetApiClient {
    async fn optimize_trips(&self) -> Result<(), EffectError> {
        self.post_job(jobs::TRIP_OPTIMIZE, serde_json::json!({}))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl ReminderDispatcher for FleetApiClient {
    async fn send_trip_reminders(&self) -> Result<usize, EffectError> {
        self.post_job(jobs::TRIP_REMINDER, serde_json::json!({})).await
    }
}

#[async_trait]
impl TripFinalizer for FleetApiClient {
    async fn finalize_trips(&self, lead_hours: u32) -> Result<usize, EffectError> {
        self.post_job(
            jobs::TRIP_FINALIZE,
            serde_json::json!({ "lead_hours": lead_hours }),
        )
        .await
    }
}

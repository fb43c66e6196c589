//! HTTP client for the script endpoint.
//!
//! Every call is a GET with query parameters. Fetches return a `Result` the
//! caller is expected to log and drop; pushes are spawned and never awaited.

use std::time::Duration;

use chrono::NaiveDate;
use tokio::task::JoinHandle;
use url::Url;

use super::types::{parse_history, parse_settings, RemoteAction};
use crate::contributions::ContributionHistory;
use crate::error::SyncError;
use crate::storage::RemoteConfig;
use crate::timer::{Mode, TimerSettings};

/// Client for the remote script endpoint.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl RemoteClient {
    /// Create a client for `endpoint` with a per-request timeout.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, SyncError> {
        let endpoint = Url::parse(endpoint).map_err(|e| SyncError::InvalidEndpoint {
            url: endpoint.to_string(),
            message: e.to_string(),
        })?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    /// Build from configuration. Fails with [`SyncError::Disabled`] when sync is off.
    pub fn from_config(config: &RemoteConfig) -> Result<Self, SyncError> {
        if !config.enabled {
            return Err(SyncError::Disabled);
        }
        Self::new(&config.endpoint, Duration::from_secs(config.timeout_secs.max(1)))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Full request URL for `action`.
    pub fn request_url(&self, action: &RemoteAction) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in action.query() {
                pairs.append_pair(key, &value);
            }
        }
        url
    }

    async fn send(&self, action: &RemoteAction) -> Result<reqwest::Response, SyncError> {
        let url = self.request_url(action);
        tracing::debug!(action = action.name(), "remote request");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn fetch_json(&self, action: &RemoteAction) -> Result<serde_json::Value, SyncError> {
        let response = self.send(action).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| SyncError::MalformedResponse {
            action: action.name().to_string(),
            message: e.to_string(),
        })
    }

    /// `getAllDurations`
    pub async fn fetch_settings(&self) -> Result<TimerSettings, SyncError> {
        let body = self.fetch_json(&RemoteAction::GetAllDurations).await?;
        parse_settings(&body)
    }

    /// `getHistory`
    pub async fn fetch_history(&self) -> Result<ContributionHistory, SyncError> {
        let body = self.fetch_json(&RemoteAction::GetHistory).await?;
        parse_history(&body)
    }

    /// Perform `action`, ignoring the response body.
    pub async fn execute(&self, action: &RemoteAction) -> Result<(), SyncError> {
        self.send(action).await.map(|_| ())
    }

    /// `updateDuration(key, value)`
    pub async fn update_duration(&self, mode: Mode, minutes: u32) -> Result<(), SyncError> {
        self.execute(&RemoteAction::UpdateDuration { mode, minutes }).await
    }

    /// `incrementHistory(key, value)`
    pub async fn increment_history(&self, day: NaiveDate, minutes: u32) -> Result<(), SyncError> {
        self.execute(&RemoteAction::IncrementHistory { day, minutes }).await
    }

    /// Fire-and-forget `action` on the current tokio runtime.
    ///
    /// Failures are logged. Returns `None` when called outside a runtime, in
    /// which case nothing is sent.
    pub fn push(&self, action: RemoteAction) -> Option<JoinHandle<()>> {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(action = action.name(), "no async runtime; remote push dropped");
                return None;
            }
        };
        let client = self.clone();
        Some(handle.spawn(async move {
            match client.execute(&action).await {
                Ok(()) => tracing::debug!(action = action.name(), "remote push done"),
                Err(e) => tracing::warn!(action = action.name(), error = %e, "remote push failed"),
            }
        }))
    }
}

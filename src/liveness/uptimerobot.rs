use crate::liveness::{LivenessError, LivenessGate};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

/// Monitor status UptimeRobot uses for "up"
const STATUS_UP: u8 = 2;

#[derive(Debug, Deserialize)]
struct MonitorsResponse {
    #[serde(default)]
    monitors: Vec<Monitor>,
}

#[derive(Debug, Deserialize)]
struct Monitor {
    #[serde(default)]
    status: Option<u8>,
}

impl MonitorsResponse {
    /// Down unless the first monitor reports up; no monitor means down
    fn is_down(&self) -> bool {
        self.monitors
            .first()
            .map_or(true, |monitor| monitor.status != Some(STATUS_UP))
    }
}

/// UptimeRobot `getMonitors` check
pub struct UptimeRobotGate {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl UptimeRobotGate {
    pub fn new(client: Client, endpoint: Url, api_key: String) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl LivenessGate for UptimeRobotGate {
    async fn is_down(&self, url: &Url) -> Result<bool, LivenessError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&[
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
                ("urls", url.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LivenessError::Status(status.as_u16()));
        }

        let parsed: MonitorsResponse = response
            .json()
            .await
            .map_err(|e| LivenessError::UnexpectedResponse(e.to_string()))?;

        if parsed.monitors.is_empty() {
            tracing::warn!("No monitors found for {}, assuming site is down", url);
        }

        Ok(parsed.is_down())
    }
}

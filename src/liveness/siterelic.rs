use crate::liveness::{LivenessError, LivenessGate};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpRequest<'a> {
    url: &'a str,
    follow_redirect: bool,
    proxy_country: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpResponse {
    #[serde(default)]
    api_code: Option<u16>,
    #[serde(default)]
    api_status: Option<String>,
}

impl UpResponse {
    fn is_up(&self) -> bool {
        self.api_code == Some(200) && self.api_status.as_deref() == Some("success")
    }
}

/// SiteRelic `/up` check
///
/// A site is up only when the response says `apiCode: 200` and
/// `apiStatus: "success"`.
pub struct SiteRelicGate {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl SiteRelicGate {
    pub fn new(client: Client, endpoint: Url, api_key: String) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl LivenessGate for SiteRelicGate {
    async fn is_down(&self, url: &Url) -> Result<bool, LivenessError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-api-key", &self.api_key)
            .json(&UpRequest {
                url: url.as_str(),
                follow_redirect: true,
                proxy_country: "us",
            })
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 || status.is_server_error() {
            return Err(LivenessError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: UpResponse = serde_json::from_str(&body)
            .map_err(|e| LivenessError::UnexpectedResponse(e.to_string()))?;
        tracing::debug!("SiteRelic response for {}: {}", url, body);

        Ok(!parsed.is_up())
    }
}

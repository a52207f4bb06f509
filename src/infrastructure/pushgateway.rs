use crate::domain::errors::PushFailure;
use crate::domain::ports::MetricsPusher;
use crate::domain::push_target::PushTarget;
use crate::infrastructure::core::HttpClientFactory;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

/// Content type of the text exposition format
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

const MAX_ERROR_BODY_CHARS: usize = 256;

/// HTTP pusher for a Prometheus Pushgateway
pub struct HttpPusher {
    client: Client,
}

impl HttpPusher {
    pub fn new(request_timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: HttpClientFactory::create_client(request_timeout)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MetricsPusher for HttpPusher {
    async fn push(&self, target: &PushTarget, payload: String) -> Result<(), PushFailure> {
        let url = target.endpoint()?;
        let bytes = payload.len();

        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)
            .body(payload)
            .send()
            .await
            .map_err(|source| PushFailure::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PushFailure::Rejected {
                url: url.to_string(),
                status: status.as_u16(),
                body: body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        debug!("Pushed {} bytes to {} ({})", bytes, url, status);
        Ok(())
    }
}

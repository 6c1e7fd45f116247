use crate::{
    error::LifiError,
    types::{LifiConfig, TransfersPage},
};
use reqwest::Client;
use retry_utils::{retry_fixed_delay, ErrorClass};
use std::time::Duration;
use transfer_core::TimestampWindow;
use tracing::{debug, info};

/// Client for the LI.FI transfer-analytics feed (read-only, cursor paginated)
#[derive(Debug, Clone)]
pub struct LifiClient {
    client: Client,
    config: LifiConfig,
}

impl LifiClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self, LifiError> {
        Self::with_config(LifiConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: LifiConfig) -> Result<Self, LifiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &LifiConfig {
        &self.config
    }

    /// Fetch one page of completed transfers for the window.
    ///
    /// The request itself (network + status check) is retried on the fixed
    /// policy; a 2xx body that fails to decode is surfaced immediately since
    /// repeating the request would return the same payload.
    pub async fn fetch_page(
        &self,
        window: TimestampWindow,
        cursor: Option<&str>,
    ) -> Result<TransfersPage, LifiError> {
        let body = retry_fixed_delay(
            || self.request_page(window, cursor),
            &self.config.retry,
            |e: &LifiError| {
                if e.is_transient() {
                    ErrorClass::Transient
                } else {
                    ErrorClass::Fatal
                }
            },
        )
        .await?;

        let page: TransfersPage = serde_json::from_str(&body)?;
        debug!(
            "Decoded page: {} transfers, hasNext={:?}",
            page.data.len(),
            page.has_next
        );
        Ok(page)
    }

    /// One GET attempt, returning the raw body on a 2xx status
    async fn request_page(
        &self,
        window: TimestampWindow,
        cursor: Option<&str>,
    ) -> Result<String, LifiError> {
        let mut query: Vec<(&str, String)> = vec![
            ("status", "DONE".to_string()),
            ("limit", self.config.page_limit.to_string()),
            ("fromTimestamp", window.from.to_string()),
            ("toTimestamp", window.to.to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("next", cursor.to_string()));
        }

        info!(
            "📡 LI.FI request: window {}..{}, cursor={}",
            window.from,
            window.to,
            cursor
                .map(|c| format!("{}…", c.chars().take(30).collect::<String>()))
                .unwrap_or_else(|| "none".to_string())
        );

        let response = self
            .client
            .get(&self.config.api_base_url)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LifiError::Api {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        Ok(response.text().await?)
    }
}

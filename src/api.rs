//! 推論サービスの JSON エンドポイント
//!
//! - `POST {base}/share/generate`
//! - `GET {base}/health`

use crate::config::{join_url, Config};
use crate::error::{DetectError, Result};
use crate::share::ShareCardApi;
use crate::transport::Transport;
use async_trait::async_trait;
use furniture_detect_common::{HealthStatus, ShareCardRequest, ShareCardResponse};
use reqwest::Method;

#[derive(Debug, Clone)]
pub struct ApiClient {
    transport: Transport,
    base_url: String,
}

impl ApiClient {
    pub fn new(transport: Transport, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(Transport::new(config.timeout())?, config.base_url.clone()))
    }

    /// 分享卡片を生成し、カードURLを返す
    pub async fn generate_share_card(&self, request: &ShareCardRequest) -> Result<String> {
        let body = serde_json::to_value(request)?;
        let value = self
            .transport
            .request(
                Method::POST,
                &join_url(&self.base_url, "share/generate"),
                Some(&body),
                &[("content-type", "application/json")],
            )
            .await?;

        let response: ShareCardResponse = serde_json::from_value(value).map_err(DetectError::parse)?;
        if response.is_failure() {
            return Err(DetectError::LogicalFailure { error: response.error });
        }
        response
            .card_url()
            .map(str::to_string)
            .ok_or_else(|| DetectError::Parse("响应中缺少 card_url".into()))
    }

    pub async fn health_check(&self) -> Result<HealthStatus> {
        let value = self
            .transport
            .request(Method::GET, &join_url(&self.base_url, "health"), None, &[])
            .await?;
        serde_json::from_value(value).map_err(DetectError::parse)
    }
}

#[async_trait]
impl ShareCardApi for ApiClient {
    async fn generate_share_card(&self, request: &ShareCardRequest) -> Result<String> {
        ApiClient::generate_share_card(self, request).await
    }
}

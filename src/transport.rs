//! 汎用リクエスト実行
//!
//! JSON API 呼び出し用（ファイルアップロード以外）。
//! 固定タイムアウトで1回だけ送信し、再試行はしない。再試行はワークフロー側で
//! ユーザーが改めて操作することで行う。

use crate::error::{DetectError, Result, TransportStage};
use furniture_detect_common::{decode_body, detail_message};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    timeout: Duration,
}

impl Transport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DetectError::Config(format!("HTTP客户端初始化失败: {}", e)))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// リクエストを送信し、2xxならボディを復号して返す
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        headers: &[(&str, &str)],
    ) -> Result<Value> {
        log::debug!("{} {}", method, url);

        let mut builder = self.client.request(method, url);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DetectError::transport(TransportStage::Request, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DetectError::transport(TransportStage::Request, &e))?;

        if status.is_success() {
            return decode_body(&text).map_err(DetectError::parse);
        }

        // エラーボディは復号できなくても status を優先する
        let body = decode_body(&text).ok();
        Err(DetectError::HttpStatus {
            status: status.as_u16(),
            detail: body.as_ref().and_then(detail_message),
            body,
        })
    }
}

//! 画像アップロードモジュール
//!
//! 処理順:
//! 1. サイズ検査（上限超過ならネットワークに出ない）
//! 2. `POST {base}/furniture/detect` へ multipart 送信
//! 3. ボディ復号（オブジェクト / JSON文字列）
//! 4. HTTPステータス判定
//! 5. 業務成功判定（`success: false` / `data` なし）

use crate::config::{join_url, Config};
use crate::error::{DetectError, Result, TransportStage};
use crate::media::LocalImageHandle;
use async_trait::async_trait;
use furniture_detect_common::{decode_body, detail_message, parse_detect_response, DetectionResult};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::collections::BTreeMap;

/// 画像フィールド名
const IMAGE_FIELD: &str = "image";
const DISCLAIMER_FIELD: &str = "disclaimer_accepted";
const BYTES_PER_MB: u64 = 1024 * 1024;

/// アップロード時に添えるフォーム項目
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadMetadata {
    fields: BTreeMap<String, String>,
}

impl UploadMetadata {
    /// 免責同意フラグだけを持つメタデータ
    pub fn with_disclaimer(accepted: bool) -> Self {
        Self::default().field(DISCLAIMER_FIELD, if accepted { "true" } else { "false" })
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// 画像アップロード（ワークフローから見た境界）
#[async_trait]
pub trait ImageUpload: Send + Sync {
    async fn upload(&self, handle: &LocalImageHandle, metadata: &UploadMetadata) -> Result<DetectionResult>;
}

#[derive(Debug, Clone)]
pub struct HttpUploader {
    client: Client,
    endpoint: String,
    max_image_size_mb: u64,
}

impl HttpUploader {
    pub fn new(base_url: &str, timeout: std::time::Duration, max_image_size_mb: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DetectError::Config(format!("HTTP客户端初始化失败: {}", e)))?;
        Ok(Self {
            client,
            endpoint: join_url(base_url, "furniture/detect"),
            max_image_size_mb,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.base_url, config.timeout(), config.max_image_size_mb)
    }

    /// 上限ちょうどまでは通す
    pub fn max_image_bytes(&self) -> u64 {
        self.max_image_size_mb.saturating_mul(BYTES_PER_MB)
    }

    /// 上限を超えていれば SizeLimit
    pub fn check_size(&self, size_bytes: u64) -> Result<()> {
        if size_bytes > self.max_image_bytes() {
            return Err(DetectError::SizeLimit {
                size_bytes,
                limit_mb: self.max_image_size_mb,
            });
        }
        Ok(())
    }

    async fn image_size(handle: &LocalImageHandle) -> Result<u64> {
        if let Some(size) = handle.size {
            return Ok(size);
        }
        tokio::fs::metadata(&handle.path)
            .await
            .map(|m| m.len())
            .map_err(|e| DetectError::FileInfo {
                path: handle.path.clone(),
                cause: e.to_string(),
            })
    }

    async fn build_form(handle: &LocalImageHandle, metadata: &UploadMetadata) -> Result<Form> {
        let bytes = tokio::fs::read(&handle.path).await.map_err(|e| DetectError::FileInfo {
            path: handle.path.clone(),
            cause: e.to_string(),
        })?;

        let part = Part::bytes(bytes)
            .file_name(handle.file_name())
            .mime_str(handle.mime_type())
            .map_err(|e| DetectError::transport(TransportStage::Upload, &e))?;

        let mut form = Form::new().part(IMAGE_FIELD, part);
        for (name, value) in metadata.iter() {
            form = form.text(name.to_string(), value.to_string());
        }
        Ok(form)
    }
}

#[async_trait]
impl ImageUpload for HttpUploader {
    async fn upload(&self, handle: &LocalImageHandle, metadata: &UploadMetadata) -> Result<DetectionResult> {
        // 1. サイズ検査
        let size = Self::image_size(handle).await?;
        self.check_size(size)?;

        // 2. multipart 送信
        let form = Self::build_form(handle, metadata).await?;
        log::debug!("POST {} ({} bytes)", self.endpoint, size);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DetectError::transport(TransportStage::Upload, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DetectError::transport(TransportStage::Upload, &e))?;

        // 3. ボディ復号（失敗時は生ボディを渡さない）
        let body = decode_body(&text).map_err(|e| {
            log::debug!("undecodable body (HTTP {}): {} bytes", status, text.len());
            DetectError::parse(e)
        })?;

        // 4. HTTPステータス
        if !status.is_success() {
            return Err(DetectError::HttpStatus {
                status: status.as_u16(),
                detail: detail_message(&body),
                body: Some(body),
            });
        }

        // 5. 業務成功判定
        let envelope = parse_detect_response(body).map_err(DetectError::parse)?;
        envelope
            .into_data()
            .map_err(|error| DetectError::LogicalFailure { error })
    }
}

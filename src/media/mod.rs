//! メディア取得モジュール
//!
//! プラットフォームのピッカーは2種類の成功ペイロードを返す:
//! - 新API: `{tempFiles: [{tempFilePath, size}]}`
//! - 旧API: `{tempFilePaths: [...]}`
//!
//! どちらも `normalize` で1つの `LocalImageHandle` にそろえ、ワークフローには形の違いを見せない。

mod path_picker;

pub use path_picker::PathPicker;

use crate::error::{AcquisitionFailure, DetectError, Result};
use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 撮影元
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    Camera,
    Gallery,
}

impl CaptureSource {
    /// ピッカーに渡す sourceType 名
    pub fn source_type(&self) -> &'static str {
        match self {
            CaptureSource::Camera => "camera",
            CaptureSource::Gallery => "album",
        }
    }
}

/// 取得した画像への参照（1サイクル限り有効）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalImageHandle {
    pub path: PathBuf,
    /// ピッカーが報告したバイト数（ない場合はアップロード時に読む）
    pub size: Option<u64>,
}

impl LocalImageHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image.jpg".to_string())
    }

    pub fn mime_type(&self) -> &'static str {
        mime_type_for(&self.path)
    }
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "heic"];

pub(crate) fn is_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// ピッカーへの要求（常に1枚）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickRequest {
    pub source: CaptureSource,
    pub count: u32,
}

impl PickRequest {
    pub fn single(source: CaptureSource) -> Self {
        Self { source, count: 1 }
    }
}

/// 新API の1ファイル
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaFile {
    pub temp_file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// ピッカーの成功ペイロード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PickerResponse {
    #[serde(rename_all = "camelCase")]
    Media { temp_files: Vec<MediaFile> },
    #[serde(rename_all = "camelCase")]
    Image { temp_file_paths: Vec<String> },
}

impl PickerResponse {
    /// ブリッジから届いたJSONを読む。どちらの形でもなければ画像なし扱い
    pub fn from_json(value: serde_json::Value) -> std::result::Result<Self, AcquisitionFailure> {
        serde_json::from_value(value).map_err(|e| {
            log::warn!("picker payload not recognized: {}", e);
            AcquisitionFailure::NoImage
        })
    }
}

/// 2種類のペイロードを1つのハンドルにそろえる
pub fn normalize(response: PickerResponse) -> std::result::Result<LocalImageHandle, AcquisitionFailure> {
    let handle = match response {
        PickerResponse::Media { temp_files } => temp_files
            .into_iter()
            .next()
            .filter(|file| !file.temp_file_path.trim().is_empty())
            .map(|file| LocalImageHandle {
                path: PathBuf::from(file.temp_file_path),
                size: file.size,
            }),
        PickerResponse::Image { temp_file_paths } => temp_file_paths
            .into_iter()
            .next()
            .filter(|path| !path.trim().is_empty())
            .map(LocalImageHandle::new),
    };
    handle.ok_or(AcquisitionFailure::NoImage)
}

/// プラットフォームのピッカー
#[async_trait]
pub trait MediaPicker: Send + Sync {
    async fn pick(&self, request: PickRequest) -> std::result::Result<PickerResponse, AcquisitionFailure>;
}

/// 画像取得（ワークフローから見た境界）
#[async_trait]
pub trait ImageAcquire: Send + Sync {
    async fn acquire(&self, source: CaptureSource) -> Result<LocalImageHandle>;
}

pub struct MediaAcquirer<P> {
    picker: P,
}

impl<P: MediaPicker> MediaAcquirer<P> {
    pub fn new(picker: P) -> Self {
        Self { picker }
    }
}

#[async_trait]
impl<P: MediaPicker> ImageAcquire for MediaAcquirer<P> {
    async fn acquire(&self, source: CaptureSource) -> Result<LocalImageHandle> {
        let response = self
            .picker
            .pick(PickRequest::single(source))
            .await
            .map_err(|failure| {
                log::warn!("选择图片失败 ({}): {}", source.source_type(), failure);
                DetectError::Acquisition(failure)
            })?;

        let handle = normalize(response)?;
        log::debug!("acquired {} ({:?} bytes)", handle.path.display(), handle.size);
        Ok(handle)
    }
}

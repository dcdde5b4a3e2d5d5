use super::{is_image_extension, MediaFile, MediaPicker, PickRequest, PickerResponse};
use crate::error::AcquisitionFailure;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

/// 指定ファイルを1枚だけ返すピッカー（CLI用）
///
/// 新API形式で応答し、ファイルサイズも報告する
#[derive(Debug, Clone)]
pub struct PathPicker {
    path: PathBuf,
}

impl PathPicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MediaPicker for PathPicker {
    async fn pick(&self, request: PickRequest) -> Result<PickerResponse, AcquisitionFailure> {
        log::debug!(
            "pick {} image(s) from {} ({})",
            request.count,
            self.path.display(),
            request.source.source_type()
        );

        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            // 見つからない場合はピッカーが空で返したのと同じ扱い
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(PickerResponse::Media { temp_files: vec![] });
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return Err(AcquisitionFailure::PermissionDenied);
            }
            Err(e) => return Err(AcquisitionFailure::Platform(e.to_string())),
        };

        if !metadata.is_file() || !is_image_extension(&self.path) {
            return Err(AcquisitionFailure::Platform(format!(
                "不支持的图片文件: {}",
                self.path.display()
            )));
        }

        Ok(PickerResponse::Media {
            temp_files: vec![MediaFile {
                temp_file_path: self.path.to_string_lossy().to_string(),
                size: Some(metadata.len()),
            }],
        })
    }
}

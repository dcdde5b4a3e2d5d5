//! エラー分類モジュール
//!
//! すべての失敗をUIに表示できる `{code, message}` に正規化する唯一の窓口。
//!
//! 解決順:
//! 1. エラー自身が持つ明示メッセージ（サーバーの `detail`/`error`、サイズ上限文言など）
//! 2. コード表の定型文
//! 3. 「未知错误」

use crate::error::{AcquisitionFailure, DetectError};
use serde::Serialize;

const UNKNOWN_ERROR: &str = "未知错误";

/// クライアントローカルの番兵コード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalCode {
    Network,
    ImageTooLarge,
    ResponseParse,
    FileInfo,
    Acquisition,
    LogicalFailure,
}

impl LocalCode {
    pub fn as_i32(self) -> i32 {
        match self {
            LocalCode::Network => -1,
            LocalCode::ImageTooLarge => -2,
            LocalCode::ResponseParse => -3,
            LocalCode::FileInfo => -4,
            LocalCode::Acquisition => -5,
            LocalCode::LogicalFailure => -6,
        }
    }
}

/// 分類コード（HTTPステータスまたはローカル番兵）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Http(u16),
    Local(LocalCode),
    Unknown,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        match self {
            ErrorCode::Http(status) => i32::from(status),
            ErrorCode::Local(code) => code.as_i32(),
            ErrorCode::Unknown => 0,
        }
    }
}

/// UIに渡せる分類済みエラー
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedError {
    pub code: i32,
    pub message: String,
    /// 診断用の生エラー表現
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl std::fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// コード表の定型文
pub fn canned_message(code: ErrorCode) -> Option<&'static str> {
    let message = match code {
        ErrorCode::Http(400) => "请求参数错误",
        ErrorCode::Http(401) => "未授权访问",
        ErrorCode::Http(403) => "禁止访问",
        ErrorCode::Http(404) => "接口不存在",
        ErrorCode::Http(500) => "服务器错误",
        ErrorCode::Http(502) => "网关错误",
        ErrorCode::Http(503) => "服务暂时不可用",
        ErrorCode::Local(LocalCode::Network) => "网络连接失败，请检查网络",
        ErrorCode::Local(LocalCode::ImageTooLarge) => "图片大小超过限制",
        ErrorCode::Local(LocalCode::ResponseParse) => "数据解析失败",
        ErrorCode::Local(LocalCode::FileInfo) => "获取图片信息失败",
        ErrorCode::Local(LocalCode::Acquisition) => "选择图片失败",
        ErrorCode::Local(LocalCode::LogicalFailure) => "识别失败，请重试",
        _ => return None,
    };
    Some(message)
}

/// エラーのコードを求める
pub fn error_code(err: &DetectError) -> ErrorCode {
    match err {
        DetectError::Acquisition(_) => ErrorCode::Local(LocalCode::Acquisition),
        DetectError::FileInfo { .. } => ErrorCode::Local(LocalCode::FileInfo),
        DetectError::SizeLimit { .. } => ErrorCode::Local(LocalCode::ImageTooLarge),
        DetectError::Transport { .. } => ErrorCode::Local(LocalCode::Network),
        DetectError::HttpStatus { status, .. } => ErrorCode::Http(*status),
        DetectError::Parse(_) | DetectError::Json(_) => ErrorCode::Local(LocalCode::ResponseParse),
        DetectError::LogicalFailure { .. } => ErrorCode::Local(LocalCode::LogicalFailure),
        DetectError::Config(_) | DetectError::Prompt(_) | DetectError::Io(_) => ErrorCode::Unknown,
    }
}

/// エラーが明示的に持つメッセージ
fn explicit_message(err: &DetectError) -> Option<String> {
    let message = match err {
        DetectError::Acquisition(AcquisitionFailure::NoImage) => {
            Some(AcquisitionFailure::NoImage.to_string())
        }
        DetectError::SizeLimit { limit_mb, .. } => Some(format!("图片大小超过限制（{}MB）", limit_mb)),
        DetectError::HttpStatus { detail, .. } => detail.clone(),
        DetectError::LogicalFailure { error } => error.clone(),
        _ => None,
    };
    message.filter(|m| !m.trim().is_empty())
}

/// 生エラーを分類する
pub fn classify(err: &DetectError) -> ClassifiedError {
    log::error!("API Error: {:?}", err);

    let code = error_code(err);
    let message = explicit_message(err)
        .or_else(|| canned_message(code).map(str::to_string))
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string());

    ClassifiedError {
        code: code.as_i32(),
        message,
        cause: Some(err.to_string()),
    }
}

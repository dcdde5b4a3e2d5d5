use std::path::PathBuf;
use thiserror::Error;

/// 家具検出クライアントのエラー
///
/// 各コンポーネントの境界で生成され、UIに出す前に必ず `classifier::classify` を通す
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("选择图片失败: {0}")]
    Acquisition(AcquisitionFailure),

    #[error("获取图片信息失败: {}: {cause}", .path.display())]
    FileInfo { path: PathBuf, cause: String },

    #[error("图片大小超过限制（{limit_mb}MB）: {size_bytes} bytes")]
    SizeLimit { size_bytes: u64, limit_mb: u64 },

    #[error("{stage}{}: {cause}", timeout_suffix(.timed_out))]
    Transport {
        stage: TransportStage,
        cause: String,
        timed_out: bool,
    },

    #[error("HTTP {status}: {}", .detail.as_deref().unwrap_or("请求失败"))]
    HttpStatus {
        status: u16,
        detail: Option<String>,
        body: Option<serde_json::Value>,
    },

    #[error("响应数据解析失败: {0}")]
    Parse(String),

    #[error("识别失败: {}", .error.as_deref().unwrap_or("未返回检测数据"))]
    LogicalFailure { error: Option<String> },

    #[error("设置错误: {0}")]
    Config(String),

    #[error("交互输入错误: {0}")]
    Prompt(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON解析错误: {0}")]
    Json(#[from] serde_json::Error),
}

/// メディアピッカーの失敗理由
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionFailure {
    #[error("用户取消")]
    Cancelled,

    #[error("没有相机或相册权限")]
    PermissionDenied,

    #[error("设备不可用")]
    Unavailable,

    #[error("{0}")]
    Platform(String),

    /// ピッカーは成功したが使えるファイル参照がない
    #[error("未获取到图片")]
    NoImage,
}

/// トランスポート失敗が起きた段階
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStage {
    /// JSON API 呼び出し
    Request,
    /// 画像アップロード
    Upload,
}

impl std::fmt::Display for TransportStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportStage::Request => write!(f, "网络请求失败"),
            TransportStage::Upload => write!(f, "图片上传失败"),
        }
    }
}

impl DetectError {
    /// reqwest の送信エラーを段階付きで包む
    pub fn transport(stage: TransportStage, err: &reqwest::Error) -> Self {
        DetectError::Transport {
            stage,
            cause: err.to_string(),
            timed_out: err.is_timeout(),
        }
    }

    pub fn parse(err: impl std::fmt::Display) -> Self {
        DetectError::Parse(err.to_string())
    }
}

impl From<AcquisitionFailure> for DetectError {
    fn from(failure: AcquisitionFailure) -> Self {
        DetectError::Acquisition(failure)
    }
}

fn timeout_suffix(timed_out: &bool) -> &'static str {
    if *timed_out {
        "（请求超时）"
    } else {
        ""
    }
}

pub type Result<T> = std::result::Result<T, DetectError>;

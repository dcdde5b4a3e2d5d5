//! 家具材质检测クライアント
//!
//! 撮影 → サイズ検査 → アップロード → 結果解析を1つの「解析」ワークフローにまとめ、
//! あらゆる失敗を1つの分類済みエラーに正規化する。

pub mod api;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod share;
pub mod transport;
pub mod uploader;
pub mod workflow;

pub use classifier::{classify, ClassifiedError};
pub use error::{DetectError, Result};
pub use workflow::{AnalysisOutcome, AnalysisWorkflow, WorkflowState};

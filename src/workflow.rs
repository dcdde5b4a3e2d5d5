//! 解析ワークフロー（状態機械）
//!
//! `Idle → Acquiring → Uploading → {Resulted | Failed}`。
//! 取得中・アップロード中の開始要求は何もしない。自動再試行はしない。
//!
//! 状態は `watch` チャネルが保持し、すべての変更はロック下での全体置き換え。
//! リセットで置き換えられたサイクルの完了通知は捨てる。
//! リセット後も、旧サイクルの処理が戻るまでは新しいサイクルを始めない（同時に送信する画像は常に1枚）。

use crate::classifier::{classify, ClassifiedError};
use crate::error::DetectError;
use crate::media::{CaptureSource, ImageAcquire, LocalImageHandle};
use crate::uploader::{ImageUpload, UploadMetadata};
use furniture_detect_common::DetectionResult;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum WorkflowState {
    #[default]
    Idle,
    Acquiring,
    Uploading {
        image: LocalImageHandle,
    },
    Resulted {
        image: LocalImageHandle,
        result: DetectionResult,
    },
    Failed {
        image: Option<LocalImageHandle>,
        error: ClassifiedError,
    },
}

impl WorkflowState {
    pub fn is_analyzing(&self) -> bool {
        matches!(self, WorkflowState::Acquiring | WorkflowState::Uploading { .. })
    }

    pub fn has_result(&self) -> bool {
        matches!(self, WorkflowState::Resulted { .. })
    }

    pub fn image_path(&self) -> Option<&Path> {
        match self {
            WorkflowState::Uploading { image } | WorkflowState::Resulted { image, .. } => {
                Some(image.path.as_path())
            }
            WorkflowState::Failed { image, .. } => image.as_ref().map(|i| i.path.as_path()),
            WorkflowState::Idle | WorkflowState::Acquiring => None,
        }
    }

    pub fn detection_result(&self) -> Option<&DetectionResult> {
        match self {
            WorkflowState::Resulted { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ClassifiedError> {
        match self {
            WorkflowState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Acquiring => "acquiring",
            WorkflowState::Uploading { .. } => "uploading",
            WorkflowState::Resulted { .. } => "resulted",
            WorkflowState::Failed { .. } => "failed",
        }
    }
}

/// 開始要求の結果
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// 別の解析が進行中のため何もしなかった
    Busy,
    /// 途中でリセットされ、結果は捨てられた
    Superseded,
    Completed(Result<DetectionResult, ClassifiedError>),
}

pub struct AnalysisWorkflow<A, U> {
    acquirer: A,
    uploader: U,
    metadata: UploadMetadata,
    state: watch::Sender<WorkflowState>,
    cycle: AtomicU64,
    /// 取得・アップロードの処理中（リセットでは消えない）
    in_flight: AtomicBool,
}

/// サイクルの処理が戻ったら in_flight を下ろす
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<A: ImageAcquire, U: ImageUpload> AnalysisWorkflow<A, U> {
    pub fn new(acquirer: A, uploader: U, metadata: UploadMetadata) -> Self {
        let (state, _) = watch::channel(WorkflowState::Idle);
        Self {
            acquirer,
            uploader,
            metadata,
            state,
            cycle: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state.borrow().clone()
    }

    /// UI 側の購読
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state.subscribe()
    }

    pub fn is_analyzing(&self) -> bool {
        self.state.borrow().is_analyzing()
    }

    /// リセットで見捨てたものも含め、処理中のサイクルがあるか
    pub fn has_pending_cycle(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 撮影元から取得して解析する
    pub async fn start(&self, source: CaptureSource) -> AnalysisOutcome {
        let Some((cycle, _in_flight)) = self.begin(WorkflowState::Acquiring) else {
            log::debug!("start({:?}) ignored: analysis in progress", source);
            return AnalysisOutcome::Busy;
        };

        let image = match self.acquirer.acquire(source).await {
            Ok(image) => image,
            Err(err) => return self.fail(cycle, None, &err),
        };

        if !self.transition(cycle, WorkflowState::Uploading { image: image.clone() }) {
            return AnalysisOutcome::Superseded;
        }
        self.upload(cycle, image).await
    }

    /// 取得済みの画像を解析する
    pub async fn analyze_image(&self, image: LocalImageHandle) -> AnalysisOutcome {
        let Some((cycle, _in_flight)) = self.begin(WorkflowState::Uploading { image: image.clone() }) else {
            log::debug!("analyze_image({}) ignored: analysis in progress", image.path.display());
            return AnalysisOutcome::Busy;
        };
        self.upload(cycle, image).await
    }

    /// Idle に戻す。画像・結果・エラーを消す
    ///
    /// 処理中のサイクルは取り消さない。その完了は捨てられ、戻るまで次の開始は `Busy`
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            let stale = self.cycle.fetch_add(1, Ordering::SeqCst);
            if state.is_analyzing() {
                log::debug!("reset abandons in-flight cycle {}", stale);
            }
            *state = WorkflowState::Idle;
        });
    }

    async fn upload(&self, cycle: u64, image: LocalImageHandle) -> AnalysisOutcome {
        match self.uploader.upload(&image, &self.metadata).await {
            Ok(result) => {
                let resulted = WorkflowState::Resulted {
                    image,
                    result: result.clone(),
                };
                if self.transition(cycle, resulted) {
                    AnalysisOutcome::Completed(Ok(result))
                } else {
                    AnalysisOutcome::Superseded
                }
            }
            Err(err) => self.fail(cycle, Some(image), &err),
        }
    }

    fn fail(&self, cycle: u64, image: Option<LocalImageHandle>, err: &DetectError) -> AnalysisOutcome {
        let error = classify(err);
        let failed = WorkflowState::Failed {
            image,
            error: error.clone(),
        };
        if self.transition(cycle, failed) {
            AnalysisOutcome::Completed(Err(error))
        } else {
            AnalysisOutcome::Superseded
        }
    }

    /// 進行中でなければ新しいサイクルを始める
    fn begin(&self, next: WorkflowState) -> Option<(u64, InFlight<'_>)> {
        let mut started = None;
        self.state.send_if_modified(|state| {
            if state.is_analyzing() || self.in_flight.load(Ordering::SeqCst) {
                return false;
            }
            self.in_flight.store(true, Ordering::SeqCst);
            let cycle = self.cycle.fetch_add(1, Ordering::SeqCst) + 1;
            log::debug!("cycle {}: {} -> {}", cycle, state.label(), next.label());
            *state = next;
            started = Some(cycle);
            true
        });
        started.map(|cycle| (cycle, InFlight(&self.in_flight)))
    }

    /// 現在のサイクルであれば状態を置き換える
    fn transition(&self, cycle: u64, next: WorkflowState) -> bool {
        self.state.send_if_modified(|state| {
            if self.cycle.load(Ordering::SeqCst) != cycle {
                log::debug!("cycle {} superseded, dropping {}", cycle, next.label());
                return false;
            }
            log::debug!("cycle {}: {} -> {}", cycle, state.label(), next.label());
            *state = next;
            true
        })
    }
}

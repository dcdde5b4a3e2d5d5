//! 分享卡片生成
//!
//! 解析ワークフローと同じ形（idle / generating / done）の小さな状態機械。
//! 生成中の再要求は何もしない。カードURLの有効期限はサービス側の責任で、ここでは追跡しない。

use crate::classifier::{classify, ClassifiedError};
use crate::error::Result;
use async_trait::async_trait;
use furniture_detect_common::{CardTemplate, DetectionResult, ShareCardRequest};
use tokio::sync::watch;

/// 分享卡片エンドポイント
#[async_trait]
pub trait ShareCardApi: Send + Sync {
    async fn generate_share_card(&self, request: &ShareCardRequest) -> Result<String>;
}

/// カードの元になる報告
#[derive(Debug, Clone, PartialEq)]
pub enum ReportSource {
    /// 既知の報告ID
    ReportId(String),
    /// 手元の検出結果
    Report(DetectionResult),
}

impl ReportSource {
    /// テンプレートを添えてリクエストを組み立てる
    pub fn to_request(&self, template: CardTemplate) -> ShareCardRequest {
        match self {
            ReportSource::ReportId(report_id) => ShareCardRequest {
                report_id: Some(report_id.clone()),
                template,
                ..Default::default()
            },
            ReportSource::Report(result) => ShareCardRequest {
                report_id: result.report_id.clone(),
                template,
                furniture_type: Some(result.furniture_type.clone()),
                materials: Some(result.materials.clone()),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ShareCardState {
    #[default]
    Idle,
    Generating,
    Ready {
        card_url: String,
    },
    Failed(ClassifiedError),
}

impl ShareCardState {
    pub fn is_generating(&self) -> bool {
        matches!(self, ShareCardState::Generating)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    /// 生成中のため何もしなかった
    Busy,
    Completed(std::result::Result<String, ClassifiedError>),
}

pub struct ShareCardGenerator<S> {
    api: S,
    source: ReportSource,
    state: watch::Sender<ShareCardState>,
}

impl<S: ShareCardApi> ShareCardGenerator<S> {
    pub fn new(api: S, source: ReportSource) -> Self {
        let (state, _) = watch::channel(ShareCardState::Idle);
        Self { api, source, state }
    }

    pub fn state(&self) -> ShareCardState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ShareCardState> {
        self.state.subscribe()
    }

    /// 直近に生成したカードURL
    pub fn card_url(&self) -> Option<String> {
        match &*self.state.borrow() {
            ShareCardState::Ready { card_url } => Some(card_url.clone()),
            _ => None,
        }
    }

    /// カードを生成する（Ready / Failed からの再生成も可）
    pub async fn generate(&self, template: CardTemplate) -> GenerateOutcome {
        let started = self.state.send_if_modified(|state| {
            if state.is_generating() {
                return false;
            }
            *state = ShareCardState::Generating;
            true
        });
        if !started {
            log::debug!("generate({}) ignored: already generating", template);
            return GenerateOutcome::Busy;
        }

        let request = self.source.to_request(template);
        let outcome = match self.api.generate_share_card(&request).await {
            Ok(card_url) => {
                log::debug!("share card generated: {}", card_url);
                self.state.send_replace(ShareCardState::Ready {
                    card_url: card_url.clone(),
                });
                Ok(card_url)
            }
            Err(err) => {
                let error = classify(&err);
                self.state.send_replace(ShareCardState::Failed(error.clone()));
                Err(error)
            }
        };
        GenerateOutcome::Completed(outcome)
    }
}

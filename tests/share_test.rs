//! 分享卡片生成テスト

use async_trait::async_trait;
use furniture_detect::api::ApiClient;
use furniture_detect::error::Result;
use furniture_detect::share::{GenerateOutcome, ReportSource, ShareCardApi, ShareCardGenerator, ShareCardState};
use furniture_detect::transport::Transport;
use furniture_detect::DetectError;
use furniture_detect_common::{CardTemplate, ShareCardRequest};
use mockito::Server;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// 受け取ったリクエストを記録するフェイク
#[derive(Default)]
struct FakeShareApi {
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<ShareCardRequest>>>,
    gate: Option<Arc<Notify>>,
    fail_status: Option<u16>,
}

#[async_trait]
impl ShareCardApi for FakeShareApi {
    async fn generate_share_card(&self, request: &ShareCardRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match self.fail_status {
            Some(status) => Err(DetectError::HttpStatus {
                status,
                detail: None,
                body: None,
            }),
            None => Ok(format!("https://cdn.example.com/{}.png", request.template)),
        }
    }
}

#[tokio::test]
async fn test_generate_ready() {
    let api = FakeShareApi::default();
    let requests = api.requests.clone();
    let generator = ShareCardGenerator::new(api, ReportSource::ReportId("r-1".into()));
    assert_eq!(generator.state(), ShareCardState::Idle);

    let outcome = generator.generate(CardTemplate::Classic).await;

    assert_eq!(
        outcome,
        GenerateOutcome::Completed(Ok("https://cdn.example.com/classic.png".into()))
    );
    assert_eq!(generator.card_url().as_deref(), Some("https://cdn.example.com/classic.png"));

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].report_id.as_deref(), Some("r-1"));
    assert_eq!(requests[0].template, CardTemplate::Classic);
}

#[tokio::test]
async fn test_generate_while_generating_is_noop() {
    let gate = Arc::new(Notify::new());
    let api = FakeShareApi {
        gate: Some(gate.clone()),
        ..Default::default()
    };
    let calls = api.calls.clone();
    let generator = ShareCardGenerator::new(api, ReportSource::ReportId("r-1".into()));

    let (first, second) = tokio::join!(generator.generate(CardTemplate::Modern), async {
        let mut states = generator.subscribe();
        states.wait_for(ShareCardState::is_generating).await.unwrap();
        let second = generator.generate(CardTemplate::Minimal).await;
        gate.notify_one();
        second
    });

    assert_eq!(second, GenerateOutcome::Busy);
    assert!(matches!(first, GenerateOutcome::Completed(Ok(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_generate_failure_is_classified() {
    let api = FakeShareApi {
        fail_status: Some(503),
        ..Default::default()
    };
    let generator = ShareCardGenerator::new(api, ReportSource::ReportId("r-1".into()));

    let outcome = generator.generate(CardTemplate::Modern).await;

    let GenerateOutcome::Completed(Err(error)) = outcome else {
        panic!("unexpected outcome: {:?}", outcome);
    };
    assert_eq!(error.code, 503);
    assert_eq!(error.message, "服务暂时不可用");
    assert_eq!(generator.state(), ShareCardState::Failed(error));
    assert!(generator.card_url().is_none());
}

#[tokio::test]
async fn test_regenerate_after_ready() {
    let api = FakeShareApi::default();
    let calls = api.calls.clone();
    let generator = ShareCardGenerator::new(api, ReportSource::ReportId("r-1".into()));

    generator.generate(CardTemplate::Modern).await;
    generator.generate(CardTemplate::Minimal).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(generator.card_url().as_deref(), Some("https://cdn.example.com/minimal.png"));
}

#[tokio::test]
async fn test_generate_over_http() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/share/generate")
        .with_status(200)
        .with_body(r#"{"card_url": "https://cdn.example.com/r-7.png"}"#)
        .expect(1)
        .create_async()
        .await;

    let transport = Transport::new(Duration::from_secs(5)).unwrap();
    let client = ApiClient::new(transport, format!("{}/api/v1", server.url()));
    let generator = ShareCardGenerator::new(client, ReportSource::ReportId("r-7".into()));

    let outcome = generator.generate(CardTemplate::Modern).await;

    assert_eq!(outcome, GenerateOutcome::Completed(Ok("https://cdn.example.com/r-7.png".into())));
    assert!(matches!(generator.state(), ShareCardState::Ready { .. }));
    mock.assert_async().await;
}

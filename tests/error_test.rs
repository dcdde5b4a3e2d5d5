//! エラーケーステスト
//!
//! 各種エラー条件の表示と分類を検証

use furniture_detect::classifier::{canned_message, error_code, ErrorCode, LocalCode};
use furniture_detect::error::{AcquisitionFailure, TransportStage};
use furniture_detect::{classify, DetectError};

/// DetectErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        DetectError::Acquisition(AcquisitionFailure::Cancelled),
        DetectError::FileInfo {
            path: "img1".into(),
            cause: "not found".into(),
        },
        DetectError::SizeLimit {
            size_bytes: 12 * 1024 * 1024,
            limit_mb: 10,
        },
        DetectError::Transport {
            stage: TransportStage::Upload,
            cause: "timeout".into(),
            timed_out: true,
        },
        DetectError::HttpStatus {
            status: 500,
            detail: None,
            body: None,
        },
        DetectError::Parse("expected value".into()),
        DetectError::LogicalFailure { error: None },
        DetectError::Config("テスト設定エラー".into()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "Error display should not be empty");
    }
}

#[test]
fn test_error_display_fallbacks() {
    let http = DetectError::HttpStatus {
        status: 502,
        detail: None,
        body: None,
    };
    assert_eq!(http.to_string(), "HTTP 502: 请求失败");

    let upload = DetectError::Transport {
        stage: TransportStage::Upload,
        cause: "connection reset".into(),
        timed_out: false,
    };
    assert_eq!(upload.to_string(), "图片上传失败: connection reset");

    let request = DetectError::Transport {
        stage: TransportStage::Request,
        cause: "dns error".into(),
        timed_out: false,
    };
    assert!(request.to_string().starts_with("网络请求失败"));

    let timed_out = DetectError::Transport {
        stage: TransportStage::Request,
        cause: "operation timed out".into(),
        timed_out: true,
    };
    assert_eq!(timed_out.to_string(), "网络请求失败（请求超时）: operation timed out");
    assert_eq!(classify(&timed_out).code, -1);
}

/// IOエラーからの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: DetectError = io_err.into();
    assert!(matches!(err, DetectError::Io(_)));
}

/// JSONエラーからの変換は解析失敗として分類される
#[test]
fn test_json_error_is_parse_failure() {
    let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
    let err: DetectError = json_err.into();
    assert!(matches!(err, DetectError::Json(_)));

    let classified = classify(&err);
    assert_eq!(classified.code, -3);
    assert_eq!(classified.message, "数据解析失败");
}

#[test]
fn test_acquisition_failure_conversion() {
    let err: DetectError = AcquisitionFailure::PermissionDenied.into();
    assert_eq!(error_code(&err), ErrorCode::Local(LocalCode::Acquisition));
    assert_eq!(classify(&err).message, "选择图片失败");
}

/// 分類は常にコードとメッセージを返す
#[test]
fn test_classify_is_total() {
    let errors = vec![
        DetectError::Acquisition(AcquisitionFailure::Unavailable),
        DetectError::Acquisition(AcquisitionFailure::Platform("camera busy".into())),
        DetectError::HttpStatus {
            status: 418,
            detail: None,
            body: None,
        },
        DetectError::Prompt("not a terminal".into()),
        DetectError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk")),
    ];

    for err in errors {
        let classified = classify(&err);
        assert!(!classified.message.is_empty());
        assert!(classified.cause.is_some());
    }
}

#[test]
fn test_canned_table() {
    assert_eq!(canned_message(ErrorCode::Http(404)), Some("接口不存在"));
    assert_eq!(canned_message(ErrorCode::Local(LocalCode::Network)), Some("网络连接失败，请检查网络"));
    assert_eq!(canned_message(ErrorCode::Local(LocalCode::ImageTooLarge)), Some("图片大小超过限制"));
    assert_eq!(canned_message(ErrorCode::Http(418)), None);
    assert_eq!(canned_message(ErrorCode::Unknown), None);
}

#[test]
fn test_classified_error_serializes_code_and_message() {
    let classified = classify(&DetectError::HttpStatus {
        status: 500,
        detail: Some("server error".into()),
        body: None,
    });
    let json = serde_json::to_value(&classified).unwrap();
    assert_eq!(json["code"], 500);
    assert_eq!(json["message"], "server error");
    assert_eq!(classified.to_string(), "server error");
}

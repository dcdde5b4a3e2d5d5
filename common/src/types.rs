//! 检测结果・分享卡片の型定義
//!
//! 推論サービスのワイヤ形式（snake_case）に合わせる:
//! - DetectionResult: `/furniture/detect` の `data`
//! - ShareCardRequest: `/share/generate` のリクエスト
//! - HealthStatus: `/health` のレスポンス

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 家具检测结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionResult {
    pub furniture_type: String,          // 家具类型

    pub materials: Vec<MaterialFinding>, // サービスの返却順を保持

    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_assessment: Option<RiskAssessment>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
}

/// 材料识别结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialFinding {
    pub material_type: String,

    /// 子类型（"橡木"、"密度板" など）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,

    /// 置信度 (0-100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// 风险评估
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskAssessment {
    pub risk_level: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,

    pub sensitive_groups: Vec<String>,
    pub harmful_substances: Vec<String>,
    pub health_impacts: Vec<String>,
    pub recommendations: Vec<String>,
}

/// `/furniture/detect` のレスポンス封筒
///
/// `success` が欠けていても `data` があれば成功とみなす
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DetectResponse {
    pub success: Option<bool>,
    pub data: Option<DetectionResult>,
    pub error: Option<String>,
}

impl DetectResponse {
    /// 業務上の成功データを取り出す（`success: false` または `data` なしは None）
    pub fn into_data(self) -> std::result::Result<DetectionResult, Option<String>> {
        match (self.success, self.data) {
            (Some(false), _) | (_, None) => Err(self.error),
            (_, Some(data)) => Ok(data),
        }
    }
}

/// 分享卡片テンプレート
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardTemplate {
    #[default]
    Modern,
    Classic,
    Minimal,
}

impl std::str::FromStr for CardTemplate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "modern" => Ok(CardTemplate::Modern),
            "classic" => Ok(CardTemplate::Classic),
            "minimal" => Ok(CardTemplate::Minimal),
            _ => Err(format!("Unknown template: {}. Use modern, classic, or minimal", s)),
        }
    }
}

impl std::fmt::Display for CardTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardTemplate::Modern => write!(f, "modern"),
            CardTemplate::Classic => write!(f, "classic"),
            CardTemplate::Minimal => write!(f, "minimal"),
        }
    }
}

/// `/share/generate` リクエスト
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShareCardRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,

    pub template: CardTemplate,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub furniture_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub materials: Option<Vec<MaterialFinding>>,
}

/// `/share/generate` レスポンス
///
/// クライアント向けの `{card_url}` とサービス封筒 `{success, data: {card_image_url}, error}` の両方を受け付ける
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShareCardResponse {
    pub success: Option<bool>,
    pub card_url: Option<String>,
    pub data: Option<ShareCardData>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShareCardData {
    pub card_image_url: Option<String>,
}

impl ShareCardResponse {
    /// 封筒が `success: false` を明示している
    pub fn is_failure(&self) -> bool {
        self.success == Some(false)
    }

    pub fn card_url(&self) -> Option<&str> {
        self.card_url
            .as_deref()
            .or_else(|| self.data.as_ref().and_then(|d| d.card_image_url.as_deref()))
            .filter(|url| !url.is_empty())
    }
}

/// `/health` レスポンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    pub status: String,
    pub services: BTreeMap<String, String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy" || self.status == "ok"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_result_deserialize() {
        let json = r#"{
            "furniture_type": "chair",
            "materials": [{"material_type": "wood", "confidence": 92}],
            "risk_assessment": {
                "risk_level": "低风险",
                "sensitive_groups": ["儿童"],
                "health_impacts": [],
                "recommendations": ["保持通风"]
            },
            "report_id": "r-001"
        }"#;

        let result: DetectionResult = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(result.furniture_type, "chair");
        assert_eq!(result.materials.len(), 1);
        assert_eq!(result.materials[0].material_type, "wood");
        assert_eq!(result.materials[0].confidence, Some(92.0));
        let risk = result.risk_assessment.expect("risk_assessment missing");
        assert_eq!(risk.risk_level, "低风险");
        assert_eq!(risk.sensitive_groups, vec!["儿童".to_string()]);
        assert!(risk.harmful_substances.is_empty());
        assert_eq!(result.report_id.as_deref(), Some("r-001"));
    }

    #[test]
    fn test_detection_result_minimal() {
        let result: DetectionResult = serde_json::from_str(r#"{"furniture_type": "sofa"}"#).unwrap();
        assert_eq!(result.furniture_type, "sofa");
        assert!(result.materials.is_empty());
        assert!(result.risk_assessment.is_none());
        assert!(result.report_id.is_none());
    }

    #[test]
    fn test_detect_response_success_without_flag() {
        let response: DetectResponse =
            serde_json::from_str(r#"{"data": {"furniture_type": "desk"}}"#).unwrap();
        let data = response.into_data().expect("data があれば成功");
        assert_eq!(data.furniture_type, "desk");
    }

    #[test]
    fn test_detect_response_success_false_with_data() {
        let response: DetectResponse = serde_json::from_str(
            r#"{"success": false, "data": {"furniture_type": "desk"}, "error": "图片模糊"}"#,
        )
        .unwrap();
        assert_eq!(response.into_data().unwrap_err().as_deref(), Some("图片模糊"));
    }

    #[test]
    fn test_detect_response_missing_data() {
        let response: DetectResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(response.into_data().unwrap_err(), None);
    }

    #[test]
    fn test_card_template_from_str() {
        assert_eq!("modern".parse::<CardTemplate>().unwrap(), CardTemplate::Modern);
        assert_eq!("Classic".parse::<CardTemplate>().unwrap(), CardTemplate::Classic);
        assert_eq!("MINIMAL".parse::<CardTemplate>().unwrap(), CardTemplate::Minimal);
        assert!("retro".parse::<CardTemplate>().is_err());
    }

    #[test]
    fn test_share_card_request_skips_missing_fields() {
        let request = ShareCardRequest {
            report_id: Some("r-1".to_string()),
            template: CardTemplate::Classic,
            ..Default::default()
        };
        let json = serde_json::to_string(&request).expect("シリアライズ失敗");
        assert_eq!(json, r#"{"report_id":"r-1","template":"classic"}"#);
    }

    #[test]
    fn test_share_card_response_fallback() {
        let direct: ShareCardResponse =
            serde_json::from_str(r#"{"card_url": "https://cdn/x.jpg"}"#).unwrap();
        assert_eq!(direct.card_url(), Some("https://cdn/x.jpg"));

        let envelope: ShareCardResponse = serde_json::from_str(
            r#"{"success": true, "data": {"card_image_url": "https://cdn/y.jpg"}}"#,
        )
        .unwrap();
        assert_eq!(envelope.card_url(), Some("https://cdn/y.jpg"));

        let empty: ShareCardResponse = serde_json::from_str(r#"{"card_url": ""}"#).unwrap();
        assert_eq!(empty.card_url(), None);
        assert!(!empty.is_failure());
    }

    #[test]
    fn test_share_card_response_failure() {
        let failed: ShareCardResponse = serde_json::from_str(
            r#"{"success": false, "data": null, "error": "报告不存在"}"#,
        )
        .unwrap();
        assert!(failed.is_failure());
        assert_eq!(failed.error.as_deref(), Some("报告不存在"));
        assert_eq!(failed.card_url(), None);
    }

    #[test]
    fn test_health_status() {
        let health: HealthStatus = serde_json::from_str(
            r#"{"status": "healthy", "services": {"api": "ok", "oss": "unknown"}}"#,
        )
        .unwrap();
        assert!(health.is_healthy());
        assert_eq!(health.services.get("oss").map(String::as_str), Some("unknown"));
    }
}

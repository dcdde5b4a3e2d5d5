//! Furniture Detect Common Library
//!
//! 家具检测クライアントの各ホスト（CLI・モバイルブリッジ）で共有される型とパーサー

pub mod error;
pub mod parser;
pub mod types;

pub use error::{Error, Result};
pub use parser::{decode_body, decode_value, detail_message, parse_detect_response};
pub use types::{
    CardTemplate, DetectResponse, DetectionResult, HealthStatus, MaterialFinding,
    RiskAssessment, ShareCardRequest, ShareCardResponse,
};

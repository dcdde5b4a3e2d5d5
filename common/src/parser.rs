//! レスポンスボディパーサー
//!
//! 推論サービスのボディはJSONオブジェクトとして届く場合と、
//! JSONを含む文字列として届く場合がある。どちらも同じ値に復号する。

use crate::error::{Error, Result};
use crate::types::DetectResponse;
use serde_json::Value;

/// ボディ文字列を復号
///
/// 復号結果が文字列なら、その中身をもう一度JSONとして復号する
///
/// # Examples
/// ```
/// use furniture_detect_common::decode_body;
///
/// let object = decode_body(r#"{"success": true}"#).unwrap();
/// let encoded = decode_body(r#""{\"success\": true}""#).unwrap();
/// assert_eq!(object, encoded);
/// ```
pub fn decode_body(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::Parse("响应体为空".into()));
    }
    let value: Value = serde_json::from_str(trimmed)?;
    decode_value(value)
}

/// 復号済みの値に同じ規則を適用
pub fn decode_value(value: Value) -> Result<Value> {
    match value {
        Value::String(inner) => {
            let inner = inner.trim();
            if inner.is_empty() {
                return Err(Error::Parse("响应体为空".into()));
            }
            Ok(serde_json::from_str(inner)?)
        }
        other => Ok(other),
    }
}

/// `detail` フィールドを取り出す（FastAPIのエラーボディ）
///
/// 文字列はそのまま、配列などはJSON表現で返す
pub fn detail_message(body: &Value) -> Option<String> {
    let detail = body.get("detail")?;
    if let Some(s) = detail.as_str() {
        return Some(s.to_string());
    }
    if detail.is_null() {
        return None;
    }
    Some(detail.to_string())
}

/// 検出レスポンス封筒をパース
pub fn parse_detect_response(body: Value) -> Result<DetectResponse> {
    if !body.is_object() {
        return Err(Error::Parse(format!("JSONオブジェクトではありません: {}", body)));
    }
    Ok(serde_json::from_value(body)?)
}

//! Outcome model: the per-item result sent back to the client.
//!
//! Wire shape:
//! - success: `{"success": true, "data": <handler result>}`
//! - failure: `{"success": false, "message": <error value>}`

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::ItemError;

/// One ResultItem per RequestItem, at the same index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireResult", try_from = "WireResult")]
pub enum ResultItem {
    Success(Value),
    Failure(Value),
}

impl ResultItem {
    /// 成功結果 `{success: true, data}`
    pub fn success(data: impl Into<Value>) -> Self {
        ResultItem::Success(data.into())
    }

    /// 失敗結果 `{success: false, message}`
    pub fn failure(message: impl Into<Value>) -> Self {
        ResultItem::Failure(message.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResultItem::Success(_))
    }

    /// 成功時の `data`
    pub fn data(&self) -> Option<&Value> {
        match self {
            ResultItem::Success(data) => Some(data),
            ResultItem::Failure(_) => None,
        }
    }

    /// 失敗時の `message`
    pub fn message(&self) -> Option<&Value> {
        match self {
            ResultItem::Success(_) => None,
            ResultItem::Failure(message) => Some(message),
        }
    }
}

impl From<Result<Value, ItemError>> for ResultItem {
    fn from(result: Result<Value, ItemError>) -> Self {
        match result {
            Ok(data) => ResultItem::Success(data),
            Err(err) => ResultItem::Failure(err.into_message()),
        }
    }
}

/// Flat representation used for (de)serialization; the boolean tag cannot be
/// expressed with serde's enum tagging.
#[derive(Serialize, Deserialize)]
struct WireResult {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<Value>,
}

impl From<ResultItem> for WireResult {
    fn from(item: ResultItem) -> Self {
        match item {
            ResultItem::Success(data) => WireResult {
                success: true,
                data: Some(data),
                message: None,
            },
            ResultItem::Failure(message) => WireResult {
                success: false,
                data: None,
                message: Some(message),
            },
        }
    }
}

impl TryFrom<WireResult> for ResultItem {
    type Error = String;

    fn try_from(wire: WireResult) -> Result<Self, Self::Error> {
        if wire.success {
            // `data: null` arrives as None
            Ok(ResultItem::Success(wire.data.unwrap_or(Value::Null)))
        } else {
            wire.message
                .map(ResultItem::Failure)
                .ok_or_else(|| "failed result item without message".to_string())
        }
    }
}

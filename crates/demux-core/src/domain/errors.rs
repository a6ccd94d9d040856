//! Errors - エラー型と分類
//!
//! - `ActionError`: handler が返す失敗値（そのままレスポンスに載る）
//! - `ItemError`: 1 件分の失敗。ResultItem に変換され、他の item には影響しない
//! - `BatchError`: バッチ全体の失敗。HTTP 400 になる

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::state::RejectStage;

/// Failure value produced by a handler.
///
/// The wrapped value is sent to the client verbatim: a string error stays a
/// string, a structured error stays structured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionError(Value);

impl ActionError {
    /// 文字列メッセージのエラー
    pub fn new(message: impl Into<String>) -> Self {
        Self(Value::String(message.into()))
    }

    /// 任意の JSON 値をそのまま message として返すエラー
    pub fn structured(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// ResultItem の `message` になる値
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(message) => f.write_str(message),
            other => write!(f, "{other}"),
        }
    }
}

impl std::error::Error for ActionError {}

impl From<&str> for ActionError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ActionError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<Value> for ActionError {
    fn from(value: Value) -> Self {
        Self::structured(value)
    }
}

/// Failure of a single request item.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ItemError {
    #[error("Bad Request")]
    BadRequest,

    #[error("Action \"{0}\" cannot be found")]
    NotFound(String),

    #[error("{0}")]
    Handler(ActionError),

    #[error("Action \"{action}\" timed out after {after_ms}ms")]
    TimedOut { action: String, after_ms: u64 },

    #[error("{0}")]
    Panicked(String),
}

impl ItemError {
    /// The `message` field of the failed ResultItem.
    pub fn into_message(self) -> Value {
        match self {
            ItemError::Handler(err) => err.into_value(),
            other => Value::String(other.to_string()),
        }
    }

    /// 失敗した段階
    pub fn stage(&self) -> RejectStage {
        match self {
            ItemError::BadRequest => RejectStage::Shape,
            ItemError::NotFound(_) => RejectStage::Lookup,
            ItemError::Handler(_) | ItemError::TimedOut { .. } | ItemError::Panicked(_) => {
                RejectStage::Handler
            }
        }
    }
}

/// Failure of the whole call, raised before any item runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("Bad request: JSON was expected.")]
    NotAnArray,

    #[error("Bad request: invalid JSON ({0})")]
    InvalidJson(String),

    #[error("Bad request: could not read body ({0})")]
    Body(String),

    #[error("Bad request: missing query parameter '{0}'")]
    MissingQuery(&'static str),
}

impl From<serde_json::Error> for BatchError {
    fn from(err: serde_json::Error) -> Self {
        BatchError::InvalidJson(err.to_string())
    }
}

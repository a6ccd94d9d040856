//! DemuxConfig - endpoint と dispatcher の設定
//!
//! serde でデシリアライズでき、省略したフィールドはデフォルト値になる。

use std::fmt;
use std::time::Duration;

use axum::http::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DEFAULT_SEPARATOR;

/// HTTP method the endpoint answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Batch is read from the `batch` query parameter.
    Get,
    /// Batch is read from the JSON body.
    #[default]
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }

    /// axum の `Method` に変換
    pub fn as_http(self) -> Method {
        match self {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("separator cannot be empty")]
    EmptySeparator,

    #[error("path must start with '/', got '{0}'")]
    InvalidPath(String),

    #[error("body_limit cannot be 0")]
    ZeroBodyLimit,

    #[error("handler_timeout_ms cannot be 0 (omit it to disable the timeout)")]
    ZeroTimeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemuxConfig {
    /// Splits action paths into segments.
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Request path the endpoint is mounted on.
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub method: HttpMethod,
    /// Logs every item outcome at `info` instead of `debug`.
    #[serde(default)]
    pub debug: bool,
    /// Per-item deadline. `None` lets a handler run as long as it wants.
    #[serde(default)]
    pub handler_timeout_ms: Option<u64>,
    /// Maximum accepted body size in bytes (POST only).
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}
fn default_path() -> String {
    "/api".to_string()
}
fn default_body_limit() -> usize {
    2 * 1024 * 1024 // 2 MiB
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            path: default_path(),
            method: HttpMethod::default(),
            debug: false,
            handler_timeout_ms: None,
            body_limit: default_body_limit(),
        }
    }
}

impl DemuxConfig {
    /// 設定値の妥当性をチェック
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.separator.is_empty() {
            return Err(ConfigError::EmptySeparator);
        }
        if !self.path.starts_with('/') {
            return Err(ConfigError::InvalidPath(self.path.clone()));
        }
        if self.body_limit == 0 {
            return Err(ConfigError::ZeroBodyLimit);
        }
        if self.handler_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// per-item timeout（未設定なら無制限）
    pub fn handler_timeout(&self) -> Option<Duration> {
        self.handler_timeout_ms.map(Duration::from_millis)
    }
}

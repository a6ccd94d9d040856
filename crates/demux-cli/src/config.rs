//! Server configuration: loading and validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use demux_core::DemuxConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub demux: DemuxConfig,
}

impl ServerConfig {
    /// TOML ファイルから設定を読み込み、検証する
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{}'", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid config file '{}'", path.display()))
    }

    /// TOML 文字列をパースして検証する
    pub fn parse(contents: &str) -> Result<Self> {
        let config: ServerConfig =
            toml::from_str(contents).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.server.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        self.demux.validate()?;
        Ok(())
    }

    /// `host:port` 形式の listen アドレス
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demux_core::HttpMethod;

    #[test]
    fn empty_file_uses_defaults() {
        let config = ServerConfig::parse("").unwrap();
        assert_eq!(config.listen_addr(), "127.0.0.1:8080");
        assert_eq!(config.demux.path, "/api");
    }

    #[test]
    fn parses_both_sections() {
        let config = ServerConfig::parse(
            r#"
            [server]
            port = 9000
            log_level = "debug"

            [demux]
            path = "/rpc"
            method = "GET"
            separator = "/"
            handler_timeout_ms = 1500
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.demux.method, HttpMethod::Get);
        assert_eq!(config.demux.separator, "/");
        assert_eq!(config.demux.handler_timeout_ms, Some(1500));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(ServerConfig::parse("[server]\nport = 0").is_err());
        assert!(ServerConfig::parse("[demux]\npath = \"api\"").is_err());
        assert!(ServerConfig::parse("[demux]\nmethod = \"DELETE\"").is_err());
    }
}

//! DemuxBuilder - Demux の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - `expect_actions()` で必須の action path を宣言
//! - `build()` 時に「期待集合 ⊆ 登録済み集合」と設定の妥当性をチェック
//! - 不足や不正があれば `BuildError` を返す

use thiserror::Error;

use super::config::{ConfigError, DemuxConfig};
use super::demux::Demux;
use crate::registry::{ActionRegistry, RegistryError};
use crate::typed::{Action, DynHandler, Handler};

/// DemuxBuilder assembles a `Demux`.
///
/// # 使用例
/// ```ignore
/// let demux = DemuxBuilder::new()
///     .config(config)
///     .register("System.ping", sync_fn(|_| Ok::<_, ActionError>("pong")))?
///     .register_action::<Add, _>(AddHandler)?
///     .expect_actions(&["System.ping", "Math.add"])
///     .build()?;
/// ```
pub struct DemuxBuilder {
    config: DemuxConfig,
    registry: ActionRegistry,
    expected_actions: Option<Vec<String>>,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Missing actions: {0:?}. These actions were expected but not registered.")]
    MissingActions(Vec<String>),
}

impl DemuxBuilder {
    /// 新しい DemuxBuilder を作成
    pub fn new() -> Self {
        Self {
            config: DemuxConfig::default(),
            registry: ActionRegistry::new(),
            expected_actions: None,
        }
    }

    /// Use `config`. Its separator applies to registrations made afterwards.
    pub fn config(mut self, config: DemuxConfig) -> Result<Self, BuildError> {
        config.validate()?;
        self.registry
            .set_separator(&config.separator)
            .map_err(RegistryError::from)?;
        self.config = config;
        Ok(self)
    }

    /// Pre-populated actions, merged at their own paths.
    pub fn actions(mut self, actions: &ActionRegistry) -> Self {
        self.registry.merge(actions);
        self
    }

    /// Pre-populated actions, grafted under `prefix`.
    pub fn mount(mut self, prefix: &str, actions: &ActionRegistry) -> Result<Self, BuildError> {
        self.registry.mount(prefix, actions)?;
        Ok(self)
    }

    /// 設定済み separator で `path` に handler を登録
    pub fn register<H>(mut self, path: &str, handler: H) -> Result<Self, BuildError>
    where
        H: DynHandler + 'static,
    {
        self.registry.register(path, handler)?;
        Ok(self)
    }

    /// 型付き handler を `A::PATH` に登録
    pub fn register_action<A, H>(mut self, handler: H) -> Result<Self, BuildError>
    where
        A: Action,
        H: Handler<A> + 'static,
    {
        self.registry.register_action::<A, H>(handler)?;
        Ok(self)
    }

    /// Paths (in the configured separator) that must be registered by `build()`.
    pub fn expect_actions(mut self, paths: &[&str]) -> Self {
        self.expected_actions = Some(paths.iter().map(|path| path.to_string()).collect());
        self
    }

    /// Demux を構築（期待 action と設定を検証）
    pub fn build(self) -> Result<Demux, BuildError> {
        if let Some(expected) = &self.expected_actions {
            let missing: Vec<String> = expected
                .iter()
                .filter(|path| !self.registry.contains(path))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingActions(missing));
            }
        }
        Demux::new(self.config, self.registry)
    }
}

impl Default for DemuxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

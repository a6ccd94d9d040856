//! Demux - 設定済みの dispatcher インスタンス
//!
//! registry は `ArcSwap` で保持する。
//! - 読み取り（バッチ処理）: `load_full()` でスナップショットを取るだけ、ロックなし
//! - 書き込み（`add_action`）: clone → 登録 → `store()`。writer 同士は Mutex で直列化
//!
//! 実行中のバッチは開始時のスナップショットを使い続ける。

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use serde_json::Value;

use super::builder::BuildError;
use super::config::DemuxConfig;
use super::dispatcher::BatchDispatcher;
use crate::domain::{BatchError, BatchRequest, ResultItem};
use crate::registry::{ActionRegistry, RegistryError};
use crate::typed::DynHandler;

pub struct Demux {
    config: DemuxConfig,
    registry: ArcSwap<ActionRegistry>,
    write_lock: Mutex<()>,
    dispatcher: BatchDispatcher,
}

impl Demux {
    /// 設定と registry から Demux を作成
    ///
    /// `config` を検証し、その separator を `registry` に適用する。
    /// 以降の `add_action` と lookup はこの separator で path を分割する。
    pub fn new(config: DemuxConfig, mut registry: ActionRegistry) -> Result<Self, BuildError> {
        config.validate()?;
        registry
            .set_separator(&config.separator)
            .map_err(RegistryError::from)?;
        let dispatcher = BatchDispatcher::from_config(&config);
        Ok(Self {
            config,
            registry: ArcSwap::from_pointee(registry),
            write_lock: Mutex::new(()),
            dispatcher,
        })
    }

    /// 検証済みの設定
    pub fn config(&self) -> &DemuxConfig {
        &self.config
    }

    /// Current registry snapshot.
    pub fn registry(&self) -> Arc<ActionRegistry> {
        self.registry.load_full()
    }

    /// Register an action on a live instance.
    ///
    /// Batches already running keep the registry they started with; the next
    /// batch sees the new action.
    pub fn add_action<H>(&self, path: &str, handler: H) -> Result<(), RegistryError>
    where
        H: DynHandler + 'static,
    {
        self.update(|registry| registry.register(path, handler))
    }

    /// Like `add_action`, splitting `path` on `separator`.
    pub fn add_action_with<H>(
        &self,
        path: &str,
        separator: &str,
        handler: H,
    ) -> Result<(), RegistryError>
    where
        H: DynHandler + 'static,
    {
        self.update(|registry| registry.register_with(path, separator, handler))
    }

    fn update<F>(&self, apply: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut ActionRegistry) -> Result<(), RegistryError>,
    {
        // poisoned lock: the registry itself is never left half-written
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = ActionRegistry::clone(&self.registry.load());
        apply(&mut next)?;
        self.registry.store(Arc::new(next));
        Ok(())
    }

    /// Dispatch a decoded payload. Fails only if it is not an array.
    pub async fn handle(&self, payload: Value) -> Result<Vec<ResultItem>, BatchError> {
        self.dispatcher
            .dispatch_value(self.registry(), payload)
            .await
    }

    /// 型付きのバッチを dispatch する。結果は入力と同じ順序
    pub async fn handle_batch(&self, batch: BatchRequest) -> Vec<ResultItem> {
        self.dispatcher.dispatch(self.registry(), batch).await
    }
}

impl std::fmt::Debug for Demux {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Demux")
            .field("config", &self.config)
            .field("registry", &self.registry.load())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActionError, ActionInput, RequestItem};
    use crate::typed::{handler_fn, sync_fn};
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[tokio::test]
    async fn add_action_is_visible_to_next_batch() {
        let demux = Demux::new(DemuxConfig::default(), ActionRegistry::new()).unwrap();
        let batch = json!([{"action": "Ping", "args": {}}]);

        let before = demux.handle(batch.clone()).await.unwrap();
        assert!(!before[0].is_success());

        demux
            .add_action("Ping", sync_fn(|_: ActionInput| Ok::<_, ActionError>("pong")))
            .unwrap();
        let after = demux.handle(batch).await.unwrap();
        assert_eq!(after, vec![ResultItem::success("pong")]);
    }

    #[tokio::test]
    async fn add_action_with_separator() {
        let demux = Demux::new(DemuxConfig::default(), ActionRegistry::new()).unwrap();
        demux
            .add_action_with("A/B", "/", sync_fn(|_: ActionInput| Ok::<_, ActionError>(1)))
            .unwrap();
        assert!(demux.registry().contains("A.B"));
    }

    #[test]
    fn add_action_rejects_bad_path() {
        let demux = Demux::new(DemuxConfig::default(), ActionRegistry::new()).unwrap();
        let err = demux
            .add_action("", sync_fn(|_: ActionInput| Ok::<_, ActionError>(1)))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPath(_)));
        assert!(demux.registry().is_empty());
    }

    #[tokio::test]
    async fn new_applies_configured_separator() {
        let config = DemuxConfig {
            separator: "/".into(),
            ..DemuxConfig::default()
        };
        let demux = Demux::new(config, ActionRegistry::new()).unwrap();
        demux
            .add_action("Users/list", sync_fn(|_: ActionInput| Ok::<_, ActionError>("list")))
            .unwrap();
        demux
            .add_action("Users/get", sync_fn(|_: ActionInput| Ok::<_, ActionError>("get")))
            .unwrap();

        let registry = demux.registry();
        assert_eq!(registry.separator(), "/");
        assert_eq!(registry.paths(), vec!["Users/get", "Users/list"]);
        assert!(registry.resolve_with("Users.list", ".").is_some());

        let results = demux
            .handle(json!([
                {"action": "Users/list", "args": {}},
                {"action": "Users.list", "args": {}}
            ]))
            .await
            .unwrap();
        assert_eq!(
            results,
            vec![
                ResultItem::success("list"),
                ResultItem::failure("Action \"Users.list\" cannot be found"),
            ]
        );
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = DemuxConfig {
            separator: String::new(),
            ..DemuxConfig::default()
        };
        assert!(matches!(
            Demux::new(config, ActionRegistry::new()),
            Err(BuildError::Config(_))
        ));
    }

    #[tokio::test]
    async fn in_flight_batch_keeps_its_snapshot() {
        let gate = Arc::new(Notify::new());
        let mut registry = ActionRegistry::new();
        let wait = Arc::clone(&gate);
        registry
            .register(
                "Wait",
                handler_fn(move |_: ActionInput| {
                    let wait = Arc::clone(&wait);
                    async move {
                        wait.notified().await;
                        Ok::<_, ActionError>("done")
                    }
                }),
            )
            .unwrap();
        let demux = Arc::new(Demux::new(DemuxConfig::default(), registry).unwrap());

        let running = tokio::spawn({
            let demux = Arc::clone(&demux);
            async move {
                let batch: BatchRequest = vec![RequestItem::new("Wait", json!({}))]
                    .into_iter()
                    .collect();
                demux.handle_batch(batch).await
            }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        demux
            .add_action("Later", sync_fn(|_: ActionInput| Ok::<_, ActionError>(1)))
            .unwrap();
        gate.notify_one();

        let results = running.await.unwrap();
        assert_eq!(results, vec![ResultItem::success("done")]);
        assert!(demux.registry().contains("Later"));
        assert!(demux.registry().contains("Wait"));
    }
}

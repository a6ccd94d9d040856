//! BatchDispatcher - 1 バッチを N 本の item pipeline に分けて実行する
//!
//! # 流れ
//! 1. payload が配列かチェック（違えばバッチ全体が `BatchError`）
//! 2. item ごとに tokio task を spawn（shape check → resolve → handler 実行）
//! 3. 全 item の完了を待ち、元の index 順で `ResultItem` を返す
//!
//! 1 件の失敗（panic を含む）は、その item の ResultItem になるだけで
//! 他の item には影響しない。

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde_json::Value;
use tokio::task::JoinError;
use tracing::{Instrument, debug, debug_span, info, info_span, trace, warn};

use super::config::DemuxConfig;
use super::status::BatchSummary;
use crate::domain::{
    BatchError, BatchId, BatchRequest, ItemError, ItemState, RequestItem, ResultItem,
};
use crate::registry::ActionRegistry;

#[derive(Debug, Clone, Default)]
pub struct BatchDispatcher {
    timeout: Option<Duration>,
    debug: bool,
}

/// Terminal record of one item pipeline.
#[derive(Debug)]
struct Settled {
    action: Option<String>,
    state: ItemState,
    result: ResultItem,
}

impl Settled {
    fn rejected(action: Option<String>, err: ItemError) -> Self {
        Self {
            action,
            state: ItemState::Rejected(err.stage()),
            result: ResultItem::Failure(err.into_message()),
        }
    }

    fn from_join_error(index: usize, err: JoinError) -> Self {
        let message = if err.is_panic() {
            panic_message(err.into_panic())
        } else {
            "Action was cancelled".to_string()
        };
        warn!(index, %message, "item pipeline aborted");
        Self::rejected(None, ItemError::Panicked(message))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Action panicked".to_string()
    }
}

impl BatchDispatcher {
    /// timeout なし、debug ログなしの dispatcher を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// `DemuxConfig` の timeout と debug フラグを反映
    pub fn from_config(config: &DemuxConfig) -> Self {
        Self {
            timeout: config.handler_timeout(),
            debug: config.debug,
        }
    }

    /// 各 item の handler 実行に timeout を設定
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// item ごとのログを info に昇格する
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Validate `payload` as a batch, then dispatch it.
    pub async fn dispatch_value(
        &self,
        registry: Arc<ActionRegistry>,
        payload: Value,
    ) -> Result<Vec<ResultItem>, BatchError> {
        let batch = BatchRequest::from_value(payload)?;
        Ok(self.dispatch(registry, batch).await)
    }

    /// Run every item concurrently and return the results in input order.
    ///
    /// Returns only once every item has settled.
    pub async fn dispatch(
        &self,
        registry: Arc<ActionRegistry>,
        batch: BatchRequest,
    ) -> Vec<ResultItem> {
        let id = BatchId::generate();
        let span = info_span!("batch", %id, size = batch.len());
        self.run(registry, batch).instrument(span).await
    }

    async fn run(&self, registry: Arc<ActionRegistry>, batch: BatchRequest) -> Vec<ResultItem> {
        let started = Instant::now();

        let handles: Vec<_> = batch
            .into_items()
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                let registry = Arc::clone(&registry);
                let pipeline = run_item(registry, raw, self.timeout);
                tokio::spawn(pipeline.instrument(debug_span!("item", index)))
            })
            .collect();

        // join_all keeps the order of `handles`, so results[i] belongs to request[i]
        let settled: Vec<Settled> = join_all(handles)
            .await
            .into_iter()
            .enumerate()
            .map(|(index, joined)| {
                joined.unwrap_or_else(|err| Settled::from_join_error(index, err))
            })
            .collect();

        for (index, item) in settled.iter().enumerate() {
            self.log_item(index, item);
        }

        let mut summary = BatchSummary::from_states(settled.iter().map(|item| item.state));
        summary.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            total = summary.total,
            settled = summary.settled,
            failed = summary.failed(),
            elapsed_ms = summary.elapsed_ms,
            "batch settled"
        );

        settled.into_iter().map(|item| item.result).collect()
    }

    fn log_item(&self, index: usize, item: &Settled) {
        let action = item.action.as_deref().unwrap_or("-");
        let state = item.state;
        match item.result.message() {
            Some(message) if self.debug => {
                info!(index, action, ?state, %message, "item rejected")
            }
            Some(message) => debug!(index, action, ?state, %message, "item rejected"),
            None if self.debug => info!(index, action, "item settled"),
            None => debug!(index, action, "item settled"),
        }
    }
}

/// One item: shape check, resolve, invoke, settle.
async fn run_item(
    registry: Arc<ActionRegistry>,
    raw: Value,
    timeout: Option<Duration>,
) -> Settled {
    let mut state = ItemState::Received;

    let item = match RequestItem::from_value(raw) {
        Ok(item) => item,
        Err(err) => return Settled::rejected(None, err),
    };
    state = state.advance();
    trace!(?state, action = item.action());

    let (action, input) = item.into_parts();
    let Some(handler) = registry.resolve(&action) else {
        let err = ItemError::NotFound(action.clone());
        return Settled::rejected(Some(action), err);
    };
    state = state.advance();
    trace!(?state, %action);

    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, handler.call(input)).await {
            Ok(result) => result.map_err(ItemError::Handler),
            Err(_elapsed) => Err(ItemError::TimedOut {
                action: action.clone(),
                after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            }),
        },
        None => handler.call(input).await.map_err(ItemError::Handler),
    };
    state = state.advance();
    trace!(?state, %action);

    match outcome {
        Ok(data) => Settled {
            action: Some(action),
            state: state.advance(),
            result: ResultItem::Success(data),
        },
        Err(err) => Settled::rejected(Some(action), err),
    }
}

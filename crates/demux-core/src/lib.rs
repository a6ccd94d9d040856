//! demux-core
//!
//! Batched action dispatch: one HTTP call carries many `{action, args}`
//! items, each routed to a handler registered under a namespaced path.
//!
//! # モジュール構成
//! - **domain**: パス、リクエスト、結果、エラーなどの型
//! - **typed**: handler API（`Action`, `Handler<A>`, `DynHandler`, closure handler）
//! - **registry**: 名前空間つき handler の木（path resolver + ActionRegistry）
//! - **app**: 設定、builder、`Demux`、`BatchDispatcher`
//! - **http**: axum middleware（CORS, pass-through, 400 応答）

pub mod app;
pub mod domain;
pub mod http;
pub mod registry;
pub mod typed;

pub use app::{BuildError, Demux, DemuxBuilder, DemuxConfig, HttpMethod};
pub use domain::{ActionError, ActionInput, BatchError, ResultItem};
pub use registry::{ActionRegistry, RegistryError};
pub use typed::{Action, DynHandler, Handler, handler_fn, sync_fn};

/// Crate version, reported by the `System.version` demo action.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

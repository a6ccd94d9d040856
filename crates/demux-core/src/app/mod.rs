//! App - アプリケーション層
//!
//! registry と dispatcher を組み合わせて、設定済みの `Demux` を作る。
//!
//! # 主要コンポーネント
//! - **DemuxBuilder**: 構築とワイヤリング（fail-fast 検証つき）
//! - **Demux**: 設定 + registry スナップショット + dispatcher
//! - **BatchDispatcher**: バッチの fan-out / join
//! - **DemuxConfig**: endpoint と dispatcher の設定

pub mod builder;
pub mod config;
pub mod demux;
pub mod dispatcher;
pub mod status;

pub use self::builder::{BuildError, DemuxBuilder};
pub use self::config::{ConfigError, DemuxConfig, HttpMethod};
pub use self::demux::Demux;
pub use self::dispatcher::BatchDispatcher;
pub use self::status::BatchSummary;

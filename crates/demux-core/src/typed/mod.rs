//! Typed - handler API
//!
//! # 二層構造
//! - **表層（Typed）**: `Action` trait, `Handler<A>` trait - 型安全
//! - **内部（Dyn）**: `DynHandler` trait - object-safe, type erasure
//!
//! closure からも `handler_fn` / `sync_fn` で `DynHandler` を作れる。

pub mod action;
pub mod handler;

pub use self::action::Action;
pub use self::handler::{
    DynHandler, FnHandler, Handler, SyncFnHandler, TypedHandler, handler_fn, sync_fn,
};

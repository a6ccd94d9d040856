//! Handler trait - action を実行する handler の定義
//!
//! - `Handler<A>`: 型付き handler（args は `A` にデコード済み）
//! - `DynHandler`: object-safe な handler。registry はこれだけを保持する
//! - `TypedHandler<A, H>` / `FnHandler` / `SyncFnHandler`: `DynHandler` への変換
//!
//! sync でも async でも、戻り値は最終的に同じ
//! `Result<Value, ActionError>` に正規化される。

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::action::Action;
use crate::domain::{ActionError, ActionInput};

/// Handler runs one typed action.
///
/// # 使用例
/// ```ignore
/// struct AddHandler;
///
/// #[async_trait]
/// impl Handler<Add> for AddHandler {
///     async fn handle(&self, args: Add) -> Result<i64, ActionError> {
///         Ok(args.a + args.b)
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<A: Action>: Send + Sync {
    async fn handle(&self, args: A) -> Result<A::Output, ActionError>;
}

/// Object-safe handler stored in the registry.
///
/// Receives the request item without its `action` key.
#[async_trait]
pub trait DynHandler: Send + Sync {
    async fn call(&self, input: ActionInput) -> Result<Value, ActionError>;
}

#[async_trait]
impl<T: DynHandler + ?Sized> DynHandler for Arc<T> {
    async fn call(&self, input: ActionInput) -> Result<Value, ActionError> {
        (**self).call(input).await
    }
}

fn encode<R: Serialize>(output: R) -> Result<Value, ActionError> {
    serde_json::to_value(output).map_err(|e| ActionError::new(format!("json encode: {e}")))
}

pub struct TypedHandler<A: Action, H: Handler<A>> {
    handler: H,
    _marker: PhantomData<fn() -> A>,
}

impl<A: Action, H: Handler<A>> TypedHandler<A, H> {
    /// 型付き handler を `DynHandler` として包む
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<A: Action, H: Handler<A>> DynHandler for TypedHandler<A, H> {
    async fn call(&self, input: ActionInput) -> Result<Value, ActionError> {
        let args: A = input.decode_args()?;
        let output = self.handler.handle(args).await?;
        encode(output)
    }
}

/// Handler built from an async closure.
pub struct FnHandler<F> {
    f: F,
}

/// Wrap an async closure `Fn(ActionInput) -> impl Future<Output = Result<R, E>>`.
pub fn handler_fn<F>(f: F) -> FnHandler<F> {
    FnHandler { f }
}

#[async_trait]
impl<F, Fut, R, E> DynHandler for FnHandler<F>
where
    F: Fn(ActionInput) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, E>> + Send,
    R: Serialize + Send,
    E: Into<ActionError> + Send,
{
    async fn call(&self, input: ActionInput) -> Result<Value, ActionError> {
        let output = (self.f)(input).await.map_err(Into::<ActionError>::into)?;
        encode(output)
    }
}

/// Handler built from a plain (blocking-free) closure.
pub struct SyncFnHandler<F> {
    f: F,
}

/// Wrap a synchronous closure `Fn(ActionInput) -> Result<R, E>`.
pub fn sync_fn<F>(f: F) -> SyncFnHandler<F> {
    SyncFnHandler { f }
}

#[async_trait]
impl<F, R, E> DynHandler for SyncFnHandler<F>
where
    F: Fn(ActionInput) -> Result<R, E> + Send + Sync,
    R: Serialize,
    E: Into<ActionError>,
{
    async fn call(&self, input: ActionInput) -> Result<Value, ActionError> {
        let result = (self.f)(input);
        encode(result.map_err(Into::<ActionError>::into)?)
    }
}

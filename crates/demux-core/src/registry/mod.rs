//! ActionRegistry - handler の登録と検索
//!
//! path resolver の上に名前空間付きの API を載せる。
//!
//! # 上書きの方針
//! - `register`: 既存の action を黙って上書きする（置き換えたものは warn ログに出す）
//! - `try_register`: 衝突したら `RegistryError` を返す

pub mod resolver;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use self::resolver::{Displaced, Namespace, Node};
use crate::domain::{ActionPath, DEFAULT_SEPARATOR, PathError};
use crate::typed::{Action, DynHandler, Handler, TypedHandler};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    InvalidPath(#[from] PathError),

    #[error("action '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("cannot register '{path}': '{prefix}' is already an action")]
    PrefixCollision { path: String, prefix: String },
}

/// Tree of handlers addressed by namespaced paths.
///
/// Cloning is cheap: handlers are shared behind `Arc`.
///
/// # 使用例
/// ```ignore
/// let mut registry = ActionRegistry::new();
/// registry.register("System.ping", sync_fn(|_| Ok::<_, ActionError>("pong")))?;
///
/// let handler = registry.resolve("System.ping");
/// ```
#[derive(Clone)]
pub struct ActionRegistry {
    root: Namespace,
    separator: String,
}

impl ActionRegistry {
    /// `.` 区切りの空の registry を作成
    pub fn new() -> Self {
        Self {
            root: Namespace::new(),
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    /// 指定した separator で空の registry を作成
    pub fn with_separator(separator: &str) -> Result<Self, PathError> {
        let mut registry = Self::new();
        registry.set_separator(separator)?;
        Ok(registry)
    }

    /// path の分割に使う separator
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Changes how future path strings are split. Already registered actions
    /// are stored by segment and stay reachable.
    pub fn set_separator(&mut self, separator: &str) -> Result<(), PathError> {
        if separator.is_empty() {
            return Err(PathError::EmptySeparator);
        }
        self.separator = separator.to_string();
        Ok(())
    }

    /// Register `handler` at `path`, overwriting whatever is there.
    pub fn register<H>(&mut self, path: &str, handler: H) -> Result<(), RegistryError>
    where
        H: DynHandler + 'static,
    {
        let path = ActionPath::parse(path, &self.separator)?;
        self.insert(&path, Arc::new(handler));
        Ok(())
    }

    /// Like `register`, splitting `path` on `separator` instead of the
    /// registry's own separator.
    pub fn register_with<H>(
        &mut self,
        path: &str,
        separator: &str,
        handler: H,
    ) -> Result<(), RegistryError>
    where
        H: DynHandler + 'static,
    {
        let path = ActionPath::parse(path, separator)?;
        self.insert(&path, Arc::new(handler));
        Ok(())
    }

    /// Register a typed handler under `A::PATH` (always `.`-separated).
    pub fn register_action<A, H>(&mut self, handler: H) -> Result<(), RegistryError>
    where
        A: Action,
        H: Handler<A> + 'static,
    {
        let path = ActionPath::parse(A::PATH, DEFAULT_SEPARATOR)?;
        self.insert(&path, Arc::new(TypedHandler::<A, H>::new(handler)));
        Ok(())
    }

    /// Register without overwriting anything.
    pub fn try_register<H>(&mut self, path: &str, handler: H) -> Result<(), RegistryError>
    where
        H: DynHandler + 'static,
    {
        let path = ActionPath::parse(path, &self.separator)?;
        if let Some(depth) = resolver::leaf_prefix(&self.root, path.segments()) {
            return Err(RegistryError::PrefixCollision {
                path: path.to_string(),
                prefix: path.segments()[..depth].join(&self.separator),
            });
        }
        if resolver::get(&self.root, path.segments()).is_some() {
            return Err(RegistryError::AlreadyRegistered(path.to_string()));
        }
        self.insert(&path, Arc::new(handler));
        Ok(())
    }

    /// Store an already type-erased handler.
    pub fn insert(&mut self, path: &ActionPath, handler: Arc<dyn DynHandler>) {
        let displaced = resolver::set(&mut self.root, path.segments(), Node::Action(handler));
        self.report(path, displaced);
        debug!(action = %path, "registered action");
    }

    fn report(&self, path: &ActionPath, displaced: Vec<Displaced>) {
        for Displaced { path: at, node } in displaced {
            let at = at.join(&self.separator);
            match node {
                Node::Action(_) => {
                    warn!(action = %path, replaced = %at, "replaced existing action")
                }
                Node::Namespace(_) => {
                    warn!(action = %path, replaced = %at, "replaced existing namespace")
                }
            }
        }
    }

    /// Handler at `path`, or `None` when the path is absent at any level,
    /// names a namespace, or does not parse.
    pub fn resolve(&self, path: &str) -> Option<Arc<dyn DynHandler>> {
        self.resolve_with(path, &self.separator)
    }

    /// `path` を `separator` で分割して handler を探す
    pub fn resolve_with(&self, path: &str, separator: &str) -> Option<Arc<dyn DynHandler>> {
        let path = ActionPath::parse(path, separator).ok()?;
        self.resolve_path(&path)
    }

    /// パース済み path の handler。namespace や未登録なら `None`
    pub fn resolve_path(&self, path: &ActionPath) -> Option<Arc<dyn DynHandler>> {
        resolver::get(&self.root, path.segments())
            .and_then(Node::as_action)
            .cloned()
    }

    /// `path` に handler が登録されているか
    pub fn contains(&self, path: &str) -> bool {
        self.resolve(path).is_some()
    }

    /// Registered action paths, sorted, joined with the registry separator.
    pub fn paths(&self) -> Vec<String> {
        resolver::leaves(&self.root)
            .into_iter()
            .map(|(segments, _)| segments.join(&self.separator))
            .collect()
    }

    /// 登録済み handler の数
    pub fn len(&self) -> usize {
        resolver::leaves(&self.root).len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Graft every action of `other` under `prefix`.
    pub fn mount(&mut self, prefix: &str, other: &ActionRegistry) -> Result<(), RegistryError> {
        let prefix = ActionPath::parse(prefix, &self.separator)?;
        for (segments, handler) in resolver::leaves(&other.root) {
            let path = ActionPath::from_segments(segments, &self.separator)?.prefixed(&prefix);
            self.insert(&path, handler);
        }
        Ok(())
    }

    /// Copy every action of `other` into this registry at the same paths.
    pub fn merge(&mut self, other: &ActionRegistry) {
        for (segments, handler) in resolver::leaves(&other.root) {
            let displaced = resolver::set(&mut self.root, &segments, Node::Action(handler));
            if let Ok(path) = ActionPath::from_segments(segments, &self.separator) {
                self.report(&path, displaced);
            }
        }
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("separator", &self.separator)
            .field("actions", &self.paths())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActionError, ActionInput};
    use crate::typed::action::fixtures::Add;
    use crate::typed::sync_fn;
    use async_trait::async_trait;
    use serde_json::{Value, json};

    fn reply(value: &'static str) -> impl DynHandler + 'static {
        sync_fn(move |_: ActionInput| Ok::<_, ActionError>(value))
    }

    async fn call(registry: &ActionRegistry, path: &str) -> Value {
        registry
            .resolve(path)
            .unwrap()
            .call(ActionInput::default())
            .await
            .unwrap()
    }

    struct AddHandler;

    #[async_trait]
    impl Handler<Add> for AddHandler {
        async fn handle(&self, args: Add) -> Result<i64, ActionError> {
            Ok(args.a + args.b)
        }
    }

    #[tokio::test]
    async fn register_and_resolve() {
        let mut registry = ActionRegistry::new();
        registry.register("A.B.C", reply("abc")).unwrap();

        assert_eq!(call(&registry, "A.B.C").await, json!("abc"));
        assert!(registry.resolve("A.B").is_none());
        assert!(registry.resolve("A.B.C.D").is_none());
    }

    #[test]
    fn resolve_returns_the_registered_handler() {
        let handler: Arc<dyn DynHandler> = Arc::new(reply("same"));
        let mut registry = ActionRegistry::new();
        let path = ActionPath::parse("A.B.C", ".").unwrap();
        registry.insert(&path, Arc::clone(&handler));

        let resolved = registry.resolve("A.B.C").unwrap();
        assert!(Arc::ptr_eq(&resolved, &handler));
    }

    #[test]
    fn unparseable_paths_are_not_found() {
        let mut registry = ActionRegistry::new();
        registry.register("A", reply("a")).unwrap();
        assert!(registry.resolve("").is_none());
        assert!(registry.resolve("A.").is_none());
    }

    #[test]
    fn register_rejects_empty_segments() {
        let mut registry = ActionRegistry::new();
        let err = registry.register("A..B", reply("x")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn reregistering_overwrites() {
        let mut registry = ActionRegistry::new();
        registry.register("Ping", reply("first")).unwrap();
        registry.register("Ping", reply("second")).unwrap();

        assert_eq!(call(&registry, "Ping").await, json!("second"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn try_register_reports_collisions() {
        let mut registry = ActionRegistry::new();
        registry.try_register("A.B", reply("ab")).unwrap();

        assert!(matches!(
            registry.try_register("A.B", reply("again")),
            Err(RegistryError::AlreadyRegistered(path)) if path == "A.B"
        ));
        assert!(matches!(
            registry.try_register("A.B.C", reply("deeper")),
            Err(RegistryError::PrefixCollision { prefix, .. }) if prefix == "A.B"
        ));
        assert!(matches!(
            registry.try_register("A", reply("namespace")),
            Err(RegistryError::AlreadyRegistered(_))
        ));
        registry.try_register("A.C", reply("sibling")).unwrap();
        assert_eq!(registry.paths(), vec!["A.B", "A.C"]);
    }

    #[tokio::test]
    async fn custom_separator() {
        let mut registry = ActionRegistry::with_separator("/").unwrap();
        registry.register("Users/list", reply("users")).unwrap();

        assert_eq!(call(&registry, "Users/list").await, json!("users"));
        assert!(registry.resolve("Users.list").is_none());
        assert!(registry.resolve_with("Users.list", ".").is_some());
        assert_eq!(registry.paths(), vec!["Users/list"]);
    }

    #[test]
    fn register_with_explicit_separator() {
        let mut registry = ActionRegistry::new();
        registry.register_with("A:B", ":", reply("ab")).unwrap();
        assert!(registry.contains("A.B"));
    }

    #[tokio::test]
    async fn typed_registration_uses_action_path() {
        let mut registry = ActionRegistry::new();
        registry.register_action::<Add, _>(AddHandler).unwrap();

        let out = registry
            .resolve("Math.add")
            .unwrap()
            .call(ActionInput::from_args(json!({"a": 40, "b": 2})))
            .await
            .unwrap();
        assert_eq!(out, json!(42));
    }

    #[test]
    fn mount_and_merge() {
        let mut users = ActionRegistry::new();
        users.register("list", reply("list")).unwrap();
        users.register("get", reply("get")).unwrap();

        let mut registry = ActionRegistry::new();
        registry.mount("Admin.Users", &users).unwrap();
        registry.merge(&users);

        assert_eq!(
            registry.paths(),
            vec!["Admin.Users.get", "Admin.Users.list", "get", "list"]
        );
        assert_eq!(registry.len(), 4);
        assert!(!registry.is_empty());
    }
}

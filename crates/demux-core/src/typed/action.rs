//! Action trait - 型付き action の定義
//!
//! action の path と args の型を対応付ける。typo した path 文字列を
//! 手で書く代わりに `A::PATH` を使う。

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Action binds a registry path to the type of its `args`.
///
/// # 使用例
/// ```ignore
/// #[derive(Deserialize)]
/// struct Add {
///     a: i64,
///     b: i64,
/// }
///
/// impl Action for Add {
///     const PATH: &'static str = "Math.add";
///     type Output = i64;
/// }
/// ```
///
/// # Trait Bounds
/// - `DeserializeOwned`: `args` から復元するため
/// - `Send + Sync + 'static`: tokio task の中で使うため
pub trait Action: DeserializeOwned + Send + Sync + 'static {
    /// Path under which the action is registered, using the default separator.
    const PATH: &'static str;

    /// Value placed in the `data` field on success.
    type Output: Serialize + Send + 'static;
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde::Deserialize;

    use super::Action;

    #[derive(Debug, Clone, Deserialize)]
    pub struct Add {
        pub a: i64,
        pub b: i64,
    }

    impl Action for Add {
        const PATH: &'static str = "Math.add";
        type Output = i64;
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Greet {
        pub name: String,
    }

    impl Action for Greet {
        const PATH: &'static str = "Hello.greet";
        type Output = String;
    }
}

//! Path resolver - セグメント列で木をたどる `get` / `set`
//!
//! 木は `Node = Action(handler) | Namespace(map)` のタグ付き enum。
//! 「見つからない」は `None` で表すので、登録済みの値と混同しない。

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::typed::DynHandler;

/// Children of a namespace, keyed by segment.
pub type Namespace = BTreeMap<String, Node>;

#[derive(Clone)]
pub enum Node {
    Action(Arc<dyn DynHandler>),
    Namespace(Namespace),
}

impl Node {
    /// leaf なら handler を返す
    pub fn as_action(&self) -> Option<&Arc<dyn DynHandler>> {
        match self {
            Node::Action(handler) => Some(handler),
            Node::Namespace(_) => None,
        }
    }

    pub fn is_namespace(&self) -> bool {
        matches!(self, Node::Namespace(_))
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Action(_) => f.write_str("Action(..)"),
            Node::Namespace(children) => f.debug_map().entries(children.iter()).finish(),
        }
    }
}

/// A node removed from the tree by `set`, with the segments it lived at.
#[derive(Debug)]
pub struct Displaced {
    pub path: Vec<String>,
    pub node: Node,
}

/// Walk `root` along `segments`.
///
/// Returns `None` if a segment is absent or an action is reached before the
/// last segment. An empty segment list resolves to nothing.
pub fn get<'a>(root: &'a Namespace, segments: &[String]) -> Option<&'a Node> {
    let (last, parents) = segments.split_last()?;
    let mut current = root;
    for segment in parents {
        match current.get(segment)? {
            Node::Namespace(children) => current = children,
            Node::Action(_) => return None,
        }
    }
    current.get(last)
}

/// Store `node` at `segments`, creating namespaces on the way.
///
/// An action found at an intermediate segment is replaced by a fresh
/// namespace. Everything removed from the tree is returned.
pub fn set(root: &mut Namespace, segments: &[String], node: Node) -> Vec<Displaced> {
    let mut displaced = Vec::new();
    let Some((last, parents)) = segments.split_last() else {
        return displaced;
    };

    let mut current = root;
    for (depth, segment) in parents.iter().enumerate() {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(|| Node::Namespace(Namespace::new()));
        if !slot.is_namespace() {
            let old = std::mem::replace(slot, Node::Namespace(Namespace::new()));
            displaced.push(Displaced {
                path: segments[..=depth].to_vec(),
                node: old,
            });
        }
        current = match slot {
            Node::Namespace(children) => children,
            // replaced just above
            Node::Action(_) => return displaced,
        };
    }

    if let Some(old) = current.insert(last.clone(), node) {
        displaced.push(Displaced {
            path: segments.to_vec(),
            node: old,
        });
    }
    displaced
}

/// Depth of the first action sitting on a strict prefix of `segments`.
pub fn leaf_prefix(root: &Namespace, segments: &[String]) -> Option<usize> {
    let (_, parents) = segments.split_last()?;
    let mut current = root;
    for (depth, segment) in parents.iter().enumerate() {
        match current.get(segment)? {
            Node::Namespace(children) => current = children,
            Node::Action(_) => return Some(depth + 1),
        }
    }
    None
}

/// Every action in the tree, in sorted path order.
pub fn leaves(root: &Namespace) -> Vec<(Vec<String>, Arc<dyn DynHandler>)> {
    let mut out = Vec::new();
    collect(root, &mut Vec::new(), &mut out);
    out
}

fn collect(
    namespace: &Namespace,
    prefix: &mut Vec<String>,
    out: &mut Vec<(Vec<String>, Arc<dyn DynHandler>)>,
) {
    for (segment, node) in namespace {
        prefix.push(segment.clone());
        match node {
            Node::Action(handler) => out.push((prefix.clone(), Arc::clone(handler))),
            Node::Namespace(children) => collect(children, prefix, out),
        }
        prefix.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActionError, ActionInput};
    use crate::typed::sync_fn;
    use serde_json::json;

    fn segs(path: &str) -> Vec<String> {
        path.split('.').map(str::to_string).collect()
    }

    fn action(reply: &'static str) -> Node {
        Node::Action(Arc::new(sync_fn(move |_: ActionInput| {
            Ok::<_, ActionError>(reply)
        })))
    }

    async fn reply_of(node: &Node) -> serde_json::Value {
        node.as_action()
            .unwrap()
            .call(ActionInput::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn set_then_get() {
        let mut root = Namespace::new();
        assert!(set(&mut root, &segs("A.B.C"), action("abc")).is_empty());

        let node = get(&root, &segs("A.B.C")).unwrap();
        assert_eq!(reply_of(node).await, json!("abc"));
    }

    #[test]
    fn get_intermediate_is_namespace_and_deeper_is_absent() {
        let mut root = Namespace::new();
        set(&mut root, &segs("A.B.C"), action("abc"));

        assert!(get(&root, &segs("A.B")).unwrap().is_namespace());
        assert!(get(&root, &segs("A.B.C.D")).is_none());
        assert!(get(&root, &segs("X")).is_none());
        assert!(get(&root, &[]).is_none());
    }

    #[tokio::test]
    async fn set_overwrites_final_slot() {
        let mut root = Namespace::new();
        set(&mut root, &segs("A.B"), action("first"));
        let displaced = set(&mut root, &segs("A.B"), action("second"));

        assert_eq!(displaced.len(), 1);
        assert_eq!(displaced[0].path, segs("A.B"));
        assert_eq!(reply_of(get(&root, &segs("A.B")).unwrap()).await, json!("second"));
    }

    #[test]
    fn set_replaces_leaf_prefix_with_namespace() {
        let mut root = Namespace::new();
        set(&mut root, &segs("A.B"), action("leaf"));
        let displaced = set(&mut root, &segs("A.B.C"), action("deeper"));

        assert_eq!(displaced.len(), 1);
        assert_eq!(displaced[0].path, segs("A.B"));
        assert!(get(&root, &segs("A.B")).unwrap().is_namespace());
        assert!(get(&root, &segs("A.B.C")).unwrap().as_action().is_some());
    }

    #[test]
    fn set_over_namespace_discards_subtree() {
        let mut root = Namespace::new();
        set(&mut root, &segs("A.B.C"), action("abc"));
        let displaced = set(&mut root, &segs("A"), action("a"));

        assert_eq!(displaced.len(), 1);
        assert!(displaced[0].node.is_namespace());
        assert!(get(&root, &segs("A.B.C")).is_none());
    }

    #[test]
    fn leaf_prefix_reports_depth() {
        let mut root = Namespace::new();
        set(&mut root, &segs("A.B"), action("ab"));

        assert_eq!(leaf_prefix(&root, &segs("A.B.C.D")), Some(2));
        assert_eq!(leaf_prefix(&root, &segs("A.B")), None);
        assert_eq!(leaf_prefix(&root, &segs("A.X.Y")), None);
    }

    #[test]
    fn leaves_are_sorted() {
        let mut root = Namespace::new();
        set(&mut root, &segs("b.y"), action("by"));
        set(&mut root, &segs("a"), action("a"));
        set(&mut root, &segs("b.x"), action("bx"));

        let paths: Vec<String> = leaves(&root)
            .into_iter()
            .map(|(path, _)| path.join("."))
            .collect();
        assert_eq!(paths, vec!["a", "b.x", "b.y"]);
    }
}

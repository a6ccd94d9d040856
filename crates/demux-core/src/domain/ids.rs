//! Identifiers.
//!
//! ULID を使うので生成順にソートでき、ログ上でバッチの前後関係が追いやすい。

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifies one inbound batch in logs.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchId(Ulid);

impl BatchId {
    /// 新しい BatchId を生成
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }
}

impl From<Ulid> for BatchId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_has_prefix() {
        let id = BatchId::from_ulid(Ulid::nil());
        assert_eq!(id.to_string(), format!("batch-{}", Ulid::nil()));
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(BatchId::generate(), BatchId::generate());
    }
}

//! State - 1 件の request item の状態
//!
//! # 状態遷移
//! ```text
//! Received -> ShapeChecked -> Resolved -> Executed -> Settled
//!     \-> Rejected(Shape)       \-> Rejected(Lookup)  \-> Rejected(Handler)
//! ```
//! 各 item は兄弟とは独立に遷移する。終端は Settled か Rejected のどちらか。

use serde::{Deserialize, Serialize};

/// Stage at which an item was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectStage {
    Shape,
    Lookup,
    Handler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    Received,
    ShapeChecked,
    Resolved,
    Executed,
    Settled,
    Rejected(RejectStage),
}

impl ItemState {
    /// Settled または Rejected なら true
    pub fn is_terminal(self) -> bool {
        matches!(self, ItemState::Settled | ItemState::Rejected(_))
    }

    /// Next state on the success path. Terminal states do not advance.
    pub fn advance(self) -> ItemState {
        match self {
            ItemState::Received => ItemState::ShapeChecked,
            ItemState::ShapeChecked => ItemState::Resolved,
            ItemState::Resolved => ItemState::Executed,
            ItemState::Executed => ItemState::Settled,
            terminal => terminal,
        }
    }
}

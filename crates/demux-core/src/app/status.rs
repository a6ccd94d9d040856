//! Status - バッチ単位の集計（ログ出力用）

use serde::{Deserialize, Serialize};

use crate::domain::{ItemState, RejectStage};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub settled: usize,
    pub rejected_shape: usize,
    pub rejected_lookup: usize,
    pub rejected_handler: usize,
    pub elapsed_ms: u64,
}

impl BatchSummary {
    /// Tally terminal item states. Non-terminal states are only counted in
    /// `total`.
    pub fn from_states<I>(states: I) -> Self
    where
        I: IntoIterator<Item = ItemState>,
    {
        let mut summary = Self::default();
        for state in states {
            summary.total += 1;
            match state {
                ItemState::Settled => summary.settled += 1,
                ItemState::Rejected(RejectStage::Shape) => summary.rejected_shape += 1,
                ItemState::Rejected(RejectStage::Lookup) => summary.rejected_lookup += 1,
                ItemState::Rejected(RejectStage::Handler) => summary.rejected_handler += 1,
                _ => {}
            }
        }
        summary
    }

    /// いずれかの段階で失敗した item 数
    pub fn failed(&self) -> usize {
        self.rejected_shape + self.rejected_lookup + self.rejected_handler
    }
}

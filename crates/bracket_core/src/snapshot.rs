//! Per-round tournament state, the unit of persistence and resume

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TournamentConfig;
use crate::item::{self, Item};
use crate::verdict::JudgmentRecord;

/// Full state after a completed round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSnapshot {
    pub tournament_id: String,
    pub round: u32,
    pub timestamp: DateTime<Utc>,
    pub config: TournamentConfig,
    pub items: Vec<Item>,
    /// Every judgment up to and including `round`
    #[serde(default)]
    pub judgments: Vec<JudgmentRecord>,
}

impl RoundSnapshot {
    pub fn active_count(&self) -> usize {
        item::active_count(&self.items)
    }

    /// Highest-scored active item
    pub fn leader(&self) -> Option<&Item> {
        item::survivors(&self.items).into_iter().next()
    }

    pub fn standings(&self) -> Vec<&Item> {
        item::standings(&self.items)
    }

    /// Items eliminated in exactly `round`
    pub fn eliminated_in(&self, round: u32) -> impl Iterator<Item = &Item> {
        self.items
            .iter()
            .filter(move |item| item.eliminated && item.round == round)
    }
}

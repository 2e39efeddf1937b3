//! Tournament entrants and their mutable standing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::rating::DEFAULT_SCORE;

/// An entry supplied by item discovery, before it has tournament state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSource {
    /// Opaque reference to the content (a file path for photos)
    pub locator: String,
    /// Informational only; never used for ordering or judging
    pub created_at: Option<DateTime<Utc>>,
}

impl ItemSource {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            created_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// A judged entity with its current tournament standing.
///
/// `eliminated` only ever moves from `false` to `true`. Once set, `round`
/// records the elimination round and is left alone afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(alias = "path")]
    pub locator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub score: f64,
    pub round: u32,
    pub eliminated: bool,
}

impl Item {
    /// Fresh entrant at the default score, identified by its position in the input.
    pub fn new(index: usize, source: &ItemSource) -> Self {
        Self {
            id: format!("item-{}", index),
            locator: source.locator.clone(),
            created_at: source.created_at,
            score: DEFAULT_SCORE,
            round: 0,
            eliminated: false,
        }
    }

    /// Build the initial field, assigning `item-0`, `item-1`, ... in input order.
    pub fn from_sources(sources: &[ItemSource]) -> Vec<Self> {
        sources
            .iter()
            .enumerate()
            .map(|(index, source)| Self::new(index, source))
            .collect()
    }

    pub fn is_active(&self) -> bool {
        !self.eliminated
    }

    /// Mark a surviving item as having been carried through `round`.
    pub(crate) fn advance(&mut self, round: u32) {
        debug_assert!(self.is_active(), "advancing eliminated item {}", self.id);
        self.round = round;
    }

    pub(crate) fn eliminate(&mut self, round: u32) {
        debug_assert!(self.is_active(), "eliminating {} twice", self.id);
        self.eliminated = true;
        self.round = round;
    }
}

/// Descending score order. NaN compares equal so sorting never panics.
pub fn by_score_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

pub fn active_count(items: &[Item]) -> usize {
    items.iter().filter(|item| item.is_active()).count()
}

/// Active items, highest score first. Ties keep their input order.
pub fn survivors(items: &[Item]) -> Vec<&Item> {
    let mut active: Vec<&Item> = items.iter().filter(|item| item.is_active()).collect();
    active.sort_by(|a, b| by_score_desc(a.score, b.score));
    active
}

/// Full standings: survivors by score, then eliminated items with the
/// latest eliminations first (score breaks ties within a round).
pub fn standings(items: &[Item]) -> Vec<&Item> {
    let mut ranked: Vec<&Item> = items.iter().collect();
    ranked.sort_by(|a, b| match (a.eliminated, b.eliminated) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (false, false) => by_score_desc(a.score, b.score),
        (true, true) => b
            .round
            .cmp(&a.round)
            .then_with(|| by_score_desc(a.score, b.score)),
    });
    ranked
}

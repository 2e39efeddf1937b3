//! Judgment outcomes and the append-only judgment history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::item::Item;

/// Which of the two submitted items won
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl Side {
    /// Accepts `a`/`b` in either case, ignoring surrounding whitespace.
    pub fn parse(label: &str) -> Option<Side> {
        match label.trim() {
            "a" | "A" => Some(Side::A),
            "b" | "B" => Some(Side::B),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::A => "a",
            Side::B => "b",
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a judge answers for one comparison, before any context is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Judgment {
    pub winner: Side,
    pub explanation: String,
}

impl Judgment {
    pub fn new(winner: Side, explanation: impl Into<String>) -> Self {
        Self {
            winner,
            explanation: explanation.into(),
        }
    }
}

/// A judgment together with the round and model it was obtained under.
/// Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub winner: Side,
    pub rationale: String,
    pub timestamp: DateTime<Utc>,
    pub round: u32,
    pub model: String,
}

/// One entry of a tournament's judgment history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgmentRecord {
    pub id: String,
    pub item_a: String,
    pub item_b: String,
    pub item_a_locator: String,
    pub item_b_locator: String,
    pub winner: Side,
    pub explanation: String,
    pub timestamp: DateTime<Utc>,
    pub round: u32,
    pub model: String,
}

impl JudgmentRecord {
    /// `sequence` is the record's position in the tournament history and
    /// keeps ids unique when a pair is judged twice within a millisecond.
    pub fn new(a: &Item, b: &Item, verdict: Verdict, sequence: usize) -> Self {
        Self {
            id: format!(
                "{}-vs-{}-{}-{}",
                a.id,
                b.id,
                verdict.timestamp.timestamp_millis(),
                sequence
            ),
            item_a: a.id.clone(),
            item_b: b.id.clone(),
            item_a_locator: a.locator.clone(),
            item_b_locator: b.locator.clone(),
            winner: verdict.winner,
            explanation: verdict.rationale,
            timestamp: verdict.timestamp,
            round: verdict.round,
            model: verdict.model,
        }
    }

    pub fn winner_id(&self) -> &str {
        match self.winner {
            Side::A => &self.item_a,
            Side::B => &self.item_b,
        }
    }

    pub fn loser_id(&self) -> &str {
        match self.winner {
            Side::A => &self.item_b,
            Side::B => &self.item_a,
        }
    }

    pub fn involves(&self, item_id: &str) -> bool {
        self.item_a == item_id || self.item_b == item_id
    }
}

#[cfg(test)]
#[path = "verdict_tests.rs"]
mod verdict_tests;

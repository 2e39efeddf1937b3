//! Text reports over stored rounds and judgment history

use bracket_core::{JudgmentRecord, RoundSnapshot};
use std::collections::BTreeSet;

use crate::controller::{Termination, TournamentOutcome};

/// Filter over a judgment history. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JudgmentQuery {
    pub round: Option<u32>,
    /// Keep judgments in which this item took part, on either side
    pub item: Option<String>,
}

impl JudgmentQuery {
    pub fn matches(&self, record: &JudgmentRecord) -> bool {
        if let Some(round) = self.round {
            if record.round != round {
                return false;
            }
        }
        match &self.item {
            Some(item) => record.involves(item),
            None => true,
        }
    }

    /// Matching judgments, in recorded order
    pub fn select<'a>(&self, judgments: &'a [JudgmentRecord]) -> Vec<&'a JudgmentRecord> {
        judgments.iter().filter(|record| self.matches(record)).collect()
    }
}

/// Distinct rounds that have at least one judgment, ascending
pub fn rounds_with_judgments(judgments: &[JudgmentRecord]) -> Vec<u32> {
    judgments
        .iter()
        .map(|record| record.round)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Standings table for a stored round
pub fn render_report(snapshot: &RoundSnapshot) -> String {
    let mut report = String::new();
    report.push_str(&format!("=== Tournament: {} ===\n\n", snapshot.tournament_id));
    report.push_str(&format!(
        "Algorithm: {}, round {} of {}, model {}\n",
        snapshot.config.algorithm, snapshot.round, snapshot.config.rounds, snapshot.config.model
    ));
    report.push_str(&format!(
        "Items: {} total, {} active, {} judgments\n",
        snapshot.items.len(),
        snapshot.active_count(),
        snapshot.judgments.len()
    ));
    report.push_str(&format!(
        "Saved: {}\n\n",
        snapshot.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    report.push_str(&format!(
        "{:<6} {:<12} {:>8}  {:<10} {:>5}  {}\n",
        "Rank", "Item", "Score", "Status", "Round", "Photo"
    ));
    report.push_str(&"-".repeat(72));
    report.push('\n');

    for (rank, item) in snapshot.standings().into_iter().enumerate() {
        let status = if item.eliminated { "eliminated" } else { "active" };
        report.push_str(&format!(
            "{:<6} {:<12} {:>8.1}  {:<10} {:>5}  {}\n",
            rank + 1,
            item.id,
            item.score,
            status,
            item.round,
            item.locator
        ));
    }

    report
}

/// One block per judgment, grouped under round headers
pub fn render_judgments(judgments: &[&JudgmentRecord]) -> String {
    if judgments.is_empty() {
        return "No judgments match.\n".to_string();
    }

    let mut out = String::new();
    let mut current_round = None;
    for record in judgments {
        if current_round != Some(record.round) {
            current_round = Some(record.round);
            out.push_str(&format!("--- Round {} ---\n", record.round));
        }
        out.push_str(&format!(
            "{} vs {}: winner {} ({})\n",
            record.item_a,
            record.item_b,
            record.winner_id(),
            record.winner
        ));
        out.push_str(&format!("  {}\n", record.explanation));
        out.push_str(&format!(
            "  {} | {}\n",
            record.model,
            record.timestamp.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    out
}

/// Summary of a finished run
pub fn render_outcome(outcome: &TournamentOutcome) -> String {
    let mut out = String::new();
    let reason = match outcome.termination {
        Termination::SingleSurvivor => "one item left",
        Termination::RoundsExhausted => "rounds exhausted",
    };
    out.push_str(&format!(
        "Tournament {} finished after {} round(s): {}\n",
        outcome.tournament_id, outcome.rounds_completed, reason
    ));

    match &outcome.winner {
        Some(winner) => out.push_str(&format!(
            "Winner: {} ({}) with score {:.1}\n",
            winner.id, winner.locator, winner.score
        )),
        None => out.push_str("Winner: none\n"),
    }

    if !outcome.is_complete() && outcome.survivors.len() > 1 {
        out.push_str(&format!("Survivors ({}):\n", outcome.survivors.len()));
        for item in &outcome.survivors {
            out.push_str(&format!("  {:<12} {:>8.1}  {}\n", item.id, item.score, item.locator));
        }
    }
    out.push_str(&format!("Judgments recorded: {}\n", outcome.judgments));
    out
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod report_tests;

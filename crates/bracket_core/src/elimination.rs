//! Elimination strategies
//!
//! Every strategy takes the full field and returns a field of the same
//! length and order. Only `score`, `round` and `eliminated` of items that
//! were active on input may change; eliminated items pass through untouched.
//!
//! Ranking uses a stable descending sort on score with no secondary key, so
//! among equal scores the item that comes first in the input ranks higher.
//!
//! A lone active item is never eliminated.

use rand::seq::SliceRandom;
use rand::RngCore;
use tracing::debug;

use crate::config::{Algorithm, TournamentConfig};
use crate::item::{by_score_desc, Item};
use crate::rating::update_ratings;

/// Synthetic pairing sub-rounds the Elo strategy runs before cutting
pub const ELO_CONVERGENCE_ROUNDS: usize = 10;

/// Trait implemented by all elimination strategies.
pub trait Eliminator {
    fn name(&self) -> &str;

    /// Apply one round of elimination.
    ///
    /// Items cut this round get `eliminated = true` and `round = round`;
    /// survivors get `round = round`.
    fn apply(
        &self,
        items: &[Item],
        config: &TournamentConfig,
        round: u32,
        rng: &mut dyn RngCore,
    ) -> Vec<Item>;
}

impl Algorithm {
    pub fn eliminator(&self) -> Box<dyn Eliminator> {
        match self {
            Algorithm::Pairwise => Box::new(Pairwise),
            Algorithm::Nwise => Box::new(Nwise),
            Algorithm::Elo => Box::new(EloRated),
        }
    }
}

/// Cut the bottom fraction of the whole active field by score.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pairwise;

/// Cut the bottom of each consecutive batch of active items.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nwise;

/// Let scores settle through synthetic Elo matches, then cut like [`Pairwise`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EloRated;

impl Eliminator for Pairwise {
    fn name(&self) -> &str {
        "pairwise"
    }

    fn apply(
        &self,
        items: &[Item],
        config: &TournamentConfig,
        round: u32,
        _rng: &mut dyn RngCore,
    ) -> Vec<Item> {
        let mut field = items.to_vec();
        let mut active = active_indices(&field);
        if active.is_empty() {
            return field;
        }

        rank(&field, &mut active);
        let cut = cut_count(active.len(), config.effective_elimination_rate());
        settle(&mut field, &active, cut, round);
        field
    }
}

impl Eliminator for Nwise {
    fn name(&self) -> &str {
        "nwise"
    }

    fn apply(
        &self,
        items: &[Item],
        config: &TournamentConfig,
        round: u32,
        _rng: &mut dyn RngCore,
    ) -> Vec<Item> {
        let mut field = items.to_vec();
        let active = active_indices(&field);
        if active.is_empty() {
            return field;
        }

        let rate = config.effective_elimination_rate();
        let batch_size = config.effective_batch_size().max(1);
        for (index, chunk) in active.chunks(batch_size).enumerate() {
            let mut batch = chunk.to_vec();
            rank(&field, &mut batch);
            // A short trailing batch of one still loses its member.
            let trailing_singleton = index > 0 && batch.len() == 1 && batch_size > 1;
            let cut = if trailing_singleton {
                1
            } else {
                batch_cut_count(batch.len(), rate)
            };
            settle(&mut field, &batch, cut, round);
        }
        field
    }
}

impl Eliminator for EloRated {
    fn name(&self) -> &str {
        "elo"
    }

    fn apply(
        &self,
        items: &[Item],
        config: &TournamentConfig,
        round: u32,
        rng: &mut dyn RngCore,
    ) -> Vec<Item> {
        let mut field = items.to_vec();
        let mut active = active_indices(&field);
        if active.is_empty() {
            return field;
        }

        // Churn a scoped copy of the active scores, then merge back.
        let mut scores: Vec<f64> = active.iter().map(|&i| field[i].score).collect();
        converge(&mut scores, rng);
        for (&index, &score) in active.iter().zip(&scores) {
            field[index].score = score;
        }

        rank(&field, &mut active);
        let cut = cut_count(active.len(), config.effective_elimination_rate());
        settle(&mut field, &active, cut, round);
        field
    }
}

/// Run the synthetic sub-rounds: shuffle, pair neighbours, and let the
/// higher score win each pair. Updates compound across sub-rounds.
fn converge(scores: &mut [f64], rng: &mut dyn RngCore) {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    for _ in 0..ELO_CONVERGENCE_ROUNDS {
        order.shuffle(rng);
        for pair in order.chunks_exact(2) {
            let (first, second) = (pair[0], pair[1]);
            // Ties go to the second item of the pair
            let (winner, loser) = if scores[first] > scores[second] {
                (first, second)
            } else {
                (second, first)
            };
            let (new_winner, new_loser) = update_ratings(scores[winner], scores[loser]);
            scores[winner] = new_winner;
            scores[loser] = new_loser;
        }
    }
}

fn active_indices(items: &[Item]) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_active())
        .map(|(index, _)| index)
        .collect()
}

/// Stable sort of `indices` by descending score.
fn rank(items: &[Item], indices: &mut [usize]) {
    indices.sort_by(|&a, &b| by_score_desc(items[a].score, items[b].score));
}

/// `floor(n * rate)`; a singleton field loses nothing.
fn cut_count(n: usize, rate: f64) -> usize {
    if n <= 1 {
        return 0;
    }
    ((n as f64 * rate).floor() as usize).min(n)
}

/// At least one per batch, but never the whole batch.
fn batch_cut_count(len: usize, rate: f64) -> usize {
    let raw = (len as f64 * rate).floor() as usize;
    raw.max(1).min(len.saturating_sub(1))
}

/// Advance the top `ranked.len() - cut` and eliminate the rest.
fn settle(items: &mut [Item], ranked: &[usize], cut: usize, round: u32) {
    let keep = ranked.len() - cut;
    for &index in &ranked[..keep] {
        items[index].advance(round);
    }
    for &index in &ranked[keep..] {
        debug!(item = %items[index].id, score = items[index].score, round, "eliminated");
        items[index].eliminate(round);
    }
}

#[cfg(test)]
#[path = "elimination_tests.rs"]
mod elimination_tests;

//! Round-by-round tournament controller
//!
//! ```text
//! Initializing -> RoundActive(n) -> RoundActionsComplete(n) -> RoundActive(n+1) -> ... -> Terminal
//! ```
//!
//! Each round draws random pairs of active items, asks the judge about each
//! pair, folds the verdicts into Elo scores, hands the field to the
//! configured elimination strategy and records a snapshot. Comparisons run
//! one at a time, so every score update sees all earlier ones.

use bracket_core::{
    active_count, survivors, update_ratings, Eliminator, Item, ItemSource, Judge, JudgeAdapter,
    JudgmentRecord, RoundSnapshot, Side, TournamentConfig,
};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::TournamentError;
use crate::store::SnapshotStore;

/// Upper bound on judge calls per round
pub const MAX_COMPARISONS_PER_ROUND: usize = 10;

/// Seed for a run that starts after `completed_round`. Round 0 keeps the
/// configured seed.
pub(crate) fn round_seed(seed: u64, completed_round: u32) -> u64 {
    seed ^ u64::from(completed_round).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// How a run behaves, independent of the tournament config
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Skip judging and persistence; only the elimination strategy runs
    pub dry_run: bool,
    /// Continue from the latest stored round of the same tournament id
    pub resume: bool,
}

/// Where the controller is in its lifecycle.
///
/// After initialization the controller sits in `RoundActionsComplete` for
/// the last completed round, which is 0 for a fresh tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    RoundActive(u32),
    RoundActionsComplete(u32),
    Terminal(Termination),
}

/// Why a tournament stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// At most one active item remained
    SingleSurvivor,
    /// The configured rounds ran out with several items still active
    RoundsExhausted,
}

/// What happened in one round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    pub round: u32,
    pub active_before: usize,
    /// Judge calls actually made (draws of the same item twice are skipped)
    pub comparisons: usize,
    pub fallbacks: usize,
    pub eliminated: usize,
    pub persisted: bool,
}

/// Final result of a run
#[derive(Debug, Clone, PartialEq)]
pub struct TournamentOutcome {
    pub tournament_id: String,
    pub termination: Termination,
    pub rounds_completed: u32,
    /// Highest-scored survivor
    pub winner: Option<Item>,
    /// Active items, highest score first
    pub survivors: Vec<Item>,
    pub judgments: usize,
}

impl TournamentOutcome {
    /// True when the tournament narrowed down to a single item
    pub fn is_complete(&self) -> bool {
        self.survivors.len() == 1
    }
}

/// Runs one tournament against a snapshot store.
pub struct Tournament<S> {
    config: TournamentConfig,
    tournament_id: String,
    options: RunOptions,
    store: S,
    judge: Option<JudgeAdapter<Box<dyn Judge>>>,
    eliminator: Box<dyn Eliminator>,
    rng: StdRng,
    items: Vec<Item>,
    judgments: Vec<JudgmentRecord>,
    completed_round: u32,
    phase: Phase,
}

impl<S: SnapshotStore> Tournament<S> {
    /// Validate the configuration and set up a controller.
    ///
    /// Nothing is read or written yet; call [`Tournament::initialize`] next.
    pub fn new(
        mut config: TournamentConfig,
        store: S,
        judge: Option<Box<dyn Judge>>,
        options: RunOptions,
    ) -> Result<Self, TournamentError> {
        config.validate()?;
        if judge.is_none() && !options.dry_run {
            return Err(TournamentError::MissingJudge);
        }

        let tournament_id = config.ensure_tournament_id(Utc::now()).to_string();
        let seed = match config.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random();
                info!(seed, "no seed configured, drew one");
                config.seed = Some(seed);
                seed
            }
        };

        let eliminator = config.algorithm.eliminator();
        let mut tournament = Self {
            config,
            tournament_id,
            options,
            store,
            judge: judge.map(|judge| JudgeAdapter::new(judge, 0)),
            eliminator,
            rng: StdRng::seed_from_u64(seed),
            items: Vec::new(),
            judgments: Vec::new(),
            completed_round: 0,
            phase: Phase::Initializing,
        };
        tournament.seed_rng(0);
        Ok(tournament)
    }

    /// Load the field: from the latest snapshot when resuming, otherwise
    /// fresh from `sources`. An unreadable snapshot falls back to a fresh
    /// start.
    pub fn initialize(&mut self, sources: &[ItemSource]) -> Result<(), TournamentError> {
        if self.phase != Phase::Initializing {
            return Err(TournamentError::AlreadyInitialized);
        }

        if self.options.resume {
            match self.store.load_latest(&self.tournament_id) {
                Ok(Some(snapshot)) => {
                    info!(
                        tournament = %self.tournament_id,
                        round = snapshot.round,
                        judgments = snapshot.judgments.len(),
                        "resuming tournament"
                    );
                    self.items = snapshot.items;
                    self.judgments = snapshot.judgments;
                    self.completed_round = snapshot.round;
                    self.seed_rng(self.completed_round);
                    self.phase = Phase::RoundActionsComplete(self.completed_round);
                    return Ok(());
                }
                Ok(None) => info!(tournament = %self.tournament_id, "no stored rounds, starting fresh"),
                Err(e) => warn!(
                    tournament = %self.tournament_id,
                    error = %e,
                    "could not load snapshot, starting fresh"
                ),
            }
        }

        if sources.is_empty() {
            return Err(TournamentError::NoItems);
        }
        self.items = Item::from_sources(sources);
        self.judgments.clear();
        self.completed_round = 0;
        self.phase = Phase::RoundActionsComplete(0);
        info!(
            tournament = %self.tournament_id,
            items = self.items.len(),
            algorithm = %self.config.algorithm,
            "starting tournament"
        );
        Ok(())
    }

    /// Play the next round.
    ///
    /// Returns `None` once the tournament has reached a terminal state.
    pub fn step(&mut self) -> Result<Option<RoundSummary>, TournamentError> {
        match self.phase {
            Phase::Initializing => return Err(TournamentError::NotInitialized),
            Phase::RoundActive(round) => return Err(TournamentError::Interrupted(round)),
            Phase::Terminal(_) => return Ok(None),
            Phase::RoundActionsComplete(_) => {}
        }

        let active_before = active_count(&self.items);
        if active_before <= 1 {
            self.phase = Phase::Terminal(Termination::SingleSurvivor);
            info!(round = self.completed_round, "one item left, tournament complete");
            return Ok(None);
        }

        let round = self.completed_round + 1;
        if round > self.config.rounds {
            self.phase = Phase::Terminal(Termination::RoundsExhausted);
            info!(survivors = active_before, "configured rounds exhausted");
            return Ok(None);
        }

        self.phase = Phase::RoundActive(round);
        info!(round, active = active_before, "round started");

        let (comparisons, fallbacks) = if self.options.dry_run {
            (0, 0)
        } else {
            self.gather_judgments(round)?
        };

        self.items = self
            .eliminator
            .apply(&self.items, &self.config, round, &mut self.rng);
        let eliminated = self
            .items
            .iter()
            .filter(|item| item.eliminated && item.round == round)
            .count();
        info!(round, eliminated, strategy = self.eliminator.name(), "eliminations applied");

        self.phase = Phase::RoundActionsComplete(round);
        self.completed_round = round;

        let persisted = !self.options.dry_run;
        if persisted {
            let snapshot = self.snapshot();
            self.store.save(&snapshot)?;
        }

        Ok(Some(RoundSummary {
            round,
            active_before,
            comparisons,
            fallbacks,
            eliminated,
            persisted,
        }))
    }

    /// Play rounds until the tournament is terminal.
    pub fn run(&mut self) -> Result<TournamentOutcome, TournamentError> {
        while self.step()?.is_some() {}
        self.outcome().ok_or(TournamentError::NotInitialized)
    }

    /// Result of the run, once terminal
    pub fn outcome(&self) -> Option<TournamentOutcome> {
        let Phase::Terminal(termination) = self.phase else {
            return None;
        };
        let survivors: Vec<Item> = survivors(&self.items).into_iter().cloned().collect();
        Some(TournamentOutcome {
            tournament_id: self.tournament_id.clone(),
            termination,
            rounds_completed: self.completed_round,
            winner: survivors.first().cloned(),
            survivors,
            judgments: self.judgments.len(),
        })
    }

    /// Current state as a snapshot of the last completed round
    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            tournament_id: self.tournament_id.clone(),
            round: self.completed_round,
            timestamp: Utc::now(),
            config: self.config.clone(),
            items: self.items.clone(),
            judgments: self.judgments.clone(),
        }
    }

    pub fn tournament_id(&self) -> &str {
        &self.tournament_id
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn judgments(&self) -> &[JudgmentRecord] {
        &self.judgments
    }

    pub fn completed_round(&self) -> u32 {
        self.completed_round
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reset the comparison and fallback streams so a resumed run does not
    /// replay the draws of its first rounds.
    fn seed_rng(&mut self, completed_round: u32) {
        let seed = round_seed(self.config.seed.unwrap_or_default(), completed_round);
        self.rng = StdRng::seed_from_u64(seed);
        let fallback_seed = self.rng.next_u64();
        if let Some(judge) = self.judge.as_mut() {
            judge.reseed(fallback_seed);
        }
    }

    /// Judge up to `min(10, 2 * active)` random pairs and apply each
    /// verdict to the scores before the next draw.
    fn gather_judgments(&mut self, round: u32) -> Result<(usize, usize), TournamentError> {
        let Some(judge) = self.judge.as_mut() else {
            return Err(TournamentError::MissingJudge);
        };

        let active: Vec<usize> = (0..self.items.len())
            .filter(|&i| self.items[i].is_active())
            .collect();
        let budget = MAX_COMPARISONS_PER_ROUND.min(active.len() * 2);

        let mut comparisons = 0;
        let mut fallbacks = 0;
        for _ in 0..budget {
            let a = active[self.rng.gen_range(0..active.len())];
            let b = active[self.rng.gen_range(0..active.len())];
            if a == b {
                debug!(item = %self.items[a].id, "drew the same item twice, skipping");
                continue;
            }

            let outcome = judge.judge(&self.items[a], &self.items[b], &self.config.model, round)?;
            if outcome.is_fallback() {
                fallbacks += 1;
            }
            let verdict = outcome.into_verdict();

            let (winner, loser) = match verdict.winner {
                Side::A => (a, b),
                Side::B => (b, a),
            };
            let (winner_score, loser_score) =
                update_ratings(self.items[winner].score, self.items[loser].score);
            self.items[winner].score = winner_score;
            self.items[loser].score = loser_score;

            info!(
                round,
                winner = %self.items[winner].id,
                loser = %self.items[loser].id,
                rationale = %verdict.rationale,
                "comparison judged"
            );
            let sequence = self.judgments.len();
            self.judgments.push(JudgmentRecord::new(
                &self.items[a],
                &self.items[b],
                verdict,
                sequence,
            ));
            comparisons += 1;
        }

        Ok((comparisons, fallbacks))
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;

//! Random Photo Judge
//!
//! A judge that picks the winner of each comparison uniformly at random.
//! Useful for:
//! - Running whole tournaments offline, without credentials
//! - Baseline comparisons (a real judge's rankings should differ from noise)
//! - Stress testing the round loop and persistence

use bracket_core::{Item, Judge, JudgeError, Judgment, Side};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};


/// Rationale attached to every random judgment
pub const RANDOM_EXPLANATION: &str = "Picked at random";

/// A judge that flips a coin.
///
/// Seeded, so a tournament run with the same seed and inputs repeats exactly.
#[derive(Debug, Clone)]
pub struct RandomJudge {
    rng: StdRng,
    comparisons: u64,
}

impl RandomJudge {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            comparisons: 0,
        }
    }

    /// Number of comparisons judged so far
    pub fn comparisons(&self) -> u64 {
        self.comparisons
    }
}

impl Default for RandomJudge {
    fn default() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            comparisons: 0,
        }
    }
}

impl Judge for RandomJudge {
    fn judge(&mut self, _a: &Item, _b: &Item, _model: &str) -> Result<Judgment, JudgeError> {
        self.comparisons += 1;
        let winner = if self.rng.gen_bool(0.5) { Side::A } else { Side::B };
        Ok(Judgment::new(winner, RANDOM_EXPLANATION))
    }

    fn name(&self) -> &str {
        "Random v1.0"
    }
}

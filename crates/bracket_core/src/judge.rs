//! The judge contract and the fallback policy around it
//!
//! A [`Judge`] compares two items and names a winner. Real judges talk to a
//! remote model and fail in all the usual ways, so the controller never calls
//! one directly: it goes through a [`JudgeAdapter`], which turns every
//! non-fatal failure into a coin-flip verdict. Only missing credentials
//! escape the adapter, since no later call could succeed either.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

use crate::item::Item;
use crate::verdict::{Judgment, Side, Verdict};

/// Rationale attached to every fallback verdict
pub const FALLBACK_RATIONALE: &str = "Random fallback due to judge error";

#[derive(Debug, Error)]
pub enum JudgeError {
    /// Fatal: the judge cannot be called at all
    #[error("missing credentials: {0} is not set")]
    MissingCredentials(&'static str),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("judge returned HTTP status {0}")]
    Status(u16),

    #[error("malformed judge response: {0}")]
    MalformedResponse(String),

    #[error("invalid winner '{0}' in judge response")]
    InvalidWinner(String),

    #[error("judge response has an empty explanation")]
    EmptyRationale,

    #[error("failed to read item content {path}: {source}")]
    Content {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl JudgeError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, JudgeError::MissingCredentials(_))
    }
}

/// Trait implemented by every judge (remote model, random baseline, test doubles).
pub trait Judge {
    /// Compare `a` against `b` under `model`.
    fn judge(&mut self, a: &Item, b: &Item, model: &str) -> Result<Judgment, JudgeError>;

    /// Human-readable judge name for logs and reports
    fn name(&self) -> &str;
}

impl<J: Judge + ?Sized> Judge for Box<J> {
    fn judge(&mut self, a: &Item, b: &Item, model: &str) -> Result<Judgment, JudgeError> {
        (**self).judge(a, b, model)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Result of one adapted comparison.
///
/// Both variants carry a structurally valid verdict; the distinction exists
/// so callers can count and log fallbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum JudgeOutcome {
    Judged(Verdict),
    Fallback { verdict: Verdict, reason: String },
}

impl JudgeOutcome {
    pub fn verdict(&self) -> &Verdict {
        match self {
            JudgeOutcome::Judged(verdict) => verdict,
            JudgeOutcome::Fallback { verdict, .. } => verdict,
        }
    }

    pub fn into_verdict(self) -> Verdict {
        match self {
            JudgeOutcome::Judged(verdict) => verdict,
            JudgeOutcome::Fallback { verdict, .. } => verdict,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, JudgeOutcome::Fallback { .. })
    }
}

/// Wraps a judge with the availability policy: every answer that comes back
/// is a valid verdict, whatever happened on the way.
pub struct JudgeAdapter<J> {
    judge: J,
    rng: StdRng,
}

impl<J: Judge> JudgeAdapter<J> {
    /// `seed` drives the coin flips of fallback verdicts.
    pub fn new(judge: J, seed: u64) -> Self {
        Self {
            judge,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Restart the fallback coin flips from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn judge_name(&self) -> &str {
        self.judge.name()
    }

    /// Judge `a` against `b` during `round`.
    ///
    /// Errors only with [`JudgeError::MissingCredentials`]; everything else
    /// becomes [`JudgeOutcome::Fallback`].
    pub fn judge(
        &mut self,
        a: &Item,
        b: &Item,
        model: &str,
        round: u32,
    ) -> Result<JudgeOutcome, JudgeError> {
        let result = self
            .judge
            .judge(a, b, model)
            .and_then(|judgment| {
                if judgment.explanation.trim().is_empty() {
                    Err(JudgeError::EmptyRationale)
                } else {
                    Ok(judgment)
                }
            });

        match result {
            Ok(judgment) => {
                debug!(a = %a.id, b = %b.id, winner = %judgment.winner, "judged");
                Ok(JudgeOutcome::Judged(Verdict {
                    winner: judgment.winner,
                    rationale: judgment.explanation,
                    timestamp: Utc::now(),
                    round,
                    model: model.to_string(),
                }))
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                warn!(a = %a.id, b = %b.id, error = %err, "judge failed, using random fallback");
                let winner = if self.rng.gen_bool(0.5) { Side::A } else { Side::B };
                Ok(JudgeOutcome::Fallback {
                    verdict: Verdict {
                        winner,
                        rationale: FALLBACK_RATIONALE.to_string(),
                        timestamp: Utc::now(),
                        round,
                        model: model.to_string(),
                    },
                    reason: err.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "judge_tests.rs"]
mod judge_tests;

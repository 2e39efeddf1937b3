//! Elo rating calculation

/// Starting score for every entrant
pub const DEFAULT_SCORE: f64 = 1000.0;

/// K-factor for Elo updates (higher = more volatile)
pub const K_FACTOR: f64 = 32.0;

/// Expected score of `rating` against `opponent` on the logistic curve
/// (base 10, divisor 400).
pub fn expected_score(rating: f64, opponent: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((opponent - rating) / 400.0))
}

/// Update a winner/loser pair with the default K-factor.
///
/// Returns `(new_winner_score, new_loser_score)`.
pub fn update_ratings(winner_score: f64, loser_score: f64) -> (f64, f64) {
    update_ratings_with_k(winner_score, loser_score, K_FACTOR)
}

/// Update a winner/loser pair with an explicit K-factor.
///
/// Each side's expectation is computed independently from its own
/// perspective and the two adjustments are applied separately, so the
/// pair's total is not conserved exactly.
pub fn update_ratings_with_k(winner_score: f64, loser_score: f64, k: f64) -> (f64, f64) {
    let expected_winner = expected_score(winner_score, loser_score);
    let expected_loser = expected_score(loser_score, winner_score);

    let new_winner = winner_score + k * (1.0 - expected_winner);
    let new_loser = loser_score + k * (0.0 - expected_loser);

    (new_winner, new_loser)
}

#[cfg(test)]
#[path = "rating_tests.rs"]
mod rating_tests;

use super::*;
use crate::store::MemorySnapshotStore;
use bracket_core::{Algorithm, JudgeError, Judgment, FALLBACK_RATIONALE};
use random_judge::RandomJudge;
use std::collections::HashSet;

fn sources(n: usize) -> Vec<ItemSource> {
    (0..n)
        .map(|i| ItemSource::new(format!("./photos/photo-{}.jpg", i)))
        .collect()
}

fn config(algorithm: Algorithm, rounds: u32, rate: f64) -> TournamentConfig {
    TournamentConfig {
        rounds,
        elimination_rate: Some(rate),
        tournament_id: Some("test-cup".to_string()),
        seed: Some(17),
        ..TournamentConfig::new(algorithm)
    }
}

/// Always prefers the first item shown
struct AlwaysA;

impl Judge for AlwaysA {
    fn judge(&mut self, _a: &Item, _b: &Item, _model: &str) -> Result<Judgment, JudgeError> {
        Ok(Judgment::new(Side::A, "left one is better"))
    }

    fn name(&self) -> &str {
        "always-a"
    }
}

struct Unreachable;

impl Judge for Unreachable {
    fn judge(&mut self, _a: &Item, _b: &Item, _model: &str) -> Result<Judgment, JudgeError> {
        Err(JudgeError::Transport("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "unreachable"
    }
}

struct NoCredentials;

impl Judge for NoCredentials {
    fn judge(&mut self, _a: &Item, _b: &Item, _model: &str) -> Result<Judgment, JudgeError> {
        Err(JudgeError::MissingCredentials("API_KEY"))
    }

    fn name(&self) -> &str {
        "no-credentials"
    }
}

fn live() -> RunOptions {
    RunOptions::default()
}

#[test]
fn test_pairwise_runs_to_single_winner() {
    let mut store = MemorySnapshotStore::new();
    let mut tournament = Tournament::new(
        config(Algorithm::Pairwise, 5, 0.5),
        &mut store,
        Some(Box::new(RandomJudge::new(3))),
        live(),
    )
    .unwrap();
    tournament.initialize(&sources(8)).unwrap();

    let mut actives = Vec::new();
    while let Some(summary) = tournament.step().unwrap() {
        assert!(summary.persisted);
        assert!(summary.comparisons <= MAX_COMPARISONS_PER_ROUND);
        actives.push(summary.active_before);
    }
    assert_eq!(actives, vec![8, 4, 2]);

    let outcome = tournament.outcome().unwrap();
    assert_eq!(outcome.termination, Termination::SingleSurvivor);
    assert!(outcome.is_complete());
    assert_eq!(outcome.rounds_completed, 3);
    assert_eq!(outcome.winner.as_ref(), outcome.survivors.first());
    assert_eq!(outcome.judgments, tournament.judgments().len());
    drop(tournament);

    assert_eq!(store.latest_round("test-cup").unwrap(), Some(3));
    assert_eq!(store.len(), 3);
}

#[test]
fn test_rounds_exhausted_reports_best_survivor() {
    let mut tournament = Tournament::new(
        config(Algorithm::Pairwise, 1, 0.5),
        MemorySnapshotStore::new(),
        Some(Box::new(RandomJudge::new(5))),
        live(),
    )
    .unwrap();
    tournament.initialize(&sources(8)).unwrap();

    let outcome = tournament.run().unwrap();

    assert_eq!(outcome.termination, Termination::RoundsExhausted);
    assert!(!outcome.is_complete());
    assert_eq!(outcome.survivors.len(), 4);
    let best = outcome
        .survivors
        .iter()
        .map(|item| item.score)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(outcome.winner.unwrap().score, best);
    assert_eq!(tournament.phase(), Phase::Terminal(Termination::RoundsExhausted));
}

#[test]
fn test_single_item_terminates_immediately() {
    let mut tournament = Tournament::new(
        config(Algorithm::Elo, 3, 0.3),
        MemorySnapshotStore::new(),
        Some(Box::new(AlwaysA)),
        live(),
    )
    .unwrap();
    tournament.initialize(&sources(1)).unwrap();

    let outcome = tournament.run().unwrap();

    assert_eq!(outcome.termination, Termination::SingleSurvivor);
    assert_eq!(outcome.rounds_completed, 0);
    assert_eq!(outcome.winner.unwrap().id, "item-0");
    assert!(tournament.store().is_empty());
}

#[test]
fn test_dry_run_skips_judging_and_persistence() {
    let mut tournament = Tournament::new(
        config(Algorithm::Nwise, 2, 0.25),
        MemorySnapshotStore::new(),
        None,
        RunOptions {
            dry_run: true,
            resume: false,
        },
    )
    .unwrap();
    tournament.initialize(&sources(8)).unwrap();

    let summary = tournament.step().unwrap().unwrap();
    assert_eq!(summary.comparisons, 0);
    assert_eq!(summary.eliminated, 2);
    assert!(!summary.persisted);

    tournament.run().unwrap();
    assert!(tournament.judgments().is_empty());
    assert!(tournament.store().is_empty());
    assert!(tournament.items().iter().all(|item| item.score == 1000.0));
}

#[test]
fn test_live_run_requires_a_judge() {
    let result = Tournament::new(
        config(Algorithm::Pairwise, 2, 0.5),
        MemorySnapshotStore::new(),
        None,
        live(),
    );
    assert!(matches!(result, Err(TournamentError::MissingJudge)));
}

#[test]
fn test_invalid_config_is_rejected_up_front() {
    let bad = config(Algorithm::Pairwise, 0, 0.5);
    let mut store = MemorySnapshotStore::new();

    let result = Tournament::new(bad, &mut store, Some(Box::new(AlwaysA)), live());

    assert!(matches!(result, Err(TournamentError::Config(_))));
    drop(result);
    assert!(store.is_empty());
}

#[test]
fn test_generated_id_and_seed_are_recorded() {
    let config = TournamentConfig {
        rounds: 1,
        ..TournamentConfig::new(Algorithm::Pairwise)
    };
    let tournament =
        Tournament::new(config, MemorySnapshotStore::new(), Some(Box::new(AlwaysA)), live())
            .unwrap();

    assert!(tournament.tournament_id().starts_with("tournament-pairwise-"));
    assert!(tournament.config().seed.is_some());
    assert_eq!(
        tournament.config().tournament_id.as_deref(),
        Some(tournament.tournament_id())
    );
}

#[test]
fn test_lifecycle_errors() {
    let mut tournament = Tournament::new(
        config(Algorithm::Pairwise, 2, 0.5),
        MemorySnapshotStore::new(),
        Some(Box::new(AlwaysA)),
        live(),
    )
    .unwrap();

    assert!(matches!(tournament.step(), Err(TournamentError::NotInitialized)));
    assert!(matches!(tournament.initialize(&[]), Err(TournamentError::NoItems)));

    tournament.initialize(&sources(4)).unwrap();
    assert_eq!(tournament.phase(), Phase::RoundActionsComplete(0));
    assert!(matches!(
        tournament.initialize(&sources(4)),
        Err(TournamentError::AlreadyInitialized)
    ));
}

#[test]
fn test_failing_judge_yields_fallback_verdicts() {
    let mut tournament = Tournament::new(
        config(Algorithm::Pairwise, 1, 0.5),
        MemorySnapshotStore::new(),
        Some(Box::new(Unreachable)),
        live(),
    )
    .unwrap();
    tournament.initialize(&sources(6)).unwrap();

    let summary = tournament.step().unwrap().unwrap();

    assert_eq!(summary.fallbacks, summary.comparisons);
    assert_eq!(tournament.judgments().len(), summary.comparisons);
    for record in tournament.judgments() {
        assert!(matches!(record.winner, Side::A | Side::B));
        assert_eq!(record.explanation, FALLBACK_RATIONALE);
        assert_eq!(record.round, 1);
    }
}

#[test]
fn test_missing_credentials_abort_the_round() {
    let mut store = MemorySnapshotStore::new();
    let mut tournament = Tournament::new(
        config(Algorithm::Pairwise, 2, 0.5),
        &mut store,
        Some(Box::new(NoCredentials)),
        live(),
    )
    .unwrap();
    tournament.initialize(&sources(6)).unwrap();

    assert!(matches!(
        tournament.step(),
        Err(TournamentError::Judge(JudgeError::MissingCredentials(_)))
    ));
    assert!(matches!(tournament.step(), Err(TournamentError::Interrupted(1))));
    drop(tournament);
    assert!(store.is_empty());
}

#[test]
fn test_verdicts_move_scores_before_elimination() {
    let mut tournament = Tournament::new(
        config(Algorithm::Pairwise, 1, 0.5),
        MemorySnapshotStore::new(),
        Some(Box::new(AlwaysA)),
        live(),
    )
    .unwrap();
    tournament.initialize(&sources(5)).unwrap();

    tournament.step().unwrap();

    let judged: HashSet<&str> = tournament
        .judgments()
        .iter()
        .flat_map(|record| [record.item_a.as_str(), record.item_b.as_str()])
        .collect();
    for item in tournament.items() {
        if judged.contains(item.id.as_str()) {
            assert_ne!(item.score, 1000.0, "{} was judged but kept its score", item.id);
        } else {
            assert_eq!(item.score, 1000.0);
        }
    }
    for record in tournament.judgments() {
        assert_eq!(record.winner, Side::A);
        assert_eq!(record.winner_id(), record.item_a);
        assert_ne!(record.item_a, record.item_b);
        assert_eq!(record.model, tournament.config().model);
    }
}

#[test]
fn test_comparison_budget_scales_with_field() {
    let mut small = Tournament::new(
        config(Algorithm::Pairwise, 1, 0.5),
        MemorySnapshotStore::new(),
        Some(Box::new(AlwaysA)),
        live(),
    )
    .unwrap();
    small.initialize(&sources(2)).unwrap();
    assert!(small.step().unwrap().unwrap().comparisons <= 4);

    let mut large = Tournament::new(
        config(Algorithm::Pairwise, 1, 0.5),
        MemorySnapshotStore::new(),
        Some(Box::new(AlwaysA)),
        live(),
    )
    .unwrap();
    large.initialize(&sources(30)).unwrap();
    assert!(large.step().unwrap().unwrap().comparisons <= MAX_COMPARISONS_PER_ROUND);
}

#[test]
fn test_eliminated_items_are_never_judged_again() {
    let mut tournament = Tournament::new(
        config(Algorithm::Elo, 4, 0.5),
        MemorySnapshotStore::new(),
        Some(Box::new(RandomJudge::new(11))),
        live(),
    )
    .unwrap();
    tournament.initialize(&sources(12)).unwrap();
    tournament.run().unwrap();

    for record in tournament.judgments() {
        for id in [&record.item_a, &record.item_b] {
            let item = tournament
                .items()
                .iter()
                .find(|item| &item.id == id)
                .unwrap();
            if item.eliminated {
                assert!(
                    record.round <= item.round,
                    "{} judged in round {} after elimination in round {}",
                    id,
                    record.round,
                    item.round
                );
            }
        }
    }
}

#[test]
fn test_same_seed_replays_identically() {
    let play = || {
        let mut tournament = Tournament::new(
            config(Algorithm::Elo, 3, 0.3),
            MemorySnapshotStore::new(),
            Some(Box::new(RandomJudge::new(8))),
            live(),
        )
        .unwrap();
        tournament.initialize(&sources(10)).unwrap();
        tournament.run().unwrap();
        tournament.items().to_vec()
    };

    assert_eq!(play(), play());
}

#[test]
fn test_resume_continues_after_last_round() {
    let mut store = MemorySnapshotStore::new();
    {
        let mut first = Tournament::new(
            config(Algorithm::Pairwise, 1, 0.5),
            &mut store,
            Some(Box::new(RandomJudge::new(1))),
            live(),
        )
        .unwrap();
        first.initialize(&sources(16)).unwrap();
        first.run().unwrap();
    }
    let saved = store.load_latest("test-cup").unwrap().unwrap();
    assert_eq!(saved.round, 1);

    let mut resumed = Tournament::new(
        config(Algorithm::Pairwise, 3, 0.5),
        &mut store,
        Some(Box::new(RandomJudge::new(2))),
        RunOptions {
            dry_run: false,
            resume: true,
        },
    )
    .unwrap();
    resumed.initialize(&[]).unwrap();

    assert_eq!(resumed.completed_round(), 1);
    assert_eq!(resumed.items(), saved.items.as_slice());
    assert_eq!(resumed.judgments().len(), saved.judgments.len());

    let summary = resumed.step().unwrap().unwrap();
    assert_eq!(summary.round, 2);
    assert_eq!(summary.active_before, 8);

    // Items eliminated in round 1 keep their round
    for item in resumed.items() {
        if saved.items.iter().any(|old| old.id == item.id && old.eliminated) {
            assert_eq!(item.round, 1);
        }
    }
    assert!(resumed.judgments().len() >= saved.judgments.len());
}

#[test]
fn test_resume_without_history_starts_fresh() {
    let mut tournament = Tournament::new(
        config(Algorithm::Pairwise, 2, 0.5),
        MemorySnapshotStore::new(),
        Some(Box::new(AlwaysA)),
        RunOptions {
            dry_run: false,
            resume: true,
        },
    )
    .unwrap();
    tournament.initialize(&sources(4)).unwrap();

    assert_eq!(tournament.completed_round(), 0);
    assert_eq!(tournament.items().len(), 4);
}

#[test]
fn test_round_seed_moves_with_resumed_round() {
    assert_eq!(round_seed(42, 0), 42);

    let seeds: HashSet<u64> = (0..50).map(|round| round_seed(42, round)).collect();
    assert_eq!(seeds.len(), 50);
}

#[test]
fn test_resumed_round_draws_differ_from_first_round() {
    // Same field and seed, stored after round 0 and then after round 1.
    let mut store = MemorySnapshotStore::new();
    let snapshot = |round: u32| RoundSnapshot {
        tournament_id: "test-cup".to_string(),
        round,
        timestamp: Utc::now(),
        config: config(Algorithm::Pairwise, 5, 0.5),
        items: Item::from_sources(&sources(12)),
        judgments: Vec::new(),
    };
    store.save(&snapshot(0)).unwrap();
    let pairs_after = |store: &mut MemorySnapshotStore| {
        let mut tournament = Tournament::new(
            config(Algorithm::Pairwise, 5, 0.5),
            store,
            Some(Box::new(AlwaysA)),
            RunOptions {
                dry_run: false,
                resume: true,
            },
        )
        .unwrap();
        tournament.initialize(&[]).unwrap();
        tournament.step().unwrap();
        tournament
            .judgments()
            .iter()
            .map(|record| (record.item_a.clone(), record.item_b.clone()))
            .collect::<Vec<_>>()
    };

    let from_start = pairs_after(&mut store);
    store.save(&snapshot(1)).unwrap();
    let from_round_one = pairs_after(&mut store);

    assert!(!from_start.is_empty());
    assert_ne!(from_start, from_round_one);
}

use super::*;
use bracket_core::{Algorithm, Item, ItemSource, Side, TournamentConfig, Verdict};
use chrono::Utc;

fn field() -> Vec<Item> {
    let mut items = Item::from_sources(&[
        ItemSource::new("photos/sunset.jpg"),
        ItemSource::new("photos/harbor.png"),
        ItemSource::new("photos/forest.jpeg"),
    ]);
    items[0].score = 1016.0;
    items[0].round = 1;
    items[1].score = 984.0;
    items[1].eliminated = true;
    items[1].round = 1;
    items[2].round = 1;
    items
}

fn record(
    items: &[Item],
    (a, b): (usize, usize),
    winner: Side,
    round: u32,
    sequence: usize,
) -> JudgmentRecord {
    JudgmentRecord::new(
        &items[a],
        &items[b],
        Verdict {
            winner,
            rationale: format!("round {} pick", round),
            timestamp: Utc::now(),
            round,
            model: "test-model".to_string(),
        },
        sequence,
    )
}

fn history(items: &[Item]) -> Vec<JudgmentRecord> {
    vec![
        record(items, (0, 1), Side::A, 1, 0),
        record(items, (2, 1), Side::A, 1, 1),
        record(items, (0, 2), Side::B, 3, 2),
    ]
}

#[test]
fn test_query_filters_by_round_and_item() {
    let items = field();
    let judgments = history(&items);

    assert_eq!(JudgmentQuery::default().select(&judgments).len(), 3);

    let round_one = JudgmentQuery {
        round: Some(1),
        item: None,
    };
    assert_eq!(round_one.select(&judgments).len(), 2);

    let harbor = JudgmentQuery {
        round: None,
        item: Some("item-1".to_string()),
    };
    assert_eq!(harbor.select(&judgments).len(), 2);

    let both = JudgmentQuery {
        round: Some(3),
        item: Some("item-1".to_string()),
    };
    assert!(both.select(&judgments).is_empty());
}

#[test]
fn test_rounds_with_judgments_are_distinct_and_sorted() {
    let items = field();
    let mut judgments = history(&items);
    judgments.reverse();

    assert_eq!(rounds_with_judgments(&judgments), vec![1, 3]);
    assert!(rounds_with_judgments(&[]).is_empty());
}

#[test]
fn test_report_lists_survivors_before_eliminated() {
    let items = field();
    let snapshot = RoundSnapshot {
        tournament_id: "spring-cup".to_string(),
        round: 1,
        timestamp: Utc::now(),
        config: TournamentConfig::new(Algorithm::Pairwise),
        judgments: history(&items),
        items,
    };

    let report = render_report(&snapshot);

    assert!(report.contains("spring-cup"));
    assert!(report.contains("Algorithm: pairwise"));
    assert!(report.contains("3 total, 2 active, 3 judgments"));
    let sunset = report.find("photos/sunset.jpg").unwrap();
    let forest = report.find("photos/forest.jpeg").unwrap();
    let harbor = report.find("photos/harbor.png").unwrap();
    assert!(sunset < forest);
    assert!(forest < harbor);
    assert!(report.contains("eliminated"));
}

#[test]
fn test_render_judgments_groups_by_round() {
    let items = field();
    let judgments = history(&items);
    let selected: Vec<&JudgmentRecord> = judgments.iter().collect();

    let out = render_judgments(&selected);

    assert_eq!(out.matches("--- Round").count(), 2);
    assert!(out.contains("item-0 vs item-1: winner item-0 (a)"));
    assert!(out.contains("item-0 vs item-2: winner item-2 (b)"));
    assert!(out.contains("round 3 pick"));
    assert_eq!(render_judgments(&[]), "No judgments match.\n");
}

#[test]
fn test_render_outcome_lists_survivors_when_undecided() {
    let items = field();
    let survivors: Vec<Item> = items.iter().filter(|i| i.is_active()).cloned().collect();
    let outcome = TournamentOutcome {
        tournament_id: "spring-cup".to_string(),
        termination: Termination::RoundsExhausted,
        rounds_completed: 1,
        winner: survivors.first().cloned(),
        survivors,
        judgments: 3,
    };

    let out = render_outcome(&outcome);

    assert!(out.contains("rounds exhausted"));
    assert!(out.contains("Winner: item-0 (photos/sunset.jpg) with score 1016.0"));
    assert!(out.contains("Survivors (2):"));

    let decided = TournamentOutcome {
        termination: Termination::SingleSurvivor,
        survivors: vec![items[0].clone()],
        ..outcome
    };
    let out = render_outcome(&decided);
    assert!(out.contains("one item left"));
    assert!(!out.contains("Survivors"));
}

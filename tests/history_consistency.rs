mod common;

use doubles_matchmaker::config::{AppConfig, PairingStrategy};
use doubles_matchmaker::history::HistoryLedger;
use doubles_matchmaker::pairing::ScheduleRequest;
use doubles_matchmaker::services::{MatchmakingService, PlayerService, RatingUpdateService, Store};

use common::{rng, store_with_active};

const RATINGS: [f64; 10] = [
    1000.0, 1100.0, 1150.0, 1200.0, 1200.0, 1250.0, 1300.0, 1350.0, 1400.0, 1500.0,
];

fn assert_replay_matches_store(store: &dyn Store) {
    let stored = store.load_ledger().unwrap();
    let replayed = HistoryLedger::replay(&store.load_all_matches().unwrap());

    assert_eq!(stored.pairings(), replayed.pairings());
    assert_eq!(stored.matchups(), replayed.matchups());
}

#[test]
fn incremental_counters_equal_a_full_replay() {
    for strategy in [PairingStrategy::WeightedSplit, PairingStrategy::GreedyDiversity] {
        let config = AppConfig::new().with_strategy(strategy);
        let (store, _) = store_with_active(&config, &RATINGS);
        let service = MatchmakingService::new(&store, &config);
        let results = RatingUpdateService::new(&store, &config);

        for (i, skill) in [false, true, false].into_iter().enumerate() {
            let request = ScheduleRequest {
                courts: 2,
                match_count: 4,
                skill_matching: skill,
            };
            let report = service.generate_round(&request, &mut rng(i as u64)).unwrap();
            assert_replay_matches_store(&store);

            // scores land between generations and feed the next one
            let (first, second) = (report.matches[0].id, report.matches[1].id);
            results.complete_match(first, 11, 7).unwrap();
            results.complete_match(second, 11, 5).unwrap();
            results.edit_match(first, 8, 11).unwrap();
            results.revert_match(second).unwrap();
            assert_replay_matches_store(&store);
        }

        assert!(service.ledger_is_consistent().unwrap());
        let matches = store.load_all_matches().unwrap();
        assert_eq!(matches.iter().filter(|m| m.is_completed).count(), 3);
        let wins: u32 = store.load_all_players().unwrap().iter().map(|p| p.wins).sum();
        assert_eq!(wins, 3 * 2);
    }
}

#[test]
fn deleting_matches_keeps_counters_consistent() {
    let config = AppConfig::new();
    let (store, _) = store_with_active(&config, &RATINGS);
    let service = MatchmakingService::new(&store, &config);
    let ratings = RatingUpdateService::new(&store, &config);

    let request = ScheduleRequest {
        courts: 2,
        match_count: 6,
        skill_matching: false,
    };
    let report = service.generate_round(&request, &mut rng(4)).unwrap();
    assert_eq!(report.matches.len(), 6);

    ratings.complete_match(report.matches[0].id, 11, 4).unwrap();
    ratings.delete_match(report.matches[0].id).unwrap();
    ratings.delete_match(report.matches[3].id).unwrap();

    assert_replay_matches_store(&store);
    assert_eq!(store.load_all_matches().unwrap().len(), 4);

    let players = store.load_all_players().unwrap();
    let total_played: u32 = players.iter().map(|p| p.matches_played).sum();
    assert_eq!(total_played, 4 * 4);
    assert!(players.iter().all(|p| p.wins == 0));
}

#[test]
fn rebuild_repairs_drifted_counters_and_keeps_byes() {
    let config = AppConfig::new();
    let (store, _) = store_with_active(&config, &RATINGS[..6]);
    let service = MatchmakingService::new(&store, &config);

    let request = ScheduleRequest {
        courts: 1,
        match_count: 2,
        skill_matching: false,
    };
    service.generate_round(&request, &mut rng(8)).unwrap();
    let byes_before = store.load_ledger().unwrap().byes().clone();

    let mut drifted = store.load_ledger().unwrap();
    drifted.increment_pairing(&[1, 6]);
    store.save_ledger(&drifted).unwrap();
    assert!(!service.ledger_is_consistent().unwrap());

    let rebuilt = service.rebuild_ledger().unwrap();
    assert!(service.ledger_is_consistent().unwrap());
    assert_eq!(rebuilt.byes(), &byes_before);
}

#[test]
fn diversity_stats_follow_the_ledger() {
    let config = AppConfig::new();
    let (store, _) = store_with_active(&config, &RATINGS[..8]);
    let service = MatchmakingService::new(&store, &config);

    let empty = service.pairing_diversity_stats().unwrap();
    assert_eq!((empty.mean, empty.std_dev, empty.fairness_score), (0.0, 0.0, 100.0));
    assert_eq!(service.most_repeated_pairing().unwrap(), None);

    let request = ScheduleRequest {
        courts: 2,
        match_count: 2,
        skill_matching: false,
    };
    service.generate_round(&request, &mut rng(12)).unwrap();

    // one round of two matches: four distinct pairs once each
    let stats = service.pairing_diversity_stats().unwrap();
    assert_eq!(stats.samples, 4);
    assert_eq!((stats.mean, stats.std_dev, stats.fairness_score), (1.0, 0.0, 100.0));
    assert_eq!(service.matchup_diversity_stats().unwrap().samples, 2);

    let summary = service.round_summary().unwrap();
    assert_eq!((summary.total_rounds, summary.completed_rounds, summary.total_matches), (1, 0, 2));
}

#[test]
fn players_in_matches_cannot_be_removed() {
    let config = AppConfig::new();
    let (store, _) = store_with_active(&config, &RATINGS[..5]);
    let players = PlayerService::new(&store, &config);
    players.toggle_rest(5).unwrap();

    MatchmakingService::new(&store, &config)
        .generate_round(
            &ScheduleRequest {
                courts: 1,
                match_count: 1,
                skill_matching: false,
            },
            &mut rng(1),
        )
        .unwrap();

    assert!(players.remove_player(1).is_err());
    assert_eq!(players.remove_player(5).unwrap().id, 5);
    assert_eq!(store.load_all_players().unwrap().len(), 4);
    assert!(players.add_player("  ", None).is_err());
    assert!(players.add_player("PLAYER1", None).is_err());
}

use crownfall_game::{
    Container, EventLog, FixedOutcome, Game, GameConfig, GameEvent, Location, Office, PlayerId,
    Priorities, Season, TerminationReason,
};

fn new_game(players: usize, seed: u64) -> Game {
    Game::new(GameConfig::with_players(players, seed), &[]).unwrap()
}

#[test]
fn six_bookkeepings_without_actions() {
    let mut game = new_game(4, 2024);
    assert_eq!(game.board().year(), 0);
    let mut seasons = vec![game.board().season()];
    let mut crises = vec![game.board().crisis_count()];
    for _ in 0..6 {
        game.bookkeeping().unwrap();
        seasons.push(game.board().season());
        crises.push(game.board().crisis_count());
    }
    assert_eq!(
        seasons,
        vec![
            Season::Summer,
            Season::Harvest,
            Season::Winter,
            Season::Summer,
            Season::Harvest,
            Season::Winter,
            Season::Summer,
        ]
    );
    assert_eq!(game.board().year(), 2);
    for pair in crises.windows(2) {
        assert!(pair[1] <= pair[0] + 1);
    }
    game.board().check_invariants().unwrap();
}

#[test]
fn fourth_prisoner_buries_the_first() {
    let mut game = new_game(2, 5);
    let prisoners: Vec<_> = game.players()[1].characters()[..3].to_vec();
    let newcomer = game.players()[1].characters()[3];
    let mut log = EventLog::new();
    for id in &prisoners {
        game.board_mut()
            .move_character(*id, Location::Dungeon, &mut log)
            .unwrap();
    }
    game.board_mut()
        .move_character(newcomer, Location::Dungeon, &mut log)
        .unwrap();

    let dungeon = game.board().dungeon();
    assert_eq!(dungeon.len(), 3);
    assert!(dungeon.contains(newcomer));
    assert!(!dungeon.contains(prisoners[0]));
    assert_eq!(
        game.board().character(prisoners[0]).unwrap().location(),
        Location::Crypt
    );
    game.board().check_invariants().unwrap();
}

#[test]
fn heir_succeeds_a_recalled_crown() {
    let mut game = new_game(3, 17);
    let crown = game.board().office_holder(Office::Crown).unwrap();
    let owner = game.board().character(crown).unwrap().owner;
    let heir_owner = PlayerId((owner.index() + 1) % 3);
    let heir = game.players()[heir_owner.index()].characters()[0];
    let mut log = EventLog::new();
    game.board_mut()
        .move_character(heir, Location::Office(Office::Heir), &mut log)
        .unwrap();
    game.bookkeeping().unwrap();
    assert_eq!(game.board().crown_ticker(), 1);

    game.board_mut()
        .move_character(crown, Location::Hand, &mut log)
        .unwrap();
    assert_eq!(game.board().office_holder(Office::Crown), Some(heir));
    assert_eq!(game.board().office_player(Office::Crown), Some(heir_owner));
    assert_eq!(game.board().crown_ticker(), 0);
    assert!(log.mentions("has succeeded to the throne"));
}

#[test]
fn fixed_success_never_takes_a_failure_branch() {
    for seed in 0..12 {
        let config = GameConfig {
            actions_per_turn: 3,
            ..GameConfig::with_players(4, seed)
        };
        let mut game = Game::new(config, &[]).unwrap().with_oracle(FixedOutcome(true));
        game.play_to_completion().unwrap();
        let failures = game.log().iter().filter(|event| {
            matches!(event, GameEvent::Player { .. })
                && (event.message().contains("died trying to take over")
                    || event.message().contains("failed to arrest"))
        });
        assert_eq!(failures.count(), 0, "seed {seed}");
    }
}

#[test]
fn full_games_keep_the_board_consistent() {
    for seed in 0..20 {
        let mut game = new_game(2 + (seed as usize % 7), seed);
        while game.end_check().is_none() {
            game.play_round().unwrap();
            game.board().check_invariants().unwrap();
            for player in game.players() {
                assert!(player.coffer().gold() >= 0);
                assert!(player.coffer().food() >= 0);
                assert!(player.coffer().prestige() >= 0);
            }
            assert!(game.board().dungeon().len() <= 3);
            assert!(game.board().campaign().len() <= 6);
        }
    }
}

#[test]
fn games_replay_from_their_seed() {
    let priorities = [
        Priorities::default(),
        Priorities::new(crownfall_game::Effects::gold(2.0)),
    ];
    let play = || {
        let mut game = Game::new(GameConfig::with_players(3, 99), &priorities).unwrap();
        game.play_to_completion().unwrap();
        game.summary().unwrap()
    };
    let first = play();
    let second = play();
    assert_eq!(first, second);
    assert!(!first.log.is_empty());
}

#[test]
fn every_game_ends_with_a_known_reason() {
    for seed in 100..130 {
        let mut game = new_game(4, seed);
        let (reason, winner) = game.play_to_completion().unwrap();
        match reason {
            TerminationReason::CrisisEnd => assert_eq!(winner, None),
            TerminationReason::FiveYears
            | TerminationReason::CrownWin
            | TerminationReason::FamilyExtinguished => {
                assert_eq!(winner, game.board().office_player(Office::Crown));
            }
        }
        let last = game.log().events().last().unwrap();
        assert!(matches!(last, GameEvent::Game { .. }));
    }
}

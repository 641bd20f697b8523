//! End-to-end run flow through the public API only.

use hullbreak_game::{
    Card, CommandError, CommandOutcome, Deck, DeckManager, GameSession, HallucinationConfig,
    InitialStats, Phase, Rank, ScenarioCatalog, ScenarioConfig, ScoreKind, Suit, standard_deck,
};

fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Baseline scenario with corruption disabled so draws are fully scripted.
fn calm_scenario() -> ScenarioConfig {
    init_test_logging();
    let mut scenario = ScenarioCatalog::default_catalog().scenarios.remove(0);
    scenario.hallucination = HallucinationConfig {
        base_chance: 0.0,
        chance_per_level: 0.0,
        ..HallucinationConfig::default()
    };
    scenario
}

fn find(suit: Suit, rank: Rank) -> Card {
    standard_deck()
        .into_iter()
        .find(|card| card.suit == suit && card.rank == rank)
        .unwrap()
}

/// Player deck whose opening draws are exactly `top`, in order.
fn stacked_decks(top: &[Card], eco_cards: Vec<Card>) -> DeckManager {
    let mut pile: Vec<Card> = standard_deck()
        .into_iter()
        .filter(|card| !top.iter().any(|t| t.id == card.id))
        .collect();
    pile.extend(top.iter().rev().cloned());
    DeckManager {
        player: Deck::new(pile),
        eco: Deck::new(eco_cards),
    }
}

fn opening_hand() -> Vec<Card> {
    vec![
        find(Suit::Spades, Rank::Five),
        find(Suit::Spades, Rank::Queen),
        find(Suit::Clubs, Rank::Seven),
        find(Suit::Hearts, Rank::Four),
        find(Suit::Diamonds, Rank::Three),
    ]
}

#[test]
fn first_turn_runs_the_documented_scenario() {
    let mut session = GameSession::with_decks(
        calm_scenario(),
        InitialStats::default(),
        stacked_decks(&opening_hand(), vec![find(Suit::Hearts, Rank::Two)]),
        42,
    );

    // Opening deal.
    let state = session.state();
    assert_eq!(state.stats.hull, 20);
    assert_eq!(state.stats.sanity, 20);
    assert_eq!(state.stats.ap, 2);
    assert_eq!(state.eco.hp, 50);
    assert_eq!(state.hand.len(), 5);
    assert_eq!(state.phase, Phase::PlayerAction);
    assert_eq!(state.turn, 1);

    // A five of Spades deals five damage and scores fifty points.
    let spade = find(Suit::Spades, Rank::Five);
    assert!(session.play_card(spade.id).accepted());
    assert_eq!(session.state().eco.hp, 45);
    assert_eq!(session.score().breakdown()[&ScoreKind::DamageDealt], 50);

    // Ending the turn hands control to the Eco; the next phase waits on the
    // settle delay of the logical clock.
    assert!(session.end_player_turn().accepted());
    assert_eq!(session.state().phase, Phase::EcoAttack);
    session.advance(599);
    assert_eq!(session.state().phase, Phase::EcoAttack);
    session.advance(1);

    // Maintenance ran: corruption rose, the hand refilled, a new turn began.
    let state = session.state();
    assert_eq!(state.phase, Phase::PlayerAction);
    assert_eq!(state.turn, 2);
    assert_eq!(state.hallucination_level, 1);
    assert_eq!(state.hand.len(), 5);
    assert_eq!(state.stats.ap, 2);
    // The Eco's two of Hearts drained one sanity.
    assert_eq!(state.stats.sanity, 19);
}

#[test]
fn exposure_amplifies_follow_up_damage() {
    let mut session = GameSession::with_decks(
        calm_scenario(),
        InitialStats::default(),
        stacked_decks(&opening_hand(), Vec::new()),
        42,
    );
    session.set_settle_delay_ms(0);

    let queen = find(Suit::Spades, Rank::Queen);
    assert!(session.play_card(queen.id).accepted());
    assert_eq!(session.state().eco.hp, 40);
    assert!(session.state().eco_exposed());

    // While exposed, five damage lands as eight.
    let five = find(Suit::Spades, Rank::Five);
    assert!(session.play_card(five.id).accepted());
    assert_eq!(session.state().eco.hp, 32);
}

#[test]
fn rapid_plays_build_a_combo() {
    let mut session = GameSession::with_decks(
        calm_scenario(),
        InitialStats::default(),
        stacked_decks(&opening_hand(), Vec::new()),
        42,
    );
    session.set_settle_delay_ms(0);

    session.play_card(find(Suit::Spades, Rank::Five).id);
    session.play_card(find(Suit::Spades, Rank::Queen).id);

    let combos: Vec<u32> = session
        .score()
        .events()
        .iter()
        .filter(|event| event.kind == ScoreKind::CardPlayed)
        .map(|event| event.combo_count)
        .collect();
    assert_eq!(combos, vec![1, 2]);
}

#[test]
fn decks_recycle_across_many_turns() {
    let mut session = GameSession::with_decks(
        calm_scenario(),
        InitialStats::default(),
        stacked_decks(&opening_hand(), Vec::new()),
        42,
    );
    session.set_settle_delay_ms(0);

    // Well past one full pass through the 52-card deck.
    for _ in 0..15 {
        assert!(session.end_player_turn().accepted());
    }
    let state = session.state();
    assert!(!state.game_over);
    assert_eq!(state.turn, 16);
    assert_eq!(state.hand.len(), 5);
}

#[test]
fn sustained_eco_pressure_ends_the_run() {
    let eco_cards = vec![
        find(Suit::Hearts, Rank::Ace),
        find(Suit::Hearts, Rank::King),
        find(Suit::Hearts, Rank::Queen),
        find(Suit::Hearts, Rank::Jack),
        find(Suit::Hearts, Rank::Ten),
    ];
    let mut session = GameSession::with_decks(
        calm_scenario(),
        InitialStats::default(),
        stacked_decks(&opening_hand(), eco_cards),
        42,
    );
    session.set_settle_delay_ms(0);

    // Court Hearts drain five or six sanity per attack.
    for _ in 0..10 {
        session.end_player_turn();
        if session.state().game_over {
            break;
        }
    }
    let state = session.state();
    assert!(state.game_over);
    assert!(!state.victory);
    assert_eq!(state.stats.sanity, 0);
    let held = state.hand.first().map(|card| card.id).unwrap();

    // The ended run absorbs every further command.
    assert_eq!(
        session.end_player_turn(),
        CommandOutcome::Rejected(CommandError::GameOver)
    );
    assert_eq!(
        session.play_card(held),
        CommandOutcome::Rejected(CommandError::GameOver)
    );
}

#[test]
fn state_listeners_observe_every_mutation() {
    use std::cell::Cell;
    use std::rc::Rc;

    let mut session = GameSession::with_decks(
        calm_scenario(),
        InitialStats::default(),
        stacked_decks(&opening_hand(), Vec::new()),
        42,
    );
    session.set_settle_delay_ms(0);

    let notifications = Rc::new(Cell::new(0u32));
    let sink = notifications.clone();
    let subscription = session.subscribe(move |_| sink.set(sink.get() + 1));

    session.play_card(find(Suit::Spades, Rank::Five).id);
    assert!(notifications.get() > 0);

    let seen = notifications.get();
    subscription.cancel();
    session.end_player_turn();
    assert_eq!(notifications.get(), seen);
}

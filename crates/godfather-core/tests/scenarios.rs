//! Whole-game scenarios driven through the public verbs, with every chat
//! message and DM captured by a recording sink.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;

use godfather_core::config::GameConfig;
use godfather_core::game::{DayOutcome, Departure, Game, GameError, Tick};
use godfather_core::ports::{MemorySink, Ports};
use godfather_core::setup::StaticSetups;
use godfather_roles::{Player, VoteError, VoteTarget};
use godfather_types::{ActionKind, ChannelId, DeathReason, Phase, User, UserId};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A started game of `p1..pN` playing the custom setup `roles`.
fn make_table(roles: &str, seed: u64) -> (Game, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let now = Utc::now();
    let mut game = Game::new(
        ChannelId(1),
        None,
        User::new(1_u64, "p1"),
        &GameConfig::default(),
        Ports::memory(&sink),
        now,
    )
    .unwrap();
    let setup = game.use_setup(roles).unwrap().clone();
    let seats = u64::try_from(setup.total_players()).unwrap();
    for i in 2..=seats {
        game.join(User::new(i, format!("p{i}"))).unwrap();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    game.start(&StaticSetups::default(), None, &mut rng, now)
        .unwrap();
    (game, sink)
}

/// Every seat holding `role`, in roster order.
fn holders(game: &Game, role: &str) -> Vec<UserId> {
    game.players()
        .iter()
        .filter(|p| p.role_name() == Some(role))
        .map(Player::id)
        .collect()
}

fn holder(game: &Game, role: &str) -> UserId {
    *holders(game, role).first().unwrap()
}

/// Living players other than `excluded`, in roster order.
fn others(game: &Game, excluded: &[UserId]) -> Vec<UserId> {
    game.players()
        .alive_ids()
        .into_iter()
        .filter(|id| !excluded.contains(id))
        .collect()
}

fn past_deadline(game: &Game) -> DateTime<Utc> {
    game.phase_end_at()
        .unwrap()
        .checked_add_signed(TimeDelta::seconds(1))
        .unwrap()
}

fn name(game: &Game, id: UserId) -> String {
    game.players().get(id).unwrap().user.name.clone()
}

// ---------------------------------------------------------------------------
// Day
// ---------------------------------------------------------------------------

#[test]
fn hammer_lynches_and_ends_the_day() {
    let (mut game, sink) = make_table("Vanilla x4, Goon", 1);
    assert_eq!((game.phase(), game.cycle()), (Phase::Day, 1));
    assert_eq!(game.players().alive_count(), 5);

    let target = holder(&game, "Vanilla");
    let voters = others(&game, &[target]);
    let now = Utc::now();
    for voter in voters.iter().take(2) {
        assert_eq!(
            game.submit_vote(*voter, target, now).unwrap(),
            DayOutcome::Counted
        );
    }
    assert_eq!(
        game.submit_vote(*voters.get(2).unwrap(), target, now).unwrap(),
        DayOutcome::Lynched { target }
    );

    let lynched = game.players().get(target).unwrap();
    assert!(!lynched.alive);
    assert_eq!(lynched.death_reason, Some(DeathReason::Lynched { cycle: 1 }));
    assert!(sink.saw(&format!(
        "{} was lynched. They were a *Town Vanilla*.",
        name(&game, target)
    )));
    assert_eq!((game.phase(), game.cycle()), (Phase::Night, 1));
    assert!(sink.saw("Night **1** will last 2.0 minutes."));
}

#[test]
fn dead_players_cannot_vote() {
    let (mut game, _) = make_table("Vanilla x4, Goon", 2);
    let vanillas = holders(&game, "Vanilla");
    let (&dead, rest) = vanillas.split_first().unwrap();
    let (&target, rest) = rest.split_first().unwrap();
    let &voter = rest.first().unwrap();
    let now = Utc::now();

    game.modkill(dead, now).unwrap();
    game.submit_vote(voter, target, now).unwrap();

    let err = game.submit_vote(dead, target, now).unwrap_err();
    assert!(matches!(
        err,
        GameError::Vote {
            source: VoteError::VoterDead(_)
        }
    ));
    assert_eq!(game.votes().votes_on(VoteTarget::Player(target)), &[voter]);
    assert_eq!(game.phase(), Phase::Day);
}

#[test]
fn replacement_keeps_the_votes_on_the_seat() {
    let (mut game, sink) = make_table("Vanilla x4, Goon", 3);
    let seat = holder(&game, "Vanilla");
    let role_before = game.players().get(seat).unwrap().role_name();
    let now = Utc::now();
    for voter in others(&game, &[seat]).into_iter().take(2) {
        game.submit_vote(voter, seat, now).unwrap();
    }

    game.sign_up_replacement(User::new(99_u64, "sub")).unwrap();
    assert_eq!(
        game.leave(seat, now).unwrap(),
        Departure::Replaced { by: UserId(99) }
    );

    assert!(game.players().get(seat).is_none());
    let sub = game.players().get(UserId(99)).unwrap();
    assert!(sub.alive);
    assert_eq!(sub.role_name(), role_before);
    assert_eq!(
        game.votes().votes_on(VoteTarget::Player(UserId(99))).len(),
        2
    );
    assert!(sink.saw(&format!("sub has replaced p{}.", seat.get())));
    assert!(
        sink.notifications_to(UserId(99))
            .iter()
            .any(|m| m.starts_with("Hello sub, you are a **Town Vanilla**."))
    );
}

#[test]
fn leaving_without_a_replacement_modkills() {
    let (mut game, sink) = make_table("Vanilla x4, Goon", 4);
    let seat = *others(&game, &[UserId(1)]).first().unwrap();
    assert!(game.leave_prompt(seat).unwrap().is_some());
    assert_eq!(game.leave(seat, Utc::now()).unwrap(), Departure::Modkilled);
    let player = game.players().get(seat).unwrap();
    assert!(!player.alive);
    assert!(matches!(
        player.death_reason,
        Some(DeathReason::Modkilled {
            phase: Phase::Day,
            cycle: 1
        })
    ));
    assert!(sink.saw("was modkilled."));
    assert!(matches!(
        game.leave(seat, Utc::now()),
        Err(GameError::DeadCannotLeave)
    ));
}

#[test]
fn no_lynch_majority_ends_the_day_quietly() {
    let (mut game, sink) = make_table("Vanilla x2, Goon", 5);
    let now = Utc::now();
    let ids = game.players().alive_ids();
    assert_eq!(
        game.submit_no_lynch(*ids.first().unwrap(), now).unwrap(),
        DayOutcome::Counted
    );
    assert_eq!(
        game.submit_no_lynch(*ids.get(1).unwrap(), now).unwrap(),
        DayOutcome::NoLynch
    );
    assert!(sink.saw("Nobody was lynched!"));
    assert_eq!((game.phase(), game.cycle()), (Phase::Night, 1));
    assert_eq!(game.players().alive_count(), 3);
}

// ---------------------------------------------------------------------------
// Night
// ---------------------------------------------------------------------------

#[test]
fn protection_outranks_the_kill() {
    let (mut game, sink) = make_table("roles: [Doctor, Goon, Vanilla x3]\nnight_start: true", 6);
    assert_eq!((game.phase(), game.cycle()), (Phase::Night, 1));

    let victim = holder(&game, "Vanilla");
    game.submit_night_action(holder(&game, "Goon"), ActionKind::Kill, vec![victim])
        .unwrap();
    game.submit_night_action(holder(&game, "Doctor"), ActionKind::Protect, vec![victim])
        .unwrap();

    assert_eq!(game.update(past_deadline(&game)), Tick::Advanced);
    assert!(game.players().get(victim).unwrap().alive);
    assert_eq!(game.players().alive_count(), 5);
    assert!(!sink.saw("died last night"));
    assert_eq!((game.phase(), game.cycle()), (Phase::Day, 2));
    assert!(sink.saw("Day **2** will last 5.0 minutes. With 5 alive, it takes 3 to lynch."));
}

#[test]
fn actions_are_rejected_outside_the_role() {
    let (mut game, _) = make_table("roles: [Doctor, Goon, Vanilla x3]\nnight_start: true", 7);
    let vanilla = holder(&game, "Vanilla");
    let goon = holder(&game, "Goon");
    assert!(matches!(
        game.submit_night_action(vanilla, ActionKind::Kill, vec![goon]),
        Err(GameError::Action { .. })
    ));
    assert!(matches!(
        game.submit_night_action(goon, ActionKind::Protect, vec![vanilla]),
        Err(GameError::Action { .. })
    ));
    game.submit_night_action(goon, ActionKind::Kill, vec![vanilla])
        .unwrap();
    assert!(game.withdraw_night_action(goon).unwrap());
    assert!(!game.withdraw_night_action(goon).unwrap());
}

// ---------------------------------------------------------------------------
// Endgame
// ---------------------------------------------------------------------------

#[test]
fn lynching_the_last_mafioso_wins_for_town() {
    let (mut game, sink) = make_table("Cop, Vanilla x3, Goon", 8);
    let goon = holder(&game, "Goon");
    let now = Utc::now();
    let voters = others(&game, &[goon]);
    for voter in voters.iter().take(3) {
        game.submit_vote(*voter, goon, now).unwrap();
    }

    assert_eq!(game.phase(), Phase::Ended);
    assert!(sink.saw("The game is over. Town wins!"));
    assert!(sink.saw("**Final Rolelist**: ```1. p1 ("));

    let outcomes = sink.outcomes();
    let outcome = outcomes.first().unwrap();
    assert_eq!(outcome.setup, "custom");
    assert_eq!(outcome.winning_faction.as_deref(), Some("Town"));
    assert!(outcome.independent_winners.is_empty());
    for result in &outcome.players {
        assert_eq!(result.won, result.user != goon, "{result:?}");
    }
}

#[test]
fn night_kill_to_parity_wins_for_mafia() {
    let (mut game, sink) = make_table("name: quick\nroles: [Vanilla x2, Goon]\nnight_start: true", 9);
    let victim = holder(&game, "Vanilla");
    game.submit_night_action(holder(&game, "Goon"), ActionKind::Kill, vec![victim])
        .unwrap();
    assert_eq!(game.update(past_deadline(&game)), Tick::Advanced);

    assert!(sink.saw(&format!(
        "{} died last night. They were a Town Vanilla.",
        name(&game, victim)
    )));
    assert!(sink.saw("The game is over. Mafia wins!"));
    assert_eq!(game.phase(), Phase::Ended);
    let outcome = sink.outcomes().into_iter().next().unwrap();
    assert_eq!(outcome.setup, "quick");
    assert_eq!(outcome.winning_faction.as_deref(), Some("Mafia"));
}

#[test]
fn three_quiet_cycles_end_in_a_draw() {
    let (mut game, sink) = make_table("Vanilla x2, Goon", 10);
    let mut passes: u32 = 0;
    while game.phase() != Phase::Ended && passes < 10 {
        assert_eq!(game.update(past_deadline(&game)), Tick::Advanced);
        passes = passes.saturating_add(1);
    }

    assert_eq!(passes, 6);
    assert!(sink.saw("Nobody was lynched"));
    assert!(sink.saw("Nobody was killed in 3 consecutive cycles. Ending game..."));
    assert!(sink.saw("The game is over. Nobody wins!"));
    let outcome = sink.outcomes().into_iter().next().unwrap();
    assert_eq!(outcome.winning_faction, None);
    assert!(outcome.players.iter().all(|p| !p.won));
}

#[test]
fn a_lynched_jester_wins_and_haunts_a_voter() {
    let (mut game, sink) = make_table("Jester, Goon, Vanilla x3", 11);
    let jester = holder(&game, "Jester");
    let goon = holder(&game, "Goon");
    let vanillas = holders(&game, "Vanilla");
    let now = Utc::now();

    let voters = [goon, *vanillas.first().unwrap(), *vanillas.get(1).unwrap()];
    for voter in voters {
        game.submit_vote(voter, jester, now).unwrap();
    }
    assert_eq!(game.phase(), Phase::Night);
    assert!(
        sink.notifications_to(jester)
            .iter()
            .any(|m| m.starts_with("You were lynched!"))
    );
    assert!(
        sink.notifications_to(jester)
            .iter()
            .any(|m| m.starts_with("It is now night 1. Use `haunt`"))
    );

    let haunted = *vanillas.first().unwrap();
    assert!(
        game.submit_night_action(jester, ActionKind::Haunt, vec![*vanillas.get(2).unwrap()])
            .is_err()
    );
    game.submit_night_action(jester, ActionKind::Haunt, vec![haunted])
        .unwrap();
    assert_eq!(game.update(past_deadline(&game)), Tick::Advanced);

    assert!(!game.players().get(haunted).unwrap().alive);
    assert!(sink.saw(&format!("{} died last night.", name(&game, haunted))));
    assert_eq!((game.phase(), game.cycle()), (Phase::Day, 2));

    // Mafia reaches parity once a second vanilla goes.
    let last = *vanillas.get(1).unwrap();
    game.modkill(last, Utc::now()).unwrap();
    assert_eq!(game.phase(), Phase::Ended);
    assert!(sink.saw("The game is over. Mafia wins!"));
    assert!(sink.saw(&format!("Independent wins: {} (Jester)", name(&game, jester))));
    let outcome = sink.outcomes().into_iter().next().unwrap();
    assert_eq!(outcome.independent_winners, vec![String::from("Jester")]);
}

#[test]
fn a_jester_can_haunt_the_replacement_of_a_voter() {
    let (mut game, sink) = make_table("Jester, Goon, Vanilla x3", 11);
    let jester = holder(&game, "Jester");
    let goon = holder(&game, "Goon");
    let vanillas: Vec<UserId> = holders(&game, "Vanilla")
        .into_iter()
        .filter(|&v| !game.is_host(v))
        .collect();
    let voter = *vanillas.first().unwrap();
    let now = Utc::now();
    for v in [goon, voter, *vanillas.get(1).unwrap()] {
        game.submit_vote(v, jester, now).unwrap();
    }
    assert_eq!(game.phase(), Phase::Night);

    let sub = UserId(99);
    game.sign_up_replacement(User::new(99_u64, "sub")).unwrap();
    assert_eq!(
        game.leave(voter, now).unwrap(),
        Departure::Replaced { by: sub }
    );

    game.submit_night_action(jester, ActionKind::Haunt, vec![sub])
        .unwrap();
    assert_eq!(game.update(past_deadline(&game)), Tick::Advanced);
    assert!(!game.players().get(sub).unwrap().alive);
    assert!(sink.saw("sub died last night."));
}

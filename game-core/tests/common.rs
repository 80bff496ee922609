#![allow(dead_code)]

use game_core::{RoomSettings, RoomStateMachine, TickOutcome, WordBank};
use game_types::{PlayerId, RoomCode};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

/// Creates a WordBank with a known set of words
pub fn create_test_bank() -> Arc<WordBank> {
    let word_list = "apple\nbanana\ndog\ncat\nhouse\ntrain\nice cream\nguitar";
    Arc::new(WordBank::from_word_list(word_list))
}

/// Creates a room owned by `creator` with a deterministic RNG
pub fn create_test_room(creator: &str, total_rounds: u32, time_per_round: u32) -> RoomStateMachine {
    RoomStateMachine::create(
        RoomCode::new("TEST23"),
        creator,
        RoomSettings::new(total_rounds, time_per_round).expect("valid settings"),
        create_test_bank(),
    )
    .expect("room creation")
    .with_rng(StdRng::seed_from_u64(2024))
}

/// Creates a room where the first name is the creator and the rest joined in order.
/// Returns player ids in join order.
pub fn create_room_with_players(
    names: &[&str],
    total_rounds: u32,
    time_per_round: u32,
) -> (RoomStateMachine, Vec<PlayerId>) {
    let mut machine = create_test_room(names[0], total_rounds, time_per_round);
    let mut ids = vec![machine.creator_id().unwrap()];
    for name in &names[1..] {
        ids.push(machine.join(name).unwrap().id);
    }
    (machine, ids)
}

/// Creates a started game and returns it with player ids in join order
pub fn create_started_game(names: &[&str], total_rounds: u32) -> (RoomStateMachine, Vec<PlayerId>) {
    let (mut machine, ids) = create_room_with_players(names, total_rounds, 30);
    machine.start_game(ids[0]).unwrap();
    (machine, ids)
}

pub fn drawer_of(machine: &RoomStateMachine) -> PlayerId {
    machine
        .room()
        .current_drawer_id
        .expect("a drawer should be assigned")
}

pub fn guessers_of(machine: &RoomStateMachine) -> Vec<PlayerId> {
    let drawer = machine.room().current_drawer_id;
    machine
        .room()
        .players
        .iter()
        .filter(|p| Some(p.id) != drawer)
        .map(|p| p.id)
        .collect()
}

/// Ticks until the round ends, returning how many ticks it took
pub fn run_out_clock(machine: &mut RoomStateMachine) -> u32 {
    let mut ticks = 0;
    loop {
        ticks += 1;
        match machine.tick() {
            TickOutcome::RoundEnded => return ticks,
            TickOutcome::Running { .. } => {}
            TickOutcome::Ignored => panic!("clock was not running after {} ticks", ticks),
        }
    }
}

/// Plays the current round to the end with the drawer picking `word`
pub fn play_round(machine: &mut RoomStateMachine, word: &str) {
    let drawer = drawer_of(machine);
    machine.select_word(drawer, word).unwrap();
    run_out_clock(machine);
}

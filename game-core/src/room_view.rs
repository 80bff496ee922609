use game_types::{PlayerId, Room, RoomStatus, RoomView};
use std::collections::HashSet;

use crate::hints::mask_word;

/// Everything a room publishes after a mutation: the authoritative `Room`
/// plus the per-round secrets that only some players may see.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub room: Room,
    pub word_options: Option<Vec<String>>,
    pub word_hint: Option<String>,
    pub previous_word: Option<String>,
    pub correct_guessers: HashSet<PlayerId>,
}

impl RoomSnapshot {
    pub fn last_updated(&self) -> i64 {
        self.room.last_updated
    }

    /// Personalized copy for one player, `None` if they are not in the room.
    pub fn view_for(&self, player_id: PlayerId) -> Option<RoomView> {
        let room = &self.room;
        room.player(player_id)?;

        let playing = room.status == RoomStatus::Playing;
        let is_drawer = playing && room.current_drawer_id == Some(player_id);
        let knows_word = is_drawer || self.correct_guessers.contains(&player_id);

        let current_word = if knows_word {
            room.current_word.clone()
        } else {
            None
        };

        // Guessers see blanks for the first half of the clock, then a partial reveal
        let word_hint = match (&room.current_word, knows_word) {
            (Some(word), false) => {
                if room.time_left * 2 <= room.time_per_round {
                    self.word_hint.clone().or_else(|| Some(mask_word(word)))
                } else {
                    Some(mask_word(word))
                }
            }
            _ => None,
        };

        let word_options = if is_drawer && room.current_word.is_none() {
            self.word_options.clone()
        } else {
            None
        };

        let previous_word = match room.status {
            RoomStatus::RoundEnd | RoomStatus::GameOver => self.previous_word.clone(),
            _ => None,
        };

        Some(RoomView {
            you: player_id,
            id: room.id,
            code: room.code.clone(),
            players: room.players.clone(),
            current_round: room.current_round,
            total_rounds: room.total_rounds,
            time_per_round: room.time_per_round,
            status: room.status,
            current_word,
            word_hint,
            previous_word,
            word_options,
            current_drawer_id: room.current_drawer_id,
            guesses: room.guesses.clone(),
            time_left: room.time_left,
            last_updated: room.last_updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RoomSettings, RoomStateMachine, TickOutcome, WordBank};
    use game_types::RoomCode;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Arc;

    fn started_game() -> (RoomStateMachine, PlayerId, PlayerId) {
        let mut machine = RoomStateMachine::create(
            RoomCode::new("VIEW22"),
            "Alice",
            RoomSettings::new(2, 30).unwrap(),
            Arc::new(WordBank::with_default_words()),
        )
        .unwrap()
        .with_rng(StdRng::seed_from_u64(8));
        let alice = machine.creator_id().unwrap();
        machine.join("Bob").unwrap();
        machine.start_game(alice).unwrap();

        let drawer = machine.room().current_drawer_id.unwrap();
        let guesser = machine
            .room()
            .players
            .iter()
            .find(|p| p.id != drawer)
            .unwrap()
            .id;
        (machine, drawer, guesser)
    }

    #[test]
    fn test_outsiders_get_no_view() {
        let (machine, _, _) = started_game();
        assert!(machine.capture().view_for(uuid::Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_options_only_for_drawer() {
        let (machine, drawer, guesser) = started_game();
        let snapshot = machine.capture();

        let drawer_view = snapshot.view_for(drawer).unwrap();
        assert!(drawer_view.is_drawer());
        assert_eq!(drawer_view.word_options.map(|o| o.len()), Some(3));

        let guesser_view = snapshot.view_for(guesser).unwrap();
        assert!(!guesser_view.is_drawer());
        assert!(guesser_view.word_options.is_none());
    }

    #[test]
    fn test_word_hidden_from_guessers() {
        let (mut machine, drawer, guesser) = started_game();
        machine.select_word(drawer, "ice cream").unwrap();
        let snapshot = machine.capture();

        let drawer_view = snapshot.view_for(drawer).unwrap();
        assert_eq!(drawer_view.current_word.as_deref(), Some("ice cream"));
        assert!(drawer_view.word_hint.is_none());

        let guesser_view = snapshot.view_for(guesser).unwrap();
        assert!(guesser_view.current_word.is_none());
        assert_eq!(guesser_view.word_hint.as_deref(), Some("___ _____"));
    }

    #[test]
    fn test_hint_after_half_time_and_word_after_correct_guess() {
        let (mut machine, drawer, guesser) = started_game();
        machine.select_word(drawer, "watermelon").unwrap();
        for _ in 0..15 {
            machine.tick();
        }

        let hint = machine.capture().view_for(guesser).unwrap().word_hint.unwrap();
        assert_eq!(hint.chars().count(), 10);
        for (h, w) in hint.chars().zip("watermelon".chars()) {
            assert!(h == '_' || h == w);
        }

        machine.submit_guess(guesser, "watermelon").unwrap();
        let view = machine.capture().view_for(guesser).unwrap();
        assert_eq!(view.current_word.as_deref(), Some("watermelon"));
        assert!(view.word_hint.is_none());
    }

    #[test]
    fn test_word_revealed_at_round_end() {
        let (mut machine, drawer, guesser) = started_game();
        machine.select_word(drawer, "dog").unwrap();
        while machine.tick() != TickOutcome::RoundEnded {}

        let view = machine.capture().view_for(guesser).unwrap();
        assert_eq!(view.status, RoomStatus::RoundEnd);
        assert_eq!(view.previous_word.as_deref(), Some("dog"));
        assert!(view.current_word.is_none());
        assert!(view.word_hint.is_none());
    }
}

use game_types::{GameError, RoomCode};
use rand::Rng;

/// Uppercase letters and digits without the look-alikes I, O, 0 and 1.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const ROOM_CODE_LENGTH: usize = 6;
pub const MAX_CODE_ATTEMPTS: u32 = 32;

pub struct RoomCodeGenerator;

impl RoomCodeGenerator {
    pub fn generate<R: Rng>(rng: &mut R) -> RoomCode {
        let code: String = (0..ROOM_CODE_LENGTH)
            .map(|_| char::from(ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())]))
            .collect();
        RoomCode::new(code)
    }

    /// Generate codes until one is not reported as taken by `is_taken`.
    /// Callers must pass their live set of codes; uniqueness is never assumed.
    pub fn generate_unique<R, F>(rng: &mut R, mut is_taken: F) -> Result<RoomCode, GameError>
    where
        R: Rng,
        F: FnMut(&RoomCode) -> bool,
    {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = Self::generate(rng);
            if !is_taken(&code) {
                return Ok(code);
            }
            tracing::debug!("Room code {} already in use (attempt {})", code, attempt);
        }

        Err(GameError::RoomCodeExhausted {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }

    pub fn is_valid(code: &RoomCode) -> bool {
        code.as_str().len() == ROOM_CODE_LENGTH
            && code.as_str().bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_alphabet_excludes_ambiguous_characters() {
        for ch in [b'I', b'O', b'0', b'1'] {
            assert!(!ROOM_CODE_ALPHABET.contains(&ch));
        }
        let unique: HashSet<&u8> = ROOM_CODE_ALPHABET.iter().collect();
        assert_eq!(unique.len(), ROOM_CODE_ALPHABET.len());
        assert_eq!(ROOM_CODE_ALPHABET.len(), 32);
    }

    #[test]
    fn test_generated_codes_are_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let code = RoomCodeGenerator::generate(&mut rng);
            assert_eq!(code.as_str().len(), 6);
            assert!(RoomCodeGenerator::is_valid(&code), "bad code {}", code);
        }
    }

    #[test]
    fn test_generate_unique_retries_on_collision() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut calls = 0;
        let code = RoomCodeGenerator::generate_unique(&mut rng, |_| {
            calls += 1;
            calls < 3 // first two candidates collide
        })
        .unwrap();

        assert_eq!(calls, 3);
        assert!(RoomCodeGenerator::is_valid(&code));
    }

    #[test]
    fn test_generate_unique_gives_up_eventually() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = RoomCodeGenerator::generate_unique(&mut rng, |_| true);
        assert_eq!(
            result.unwrap_err(),
            GameError::RoomCodeExhausted {
                attempts: MAX_CODE_ATTEMPTS
            }
        );
    }

    #[test]
    fn test_validation_of_user_input() {
        assert!(RoomCodeGenerator::is_valid(&RoomCode::new(" abcdef ")));
        assert!(RoomCodeGenerator::is_valid(&RoomCode::new("XY23Z9")));
        assert!(!RoomCodeGenerator::is_valid(&RoomCode::new("ABCDE")));
        assert!(!RoomCodeGenerator::is_valid(&RoomCode::new("ABCDEFG")));
        assert!(!RoomCodeGenerator::is_valid(&RoomCode::new("ABCDE0")));
        assert!(!RoomCodeGenerator::is_valid(&RoomCode::new("IOIOIO")));
    }
}

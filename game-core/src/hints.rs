use rand::Rng;

/// Share of letters revealed by `reveal_hint` in the second half of a round.
pub const HINT_REVEAL_RATIO: f64 = 0.3;

/// Percentage of the guess's characters that appear anywhere in the word.
/// Rough "you're close" signal for misses, clamped to 100.
pub fn closeness(guess: &str, word: &str) -> u8 {
    let guess = guess.trim().to_lowercase();
    let word = word.trim().to_lowercase();
    let word_len = word.chars().count();
    if word_len == 0 {
        return 0;
    }

    let matches = guess.chars().filter(|ch| word.contains(*ch)).count();
    let percentage = matches * 100 / word_len;
    percentage.min(100) as u8
}

/// Every letter replaced by `_`, spaces kept so word boundaries stay visible.
pub fn mask_word(word: &str) -> String {
    word.chars()
        .map(|ch| if ch == ' ' { ' ' } else { '_' })
        .collect()
}

/// Reveals each letter independently with probability `ratio`.
pub fn reveal_hint<R: Rng>(word: &str, ratio: f64, rng: &mut R) -> String {
    word.chars()
        .map(|ch| {
            if ch == ' ' || rng.gen_bool(ratio.clamp(0.0, 1.0)) {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

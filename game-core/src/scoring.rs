/// Flat reward for any correct guess.
pub const BASE_POINTS: u32 = 100;
/// One bonus point per this many seconds left on the clock.
pub const SECONDS_PER_BONUS_POINT: u32 = 5;

pub struct ScoringPolicy;

impl ScoringPolicy {
    /// Points for a correct guess made with `time_left` seconds remaining.
    /// Earlier guesses earn more, but the bonus never dominates the base reward.
    pub fn award(time_left: u32) -> u32 {
        BASE_POINTS + Self::time_bonus(time_left)
    }

    pub fn time_bonus(time_left: u32) -> u32 {
        time_left / SECONDS_PER_BONUS_POINT
    }

    /// Upper bound of what one guess can earn in a round of `time_per_round` seconds.
    pub fn max_award(time_per_round: u32) -> u32 {
        Self::award(time_per_round)
    }
}

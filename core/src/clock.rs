//! In-game clock: minutes into the current day plus a day counter.
//!
//! The clock never reads wall time. It only moves when an action spends
//! game minutes, which keeps every simulation step reproducible.

use crate::types::{Minutes, MINUTES_PER_DAY};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameClock {
    /// Minutes since midnight, 0..1440 (720 = noon).
    pub time_of_day: Minutes,
    pub current_day: i64,
}

impl Default for GameClock {
    fn default() -> Self {
        Self { time_of_day: 8 * 60, current_day: 1 }
    }
}

impl GameClock {
    pub fn new(current_day: i64, time_of_day: Minutes) -> Self {
        let mut clock = Self { time_of_day: 0, current_day };
        clock.advance(time_of_day);
        clock
    }

    /// Move the clock forward. Returns the number of midnights crossed.
    /// Non-positive spans are ignored.
    pub fn advance(&mut self, minutes: Minutes) -> i64 {
        if minutes <= 0 {
            return 0;
        }
        let total = self.time_of_day + minutes;
        let days = total.div_euclid(MINUTES_PER_DAY);
        self.time_of_day = total.rem_euclid(MINUTES_PER_DAY);
        self.current_day += days;
        days
    }

    pub fn hour(&self) -> i64 {
        self.time_of_day / 60
    }

    /// Minutes until the clock next reads `target`.
    /// A target equal to the current time is a full day away.
    pub fn minutes_until(&self, target: Minutes) -> Minutes {
        let target = target.rem_euclid(MINUTES_PER_DAY);
        if self.time_of_day >= target {
            MINUTES_PER_DAY - self.time_of_day + target
        } else {
            target - self.time_of_day
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_wraps_past_midnight() {
        let mut clock = GameClock::new(3, 1400);
        let days = clock.advance(100);
        assert_eq!(days, 1);
        assert_eq!(clock.current_day, 4);
        assert_eq!(clock.time_of_day, 60);
    }

    #[test]
    fn advance_spanning_several_days() {
        let mut clock = GameClock::new(1, 0);
        assert_eq!(clock.advance(3 * MINUTES_PER_DAY + 30), 3);
        assert_eq!(clock.current_day, 4);
        assert_eq!(clock.time_of_day, 30);
    }

    #[test]
    fn minutes_until_next_morning() {
        let clock = GameClock::new(1, 22 * 60);
        assert_eq!(clock.minutes_until(6 * 60), 8 * 60);

        let early = GameClock::new(1, 2 * 60);
        assert_eq!(early.minutes_until(6 * 60), 4 * 60);

        let exact = GameClock::new(1, 6 * 60);
        assert_eq!(exact.minutes_until(6 * 60), MINUTES_PER_DAY);
    }
}

//! Round bookkeeping owned by the scheduler.

use bat_rounds_core::{Escalation, ModeConfig, PaceConfig, ON_SCREEN_HEADROOM};

/// Progress through the current round and the escalation reached so far.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundState {
    current_round: u32,
    target_count_needed: u32,
    max_concurrent_on_screen: u32,
    stuns_this_round: u32,
    total_stuns: u32,
    game_over: bool,
    min_speed: f32,
    max_speed: f32,
}

impl RoundState {
    /// Creates the state of the first round for a pool of `capacity` actors.
    #[must_use]
    pub fn new(rules: &ModeConfig, capacity: usize) -> Self {
        Self {
            current_round: 1,
            target_count_needed: rules.initial_target_count,
            max_concurrent_on_screen: rules.initial_max_on_screen.min(cap_limit(capacity)),
            stuns_this_round: 0,
            total_stuns: 0,
            game_over: false,
            min_speed: rules.pace.min_speed,
            max_speed: rules.pace.max_speed,
        }
    }

    /// One-based number of the current round.
    #[must_use]
    pub const fn current_round(&self) -> u32 {
        self.current_round
    }

    /// Resolutions required to finish the current round.
    #[must_use]
    pub const fn target_count_needed(&self) -> u32 {
        self.target_count_needed
    }

    /// Most actors allowed on screen at once through regular spawning.
    #[must_use]
    pub const fn max_concurrent_on_screen(&self) -> u32 {
        self.max_concurrent_on_screen
    }

    /// Resolutions recorded since the current round started.
    #[must_use]
    pub const fn stuns_this_round(&self) -> u32 {
        self.stuns_this_round
    }

    /// Resolutions recorded since the game started.
    #[must_use]
    pub const fn total_stuns(&self) -> u32 {
        self.total_stuns
    }

    /// Reports whether the final round was completed.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Speed range actors are currently rolled from.
    #[must_use]
    pub const fn speed_range(&self) -> (f32, f32) {
        (self.min_speed, self.max_speed)
    }

    /// Resolutions still missing before the round completes.
    #[must_use]
    pub const fn needed(&self) -> u32 {
        self.target_count_needed.saturating_sub(self.stuns_this_round)
    }

    /// Reports whether enough resolutions were recorded to finish the round.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.stuns_this_round >= self.target_count_needed
    }

    /// Reports whether the current round is the last one the rules allow.
    #[must_use]
    pub const fn is_final_round(&self, num_rounds: u32) -> bool {
        self.current_round >= num_rounds
    }

    /// Counts one resolution toward the round and the game.
    pub fn record_resolution(&mut self) {
        self.stuns_this_round = self.stuns_this_round.saturating_add(1);
        self.total_stuns = self.total_stuns.saturating_add(1);
    }

    /// Requires `amount` extra resolutions before the round completes.
    pub fn raise_target(&mut self, amount: u32) {
        self.target_count_needed = self.target_count_needed.saturating_add(amount);
    }

    /// Moves to the next round, applying the escalation deltas.
    pub fn advance(&mut self, escalation: &Escalation, pace: &PaceConfig, capacity: usize) {
        self.current_round = self.current_round.saturating_add(1);
        self.target_count_needed = self
            .target_count_needed
            .saturating_add(escalation.target_increment);
        self.max_concurrent_on_screen = self
            .max_concurrent_on_screen
            .saturating_add(escalation.cap_increment)
            .min(cap_limit(capacity));
        self.stuns_this_round = 0;
        self.min_speed = (self.min_speed + pace.speed_step).min(pace.min_speed_ceiling);
        self.max_speed = (self.max_speed + pace.speed_step).min(pace.max_speed_ceiling);
    }

    /// Marks the game as finished. Terminal.
    pub fn finish(&mut self) {
        self.game_over = true;
    }
}

fn cap_limit(capacity: usize) -> u32 {
    let limit = capacity.saturating_sub(ON_SCREEN_HEADROOM);
    u32::try_from(limit).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_cap_respects_pool_headroom() {
        let rules = ModeConfig::cooperative();
        let state = RoundState::new(&rules, 10);
        assert_eq!(state.max_concurrent_on_screen(), 8);
        assert_eq!(state.target_count_needed(), rules.initial_target_count);
        assert_eq!(state.current_round(), 1);
    }

    #[test]
    fn advance_escalates_and_resets_progress() {
        let rules = ModeConfig::classic();
        let mut state = RoundState::new(&rules, 22);
        for _ in 0..3 {
            state.record_resolution();
        }
        state.advance(&rules.escalation, &rules.pace, 22);

        assert_eq!(state.current_round(), 2);
        assert_eq!(state.target_count_needed(), 7);
        assert_eq!(state.max_concurrent_on_screen(), 9);
        assert_eq!(state.stuns_this_round(), 0);
        assert_eq!(state.total_stuns(), 3);
        assert_eq!(state.speed_range(), (3.5, 4.0));
    }

    #[test]
    fn cap_never_exceeds_pool_headroom() {
        let rules = ModeConfig::classic();
        let mut state = RoundState::new(&rules, 12);
        for _ in 0..20 {
            state.advance(&rules.escalation, &rules.pace, 12);
            assert!(state.max_concurrent_on_screen() <= 10);
        }
        assert_eq!(state.max_concurrent_on_screen(), 10);
    }

    #[test]
    fn speed_range_stops_at_ceilings() {
        let rules = ModeConfig::classic();
        let mut state = RoundState::new(&rules, 22);
        for _ in 0..30 {
            state.advance(&rules.escalation, &rules.pace, 22);
        }
        assert_eq!(state.speed_range(), (7.5, 8.0));
    }

    #[test]
    fn completion_uses_greater_or_equal() {
        let mut rules = ModeConfig::classic();
        rules.initial_target_count = 2;
        let mut state = RoundState::new(&rules, 22);
        state.record_resolution();
        assert!(!state.is_complete());
        assert_eq!(state.needed(), 1);
        state.record_resolution();
        assert!(state.is_complete());
        assert_eq!(state.needed(), 0);
    }
}

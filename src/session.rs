use std::time::Duration;

use crate::difficulty::Difficulty;

/// Points granted per successful hit
pub const HIT_POINTS: u32 = 10;
/// Length of a session unless configured otherwise
pub const DEFAULT_SESSION_SECS: u32 = 30;
/// Number of holes on the board unless configured otherwise
pub const DEFAULT_TARGET_COUNT: usize = 9;
pub const MAX_TARGET_COUNT: usize = 9;
/// Window after a hit during which the same hole ignores further hits
pub const HIT_COOLDOWN: Duration = Duration::from_millis(500);
pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Running,
    Paused,
    Ended,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub session_secs: u32,
    pub target_count: usize,
    pub difficulty: Difficulty,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_secs: DEFAULT_SESSION_SECS,
            target_count: DEFAULT_TARGET_COUNT,
            difficulty: Difficulty::default(),
        }
    }
}

/// Mutable state of one session
#[derive(Debug, Clone)]
pub struct SessionState {
    pub score: u32,
    pub time_remaining: u32,
    pub phase: Phase,
    pub difficulty: Difficulty,
    pub active_target: Option<usize>,
    /// per-hole deadline on the session clock until which hits are ignored
    pub cooldown_until: Vec<Option<Duration>>,
    pub target_count: usize,
}

impl SessionState {
    pub fn new(config: &SessionConfig) -> Self {
        let target_count = config.target_count.clamp(1, MAX_TARGET_COUNT);
        Self {
            score: 0,
            time_remaining: config.session_secs,
            phase: Phase::Idle,
            difficulty: config.difficulty,
            active_target: None,
            cooldown_until: vec![None; target_count],
            target_count,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running | Phase::Paused)
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    /// Running and not paused: the only phase in which time and targets move
    pub fn is_live(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn in_cooldown(&self, slot: usize, now: Duration) -> bool {
        matches!(self.cooldown_until.get(slot), Some(Some(until)) if now < *until)
    }

    pub fn clear_slots(&mut self) {
        self.active_target = None;
        self.cooldown_until.iter_mut().for_each(|c| *c = None);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotView {
    Empty,
    Up,
    Whacked,
}

/// Read-only view of the session handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub score: u32,
    pub time_remaining: u32,
    pub high_score: u32,
    pub phase: Phase,
    pub difficulty: Difficulty,
    pub slots: Vec<SlotView>,
}

impl Snapshot {
    pub fn active_slot(&self) -> Option<usize> {
        self.slots.iter().position(|s| *s == SlotView::Up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_idle() {
        let state = SessionState::new(&SessionConfig::default());
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.score, 0);
        assert_eq!(state.time_remaining, 30);
        assert_eq!(state.target_count, 9);
        assert_eq!(state.cooldown_until.len(), 9);
        assert!(!state.is_running());
    }

    #[test]
    fn test_target_count_is_clamped() {
        let config = SessionConfig {
            target_count: 0,
            ..SessionConfig::default()
        };
        assert_eq!(SessionState::new(&config).target_count, 1);

        let config = SessionConfig {
            target_count: 40,
            ..SessionConfig::default()
        };
        assert_eq!(SessionState::new(&config).target_count, MAX_TARGET_COUNT);
    }

    #[test]
    fn test_phase_predicates() {
        let mut state = SessionState::new(&SessionConfig::default());
        state.phase = Phase::Paused;
        assert!(state.is_running());
        assert!(state.is_paused());
        assert!(!state.is_live());

        state.phase = Phase::Ended;
        assert!(!state.is_running());
    }

    #[test]
    fn test_cooldown_window() {
        let mut state = SessionState::new(&SessionConfig::default());
        state.cooldown_until[2] = Some(Duration::from_millis(700));

        assert!(state.in_cooldown(2, Duration::from_millis(699)));
        assert!(!state.in_cooldown(2, Duration::from_millis(700)));
        assert!(!state.in_cooldown(3, Duration::ZERO));
        assert!(!state.in_cooldown(99, Duration::ZERO));

        state.clear_slots();
        assert!(!state.in_cooldown(2, Duration::ZERO));
    }
}

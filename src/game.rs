use log::{debug, info, warn};
use std::time::Duration;

use crate::clock::{TimerQueue, TimerToken};
use crate::difficulty::Difficulty;
use crate::high_score::{HighScore, HighScoreStore};
use crate::presentation::PresentationSink;
use crate::random::{pick_fresh_slot, RandomSource};
use crate::session::{
    Phase, SessionConfig, SessionState, SlotView, Snapshot, COUNTDOWN_PERIOD, HIT_COOLDOWN,
    HIT_POINTS,
};

/// Timers carry the generation they were scheduled under. A timer whose
/// generation no longer matches is stale and is dropped when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    Countdown { session: u64 },
    PopUp { cycle: u64 },
    Hide { cycle: u64, activation: u64 },
}

/// Whack-a-mole session controller.
///
/// Owns the session state, both schedulers and the high score, and reports
/// every change to the presentation sink after the state has been updated.
/// Time is virtual: callers move it forward with [`Game::advance`].
#[derive(Debug)]
pub struct Game<P, R, S> {
    config: SessionConfig,
    state: SessionState,
    timers: TimerQueue<Timer>,
    high_score: HighScore,
    store: P,
    rng: R,
    sink: S,
    // bumped on start, reset and end; guards countdown ticks
    session_gen: u64,
    // bumped on start, pause, resume, reset and end; guards target timers
    cycle_gen: u64,
    activation: u64,
    next_pop_up: Option<TimerToken>,
    pending_hide: Option<TimerToken>,
}

impl<P, R, S> Game<P, R, S>
where
    P: HighScoreStore,
    R: RandomSource,
    S: PresentationSink,
{
    pub fn new(config: SessionConfig, store: P, rng: R, sink: S) -> Self {
        let high_score = HighScore::new(store.load());
        let state = SessionState::new(&config);
        let mut game = Self {
            config,
            state,
            timers: TimerQueue::new(),
            high_score,
            store,
            rng,
            sink,
            session_gen: 0,
            cycle_gen: 0,
            activation: 0,
            next_pop_up: None,
            pending_hide: None,
        };
        game.sink.set_controls_enabled(true);
        game.render();
        game
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn time_remaining(&self) -> u32 {
        self.state.time_remaining
    }

    pub fn active_target(&self) -> Option<usize> {
        self.state.active_target
    }

    pub fn difficulty(&self) -> Difficulty {
        self.config.difficulty
    }

    pub fn high_score(&self) -> u32 {
        self.high_score.value()
    }

    /// Current reading of the session clock
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn snapshot(&self) -> Snapshot {
        let now = self.timers.now();
        let slots = (0..self.state.target_count)
            .map(|slot| {
                if self.state.active_target == Some(slot) {
                    SlotView::Up
                } else if self.state.in_cooldown(slot, now) {
                    SlotView::Whacked
                } else {
                    SlotView::Empty
                }
            })
            .collect();

        Snapshot {
            score: self.state.score,
            time_remaining: self.state.time_remaining,
            high_score: self.high_score.value(),
            phase: self.state.phase,
            difficulty: self.state.difficulty,
            slots,
        }
    }

    /// Begin a session. No-op while one is already running; an ended
    /// session is reset first.
    pub fn start(&mut self) -> bool {
        match self.state.phase {
            Phase::Running | Phase::Paused => return false,
            Phase::Ended => self.reset(),
            Phase::Idle => {}
        }

        self.session_gen += 1;
        self.cycle_gen += 1;
        self.state.score = 0;
        self.state.time_remaining = self.config.session_secs;
        self.state.difficulty = self.config.difficulty;
        self.state.clear_slots();
        self.state.phase = Phase::Running;
        info!(
            "session started: difficulty={} holes={} secs={}",
            self.state.difficulty, self.state.target_count, self.state.time_remaining
        );

        self.sink.set_controls_enabled(false);
        self.render();

        self.timers.schedule(
            COUNTDOWN_PERIOD,
            Timer::Countdown {
                session: self.session_gen,
            },
        );
        self.pop_up();
        true
    }

    /// Pause a running session or resume a paused one. Resuming restarts
    /// the pop-up cadence with an immediate pop-up.
    pub fn toggle_pause(&mut self) -> bool {
        match self.state.phase {
            Phase::Running => {
                self.state.phase = Phase::Paused;
                self.cycle_gen += 1;
                self.cancel_target_timers();
                self.hide_active();
                debug!("paused with {}s left", self.state.time_remaining);
                self.render();
            }
            Phase::Paused => {
                self.state.phase = Phase::Running;
                self.cycle_gen += 1;
                debug!("resumed with {}s left", self.state.time_remaining);
                self.render();
                self.pop_up();
            }
            Phase::Idle | Phase::Ended => return false,
        }
        true
    }

    /// Back to idle from any phase
    pub fn reset(&mut self) {
        self.disengage();
        self.state.phase = Phase::Idle;
        self.state.score = 0;
        self.state.time_remaining = self.config.session_secs;
        self.state.difficulty = self.config.difficulty;
        debug!("session reset");

        self.sink.set_controls_enabled(true);
        self.render();
    }

    /// Only honored between sessions; changing it also returns to idle
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> bool {
        if self.state.is_running() {
            return false;
        }
        self.config.difficulty = difficulty;
        self.reset();
        true
    }

    /// Player hit on `slot`. Counts only for the currently raised mole
    /// outside its post-hit cooldown; anything else is ignored.
    pub fn hit(&mut self, slot: usize) -> bool {
        let now = self.timers.now();
        if !self.state.is_live()
            || self.state.active_target != Some(slot)
            || self.state.in_cooldown(slot, now)
        {
            return false;
        }

        self.state.active_target = None;
        if let Some(token) = self.pending_hide.take() {
            self.timers.cancel(token);
        }
        self.state.score += HIT_POINTS;
        self.state.cooldown_until[slot] = Some(now + HIT_COOLDOWN);

        self.sink.set_slot_active(slot, false);
        self.render();
        self.sink.play_hit_feedback(slot);
        true
    }

    /// Move the session clock forward, firing every timer that falls due
    pub fn advance(&mut self, elapsed: Duration) {
        let deadline = self.timers.now() + elapsed;
        while let Some(timer) = self.timers.pop_due(deadline) {
            self.fire(timer);
        }
    }

    fn fire(&mut self, timer: Timer) {
        match timer {
            Timer::Countdown { session } if session == self.session_gen => self.countdown_tick(),
            Timer::PopUp { cycle } if cycle == self.cycle_gen => {
                self.next_pop_up = None;
                self.pop_up();
            }
            Timer::Hide { cycle, activation }
                if cycle == self.cycle_gen && activation == self.activation =>
            {
                self.pending_hide = None;
                if self.hide_active() {
                    self.render();
                }
            }
            stale => debug!("dropping stale timer {stale:?}"),
        }
    }

    fn countdown_tick(&mut self) {
        if !self.state.is_running() {
            return;
        }
        self.timers.schedule(
            COUNTDOWN_PERIOD,
            Timer::Countdown {
                session: self.session_gen,
            },
        );
        if self.state.is_paused() {
            return;
        }

        self.state.time_remaining = self.state.time_remaining.saturating_sub(1);
        self.render();
        if self.state.time_remaining == 0 {
            self.end();
        }
    }

    fn pop_up(&mut self) {
        if !self.state.is_live() {
            return;
        }
        let profile = self.state.difficulty.profile();
        let current = self.state.active_target;
        let slot = pick_fresh_slot(&mut self.rng, self.state.target_count, current);

        if let Some(prev) = current.filter(|prev| *prev != slot) {
            self.sink.set_slot_active(prev, false);
        }
        if let Some(token) = self.pending_hide.take() {
            self.timers.cancel(token);
        }
        self.activation += 1;
        self.state.active_target = Some(slot);
        self.sink.set_slot_active(slot, true);
        self.render();

        self.pending_hide = Some(self.timers.schedule(
            profile.visible_duration,
            Timer::Hide {
                cycle: self.cycle_gen,
                activation: self.activation,
            },
        ));
        let delay = self
            .rng
            .delay_between(profile.min_interval, profile.max_interval);
        self.next_pop_up = Some(self.timers.schedule(
            delay,
            Timer::PopUp {
                cycle: self.cycle_gen,
            },
        ));
    }

    fn end(&mut self) {
        let final_score = self.state.score;
        self.disengage();
        self.state.phase = Phase::Ended;

        let is_new_record = self.high_score.submit(final_score);
        if is_new_record {
            if let Err(e) = self.store.save(final_score) {
                warn!("failed to persist high score {final_score}: {e}");
            }
        }
        info!("session ended: score={final_score} new_record={is_new_record}");

        self.sink.set_controls_enabled(true);
        self.render();
        self.sink.play_end_feedback(final_score, is_new_record);
    }

    /// Cancel every pending timer and lower every mole
    fn disengage(&mut self) {
        self.timers.clear();
        self.next_pop_up = None;
        self.pending_hide = None;
        self.session_gen += 1;
        self.cycle_gen += 1;
        self.hide_active();
        self.state.clear_slots();
    }

    fn cancel_target_timers(&mut self) {
        for token in [self.next_pop_up.take(), self.pending_hide.take()]
            .into_iter()
            .flatten()
        {
            self.timers.cancel(token);
        }
    }

    fn hide_active(&mut self) -> bool {
        match self.state.active_target.take() {
            Some(slot) => {
                self.sink.set_slot_active(slot, false);
                true
            }
            None => false,
        }
    }

    fn render(&mut self) {
        let snapshot = self.snapshot();
        self.sink.render(&snapshot);
    }
}

use log::debug;
use ratatui::layout::Rect;
use std::time::Duration;

use crate::config::Config;
use crate::effects::Effects;
use crate::game::Game;
use crate::high_score::HighScoreStore;
use crate::input::{command_for_key, command_for_mouse, Command};
use crate::presentation::PresentationSink;
use crate::random::StdRandom;
use crate::runtime::GameEvent;
use crate::session::{Phase, SessionConfig, Snapshot, HIT_POINTS};
use crate::ui;

/// Audible feedback the terminal front end should emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Hit,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndSummary {
    pub final_score: u32,
    pub is_new_record: bool,
}

/// Presentation sink backing the terminal UI
#[derive(Debug, Default)]
pub struct TuiSink {
    pub effects: Effects,
    pub controls_enabled: bool,
    pub summary: Option<EndSummary>,
    pub needs_redraw: bool,
    muted: bool,
    cues: Vec<Cue>,
}

impl TuiSink {
    pub fn new(muted: bool) -> Self {
        Self {
            muted,
            controls_enabled: true,
            ..Self::default()
        }
    }

    pub fn take_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    fn cue(&mut self, cue: Cue) {
        if !self.muted {
            self.cues.push(cue);
        }
    }
}

impl PresentationSink for TuiSink {
    fn render(&mut self, _snapshot: &Snapshot) {
        self.needs_redraw = true;
    }

    fn set_slot_active(&mut self, _slot: usize, _active: bool) {
        self.needs_redraw = true;
    }

    fn play_hit_feedback(&mut self, slot: usize) {
        self.effects.hit_burst(slot, HIT_POINTS);
        self.cue(Cue::Hit);
        self.needs_redraw = true;
    }

    fn play_end_feedback(&mut self, final_score: u32, is_new_record: bool) {
        self.summary = Some(EndSummary {
            final_score,
            is_new_record,
        });
        if is_new_record {
            self.effects.celebrate();
        }
        self.cue(Cue::GameOver);
        self.needs_redraw = true;
    }

    fn set_controls_enabled(&mut self, enabled: bool) {
        self.controls_enabled = enabled;
        self.needs_redraw = true;
    }
}

pub type TuiGame = Game<Box<dyn HighScoreStore>, StdRandom, TuiSink>;

pub struct App {
    pub game: TuiGame,
    pub config: Config,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config, store: Box<dyn HighScoreStore>, rng: StdRandom) -> Self {
        let sink = TuiSink::new(config.muted);
        let game = Game::new(SessionConfig::from(&config), store, rng, sink);
        Self {
            game,
            config,
            should_quit: false,
        }
    }

    pub fn sink(&self) -> &TuiSink {
        self.game.sink()
    }

    pub fn handle_command(&mut self, command: Command) {
        debug!("command {command:?} in phase {}", self.game.phase());
        match command {
            Command::Start => self.start(),
            Command::TogglePause => {
                self.game.toggle_pause();
            }
            Command::StartOrPause => {
                if self.game.state().is_running() {
                    self.game.toggle_pause();
                } else {
                    self.start();
                }
            }
            Command::Reset => {
                self.dismiss_results();
                self.game.reset();
            }
            Command::SetDifficulty(difficulty) => self.change_difficulty(difficulty),
            Command::CycleDifficulty => self.change_difficulty(self.game.difficulty().next()),
            Command::Hit(slot) => {
                self.game.hit(slot);
            }
            Command::PlayAgain => {
                if self.game.phase() == Phase::Ended {
                    self.start();
                }
            }
            Command::Quit => self.should_quit = true,
        }
    }

    /// Route a terminal event; `area` is the current terminal size, used to
    /// resolve mouse clicks to holes
    pub fn handle_event(&mut self, event: GameEvent, area: Rect) {
        let command = match event {
            GameEvent::Key(key) => command_for_key(key),
            GameEvent::Mouse(mouse) => {
                let holes = ui::hole_areas(ui::board_area(area), self.game.state().target_count);
                command_for_mouse(mouse, &holes)
            }
            GameEvent::Resize => {
                self.game.sink_mut().needs_redraw = true;
                None
            }
            GameEvent::Tick => None,
        };
        if let Some(command) = command {
            self.handle_command(command);
        }
    }

    /// Advance game timers and animations by `elapsed` wall-clock time
    pub fn on_tick(&mut self, elapsed: Duration) {
        self.game.advance(elapsed);
        let sink = self.game.sink_mut();
        if sink.effects.is_active() {
            sink.needs_redraw = true;
        }
        sink.effects.update(elapsed.as_secs_f64());
    }

    fn start(&mut self) {
        if self.game.start() {
            self.dismiss_results();
        }
    }

    fn change_difficulty(&mut self, difficulty: crate::difficulty::Difficulty) {
        if self.game.set_difficulty(difficulty) {
            self.config.difficulty = difficulty;
            self.dismiss_results();
        }
    }

    fn dismiss_results(&mut self) {
        let sink = self.game.sink_mut();
        sink.summary = None;
        sink.effects.clear();
    }
}

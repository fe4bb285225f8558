use crate::session::Snapshot;

/// Narrow observer the game reports to. Implementations draw, play sounds
/// and animate; the game never touches a display directly.
pub trait PresentationSink {
    fn render(&mut self, snapshot: &Snapshot);
    fn set_slot_active(&mut self, slot: usize, active: bool);
    fn play_hit_feedback(&mut self, slot: usize);
    fn play_end_feedback(&mut self, final_score: u32, is_new_record: bool);
    fn set_controls_enabled(&mut self, enabled: bool);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Render(Snapshot),
    SlotActive { slot: usize, active: bool },
    HitFeedback { slot: usize },
    EndFeedback { final_score: u32, is_new_record: bool },
    ControlsEnabled(bool),
}

/// Sink that keeps every call, for headless runs and tests
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_render(&self) -> Option<&Snapshot> {
        self.events.iter().rev().find_map(|e| match e {
            SinkEvent::Render(s) => Some(s),
            _ => None,
        })
    }

    pub fn end_feedback(&self) -> Option<(u32, bool)> {
        self.events.iter().find_map(|e| match e {
            SinkEvent::EndFeedback {
                final_score,
                is_new_record,
            } => Some((*final_score, *is_new_record)),
            _ => None,
        })
    }

    pub fn count(&self, pred: impl Fn(&SinkEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl PresentationSink for RecordingSink {
    fn render(&mut self, snapshot: &Snapshot) {
        self.events.push(SinkEvent::Render(snapshot.clone()));
    }

    fn set_slot_active(&mut self, slot: usize, active: bool) {
        self.events.push(SinkEvent::SlotActive { slot, active });
    }

    fn play_hit_feedback(&mut self, slot: usize) {
        self.events.push(SinkEvent::HitFeedback { slot });
    }

    fn play_end_feedback(&mut self, final_score: u32, is_new_record: bool) {
        self.events.push(SinkEvent::EndFeedback {
            final_score,
            is_new_record,
        });
    }

    fn set_controls_enabled(&mut self, enabled: bool) {
        self.events.push(SinkEvent::ControlsEnabled(enabled));
    }
}

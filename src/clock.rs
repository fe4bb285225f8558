use std::collections::BTreeMap;
use std::time::Duration;

/// Handle returned by [`TimerQueue::schedule`], used to cancel a pending timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerToken {
    due: Duration,
    seq: u64,
}

impl TimerToken {
    pub fn due(&self) -> Duration {
        self.due
    }
}

/// Virtual clock plus a queue of one-shot timers.
///
/// Time only moves when the owner calls [`TimerQueue::pop_due`] with a
/// later deadline, so the same sequence of calls always fires the same
/// timers in the same order. Timers due at the same instant fire in the
/// order they were scheduled.
#[derive(Debug)]
pub struct TimerQueue<E> {
    now: Duration,
    next_seq: u64,
    pending: BTreeMap<TimerToken, E>,
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            pending: BTreeMap::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, event: E) -> TimerToken {
        let token = TimerToken {
            due: self.now + delay,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.pending.insert(token, event);
        token
    }

    /// Returns the event if the timer was still pending
    pub fn cancel(&mut self, token: TimerToken) -> Option<E> {
        self.pending.remove(&token)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pops the earliest timer due at or before `deadline` and moves the
    /// clock to its due time. Once nothing is due the clock is moved to
    /// `deadline` and `None` is returned.
    pub fn pop_due(&mut self, deadline: Duration) -> Option<E> {
        let token = match self.pending.keys().next() {
            Some(t) if t.due <= deadline => *t,
            _ => {
                self.now = self.now.max(deadline);
                return None;
            }
        };
        let event = self.pending.remove(&token)?;
        self.now = self.now.max(token.due);
        Some(event)
    }
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

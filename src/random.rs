use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Duration;

/// Randomness consumed by the target scheduler
pub trait RandomSource {
    /// Uniform slot index in `[0, count)`; `count` is at least 1
    fn pick_slot(&mut self, count: usize) -> usize;

    /// Uniform delay in `[min, max)`, or `min` when the range is empty
    fn delay_between(&mut self, min: Duration, max: Duration) -> Duration;
}

/// `StdRng` backed source, seedable for reproducible sessions
#[derive(Debug, Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for StdRandom {
    fn pick_slot(&mut self, count: usize) -> usize {
        if count <= 1 {
            return 0;
        }
        self.rng.gen_range(0..count)
    }

    fn delay_between(&mut self, min: Duration, max: Duration) -> Duration {
        if max <= min {
            return min;
        }
        let micros = self
            .rng
            .gen_range(min.as_micros() as u64..max.as_micros() as u64);
        Duration::from_micros(micros)
    }
}

/// Redraws before `pick_fresh_slot` stops trusting the source
const MAX_RESAMPLES: usize = 8;

/// Pick a slot that differs from `current` whenever more than one slot exists.
/// A source that keeps repeating `current` falls back to a uniform pick among
/// the other slots, so this always returns.
pub fn pick_fresh_slot<R: RandomSource + ?Sized>(
    rng: &mut R,
    count: usize,
    current: Option<usize>,
) -> usize {
    let slot = rng.pick_slot(count);
    let Some(current) = current.filter(|c| count > 1 && *c == slot) else {
        return slot;
    };
    for _ in 0..MAX_RESAMPLES {
        let slot = rng.pick_slot(count);
        if slot != current {
            return slot;
        }
    }
    (current + 1 + rng.pick_slot(count - 1)) % count
}

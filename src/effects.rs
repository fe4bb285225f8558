use rand::seq::SliceRandom;
use rand::Rng;
use std::f64::consts::PI;

/// Particles thrown out of a hole on every hit
pub const BURST_PARTICLES: usize = 12;
pub const PARTICLE_LIFETIME: f64 = 1.0;
pub const POPUP_LIFETIME: f64 = 1.0;
pub const FLASH_DURATION: f64 = 0.4;
pub const SHAKE_DURATION: f64 = 0.3;
const CELEBRATION_PARTICLES: usize = 25;
/// keeps fresh confetti clear of the results box
const CELEBRATION_MIN_OFFSET: f64 = 19.0;
const GRAVITY: f64 = 15.0;

/// Where a particle is anchored: a hole's center or the screen center
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Hole(usize),
    Screen,
}

/// Particle position is an offset in cells from its anchor
#[derive(Debug, Clone)]
pub struct Particle {
    pub anchor: Anchor,
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
}

impl Particle {
    /// One spoke of the radial burst; `index` out of `count` sets the angle
    fn spoke(slot: usize, index: usize, count: usize) -> Self {
        let mut rng = rand::thread_rng();
        let angle = (2.0 * PI * index as f64) / count as f64;
        let speed = rng.gen_range(8.0..16.0);

        Self {
            anchor: Anchor::Hole(slot),
            x: 0.0,
            y: 0.0,
            vel_x: angle.cos() * speed,
            // cells are about twice as tall as they are wide
            vel_y: angle.sin() * speed / 2.0,
            symbol: *['*', '✦', '•', '+'].choose(&mut rng).unwrap_or(&'*'),
            color_index: index % 7,
            age: 0.0,
            max_age: PARTICLE_LIFETIME,
        }
    }

    fn confetti(x: f64, y: f64) -> Self {
        let mut rng = rand::thread_rng();

        Self {
            anchor: Anchor::Screen,
            x,
            y,
            vel_x: rng.gen_range(-3.0..3.0),
            vel_y: rng.gen_range(-4.0..-1.0),
            symbol: *['✨', '🎉', '⭐', '💫', '🌟', '🎊']
                .choose(&mut rng)
                .unwrap_or(&'✨'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(2.0..4.0),
        }
    }

    fn update(&mut self, dt: f64) -> bool {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        match self.anchor {
            // burst particles drift and slow down
            Anchor::Hole(_) => {
                self.vel_x *= 0.9;
                self.vel_y *= 0.9;
            }
            Anchor::Screen => self.vel_y += GRAVITY * dt,
        }
        self.age += dt;
        self.age < self.max_age
    }

    /// 1.0 when fresh, approaching 0.0 at end of life
    pub fn alpha(&self) -> f64 {
        (1.0 - self.age / self.max_age).clamp(0.0, 1.0)
    }
}

/// Floating "+10" over a hole
#[derive(Debug, Clone)]
pub struct ScorePopup {
    pub slot: usize,
    pub text: String,
    pub age: f64,
}

impl ScorePopup {
    /// Rows above the hole center, rising over its lifetime
    pub fn rise(&self) -> u16 {
        (1.0 + self.age * 2.0) as u16
    }
}

#[derive(Debug, Clone, Copy)]
struct Flash {
    slot: usize,
    remaining: f64,
}

/// Cosmetic state driven by hit and end-of-session feedback
#[derive(Debug, Default)]
pub struct Effects {
    pub particles: Vec<Particle>,
    pub popups: Vec<ScorePopup>,
    flashes: Vec<Flash>,
    shake_remaining: f64,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Radial particle burst, "+points" popup, hole flash and screen shake
    pub fn hit_burst(&mut self, slot: usize, points: u32) {
        self.particles
            .extend((0..BURST_PARTICLES).map(|i| Particle::spoke(slot, i, BURST_PARTICLES)));
        self.popups.push(ScorePopup {
            slot,
            text: format!("+{points}"),
            age: 0.0,
        });
        self.flashes.retain(|f| f.slot != slot);
        self.flashes.push(Flash {
            slot,
            remaining: FLASH_DURATION,
        });
        self.shake_remaining = SHAKE_DURATION;
    }

    /// Confetti on both sides of the screen center for a new record
    pub fn celebrate(&mut self) {
        let mut rng = rand::thread_rng();
        for i in 0..CELEBRATION_PARTICLES {
            let side = if i % 2 == 0 { 1.0 } else { -1.0 };
            let x = side * rng.gen_range(CELEBRATION_MIN_OFFSET..CELEBRATION_MIN_OFFSET + 10.0);
            let y = rng.gen_range(-8.0..8.0);
            self.particles.push(Particle::confetti(x, y));
        }
    }

    pub fn update(&mut self, dt: f64) {
        self.particles.retain_mut(|p| p.update(dt));
        self.popups.retain_mut(|p| {
            p.age += dt;
            p.age < POPUP_LIFETIME
        });
        self.flashes.retain_mut(|f| {
            f.remaining -= dt;
            f.remaining > 0.0
        });
        self.shake_remaining = (self.shake_remaining - dt).max(0.0);
    }

    pub fn is_flashing(&self, slot: usize) -> bool {
        self.flashes.iter().any(|f| f.slot == slot)
    }

    /// Horizontal board offset while shaking, alternating sides
    pub fn shake_offset(&self) -> i16 {
        if self.shake_remaining <= 0.0 {
            return 0;
        }
        if ((self.shake_remaining * 20.0) as i64) % 2 == 0 {
            1
        } else {
            -1
        }
    }

    pub fn is_active(&self) -> bool {
        !self.particles.is_empty()
            || !self.popups.is_empty()
            || !self.flashes.is_empty()
            || self.shake_remaining > 0.0
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.popups.clear();
        self.flashes.clear();
        self.shake_remaining = 0.0;
    }
}

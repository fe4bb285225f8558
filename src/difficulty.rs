use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing parameters for one difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyProfile {
    /// shortest gap between two pop-ups
    pub min_interval: Duration,
    /// upper (exclusive) bound of the gap between two pop-ups
    pub max_interval: Duration,
    /// how long a mole stays up when nobody hits it
    pub visible_duration: Duration,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn profile(self) -> DifficultyProfile {
        match self {
            Difficulty::Easy => DifficultyProfile {
                min_interval: Duration::from_millis(1000),
                max_interval: Duration::from_millis(2000),
                visible_duration: Duration::from_millis(1500),
            },
            Difficulty::Medium => DifficultyProfile {
                min_interval: Duration::from_millis(600),
                max_interval: Duration::from_millis(1200),
                visible_duration: Duration::from_millis(1000),
            },
            Difficulty::Hard => DifficultyProfile {
                min_interval: Duration::from_millis(400),
                max_interval: Duration::from_millis(800),
                visible_duration: Duration::from_millis(700),
            },
        }
    }

    /// Next level in the selector, wrapping from hard back to easy
    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }
}

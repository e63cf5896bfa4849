//! Out-of-level detection.
//!
//! A two-state hysteresis machine: the alarm trips when the vehicle is tilted
//! past the threshold while moving inside the speed band, and only the
//! configured [`ReleaseRule`] can clear it again.

use crate::state::Orientation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum AlarmState {
    #[default]
    Normal,
    Tripped,
}

/// Condition under which a tripped alarm returns to `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum ReleaseRule {
    /// As built: tilt below threshold AND speed below the band AND speed
    /// above the band. No scalar speed satisfies both speed terms, so a
    /// tripped alarm stays latched until reset.
    Latching,
    /// Tilt below threshold OR speed outside the band.
    TiltOrSpeed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelConfig {
    pub threshold_deg: f32,
    pub min_speed_mps: f32,
    pub max_speed_mps: f32,
    pub release: ReleaseRule,
}

pub struct LevelDetector {
    config: LevelConfig,
    threshold_sq: f32,
    state: AlarmState,
}

impl LevelDetector {
    pub fn new(config: LevelConfig) -> Self {
        Self {
            config,
            threshold_sq: config.threshold_deg * config.threshold_deg,
            state: AlarmState::Normal,
        }
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }

    /// Evaluate one sample. Returns `true` while the alarm is tripped.
    pub fn update(&mut self, sample: Orientation, speed_mps: f32) -> bool {
        let tilt_sq = sample.tilt_sq();
        let tilted = tilt_sq >= self.threshold_sq;
        let low = self.config.min_speed_mps;
        let high = self.config.max_speed_mps;

        self.state = match self.state {
            AlarmState::Normal => {
                if tilted && speed_mps >= low && speed_mps <= high {
                    AlarmState::Tripped
                } else {
                    AlarmState::Normal
                }
            }
            AlarmState::Tripped => {
                let level = tilt_sq < self.threshold_sq;
                let release = match self.config.release {
                    ReleaseRule::Latching => level && speed_mps < low && speed_mps > high,
                    ReleaseRule::TiltOrSpeed => level || speed_mps < low || speed_mps > high,
                };
                if release {
                    AlarmState::Normal
                } else {
                    AlarmState::Tripped
                }
            }
        };

        self.state == AlarmState::Tripped
    }
}

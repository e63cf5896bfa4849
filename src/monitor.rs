//! One pass of the main polling loop.

use crate::brightness::duty_for_light;
use crate::error::Fault;
use crate::level::{LevelConfig, LevelDetector};
use crate::peripheral::{LightSource, OrientationSource};
use crate::speed::SpeedTracker;
use crate::state::{Duty, LedCommand, LedLink, Orientation, SpeedFix};

/// What one poll saw and decided.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PollReport {
    pub orientation: Orientation,
    pub speed_mps: f32,
    /// `None` when the LED was lit and the sample was skipped.
    pub light_mv: Option<i32>,
    pub duty: Duty,
    pub alarm: bool,
}

pub struct Monitor {
    detector: LevelDetector,
    speed: SpeedTracker,
    duty: Duty,
}

impl Monitor {
    pub fn new(level: LevelConfig, stale_after_ms: Option<u64>) -> Self {
        Self {
            detector: LevelDetector::new(level),
            speed: SpeedTracker::new(stale_after_ms),
            duty: Duty::OFF,
        }
    }

    pub fn record_fix(&mut self, fix: SpeedFix) {
        self.speed.record(fix);
    }

    pub fn detector(&self) -> &LevelDetector {
        &self.detector
    }

    /// Sample light (only while the LED is dark), sample orientation, run the
    /// detector and publish the new command to the flash task.
    pub async fn poll<O, L>(
        &mut self,
        orientation: &mut O,
        light: &mut L,
        link: &LedLink,
        now_ms: u64,
    ) -> Result<PollReport, Fault>
    where
        O: OrientationSource,
        L: LightSource,
    {
        let light_mv = if link.is_lit() {
            None
        } else {
            let mv = light.read().await?;
            self.duty = duty_for_light(mv);
            Some(mv)
        };

        let sample = orientation.read().await?;
        let speed_mps = self.speed.speed_mps(now_ms);
        let alarm = self.detector.update(sample, speed_mps);

        link.publish(LedCommand { enabled: alarm, duty: self.duty });

        Ok(PollReport {
            orientation: sample,
            speed_mps,
            light_mv,
            duty: self.duty,
            alarm,
        })
    }
}

use crate::state::SpeedFix;

/// Main-loop view of ground speed: the last fix the GPS task pushed.
///
/// Before the first fix the speed reads 0. With a staleness timeout set, a
/// fix older than the timeout also reads 0; without one the last value is
/// held indefinitely.
pub struct SpeedTracker {
    last: Option<SpeedFix>,
    stale_after_ms: Option<u64>,
}

impl SpeedTracker {
    pub const fn new(stale_after_ms: Option<u64>) -> Self {
        Self { last: None, stale_after_ms }
    }

    pub fn record(&mut self, fix: SpeedFix) {
        self.last = Some(fix);
    }

    pub fn speed_mps(&self, now_ms: u64) -> f32 {
        match (self.last, self.stale_after_ms) {
            (None, _) => 0.0,
            (Some(fix), Some(limit)) if now_ms.saturating_sub(fix.at_ms) > limit => 0.0,
            (Some(fix), _) => fix.mps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_until_first_fix() {
        let tracker = SpeedTracker::new(None);
        assert_eq!(tracker.speed_mps(0), 0.0);
        assert_eq!(tracker.speed_mps(1_000_000), 0.0);
    }

    #[test]
    fn holds_last_fix_without_timeout() {
        let mut tracker = SpeedTracker::new(None);
        tracker.record(SpeedFix { mps: 6.0, at_ms: 100 });
        assert_eq!(tracker.speed_mps(100), 6.0);
        assert_eq!(tracker.speed_mps(u64::MAX), 6.0);

        tracker.record(SpeedFix { mps: 2.5, at_ms: 5_000 });
        assert_eq!(tracker.speed_mps(5_000), 2.5);
    }

    #[test]
    fn stale_fix_reads_as_standstill() {
        let mut tracker = SpeedTracker::new(Some(3_000));
        tracker.record(SpeedFix { mps: 6.0, at_ms: 1_000 });
        assert_eq!(tracker.speed_mps(4_000), 6.0);
        assert_eq!(tracker.speed_mps(4_001), 0.0);

        tracker.record(SpeedFix { mps: 7.0, at_ms: 4_500 });
        assert_eq!(tracker.speed_mps(4_600), 7.0);
    }

    #[test]
    fn clock_behind_fix_is_not_stale() {
        let mut tracker = SpeedTracker::new(Some(10));
        tracker.record(SpeedFix { mps: 4.0, at_ms: 1_000 });
        assert_eq!(tracker.speed_mps(500), 4.0);
    }
}

//! Ambient light → LED duty.

use crate::config::{LIGHT_OFFSET_MV, LIGHT_SPAN_MV, MIN_BRIGHTNESS};
use crate::state::Duty;

/// Map a calibrated photoresistor reading (mV, roughly 150..2450) to a duty
/// target. Brighter surroundings give a brighter LED; the result never drops
/// below `MIN_BRIGHTNESS` of full scale.
pub fn duty_for_light(reading_mv: i32) -> Duty {
    let fraction = ((reading_mv as f32 - LIGHT_OFFSET_MV) / LIGHT_SPAN_MV).clamp(MIN_BRIGHTNESS, 1.0);
    Duty::saturating((fraction * Duty::MAX.get() as f32) as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_dark_readings_to_ten_percent() {
        assert_eq!(duty_for_light(500).get(), 102);
        assert_eq!(duty_for_light(150).get(), 102);
        assert_eq!(duty_for_light(0).get(), 102);
        assert_eq!(duty_for_light(i32::MIN).get(), 102);
    }

    #[test]
    fn clamps_bright_readings_to_full_scale() {
        assert_eq!(duty_for_light(3098).get(), 1023);
        assert_eq!(duty_for_light(5000).get(), 1023);
        assert_eq!(duty_for_light(i32::MAX).get(), 1023);
    }

    #[test]
    fn scales_linearly_between_clamps() {
        // (1799 - 500) / 2598 = 0.5 → 511.5
        assert_eq!(duty_for_light(1799).get(), 511);
        // (2450 - 500) / 2598 ≈ 0.7506 → 767.8
        assert_eq!(duty_for_light(2450).get(), 767);
    }

    #[test]
    fn monotonic_and_bounded() {
        let mut prev = duty_for_light(-10_000);
        for mv in (-10_000..10_000).step_by(7) {
            let duty = duty_for_light(mv);
            assert!(duty >= prev, "dropped at {mv} mV");
            assert!((102..=1023).contains(&duty.get()));
            assert_eq!(duty, duty_for_light(mv));
            prev = duty;
        }
    }
}

//! LED flashing, one step per timer tick.

use crate::error::Fault;
use crate::peripheral::DutyOutput;
use crate::state::{Duty, LedLink};

/// Owns the toggle bit. The bit survives enable/disable transitions, so
/// re-enabling continues from whichever phase the last enabled tick left.
pub struct FlashDriver {
    toggle: bool,
}

impl FlashDriver {
    pub const fn new() -> Self {
        Self { toggle: false }
    }

    pub fn toggle(&self) -> bool {
        self.toggle
    }

    /// Run one tick against the current command. Returns whether the LED is
    /// lit afterwards; the same value is reported through `link`.
    ///
    /// `lit` is raised before a nonzero duty is applied and lowered only after
    /// the LED is dark, so a light sample never overlaps the LED being on.
    pub fn tick<P: DutyOutput>(&mut self, link: &LedLink, out: &mut P) -> Result<bool, Fault> {
        let command = link.command();

        if !command.enabled {
            out.apply(Duty::OFF)?;
            link.set_lit(false);
            return Ok(false);
        }

        let lit = if self.toggle && !command.duty.is_off() {
            link.set_lit(true);
            out.apply(command.duty)?;
            true
        } else {
            out.apply(Duty::OFF)?;
            link.set_lit(false);
            false
        };
        self.toggle = !self.toggle;

        Ok(lit)
    }
}

impl Default for FlashDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::LedFault;
    use crate::state::LedCommand;
    use std::vec::Vec;

    /// PWM stand-in that records every duty it is given.
    #[derive(Default)]
    pub(crate) struct RecordingPwm {
        pub applied: Vec<u16>,
        pub disabled: bool,
        pub fail_on_call: Option<usize>,
    }

    impl DutyOutput for RecordingPwm {
        fn apply(&mut self, duty: Duty) -> Result<(), Fault> {
            if self.disabled || self.fail_on_call == Some(self.applied.len()) {
                return Err(Fault::Led(LedFault::ChannelDisabled));
            }
            self.applied.push(duty.get());
            Ok(())
        }

        fn disable(&mut self) -> Result<(), Fault> {
            self.disabled = true;
            Ok(())
        }
    }

    fn enabled(raw: u16) -> LedCommand {
        LedCommand { enabled: true, duty: Duty::saturating(raw) }
    }

    #[test]
    fn disabled_forces_off_without_flipping() {
        let link = LedLink::new();
        let mut pwm = RecordingPwm::default();
        let mut driver = FlashDriver::new();

        for _ in 0..5 {
            assert!(!driver.tick(&link, &mut pwm).unwrap());
            assert!(!link.is_lit());
        }
        assert_eq!(pwm.applied, [0, 0, 0, 0, 0]);
        assert!(!driver.toggle());
    }

    #[test]
    fn enabled_alternates_off_then_target() {
        let link = LedLink::new();
        link.publish(enabled(700));
        let mut pwm = RecordingPwm::default();
        let mut driver = FlashDriver::new();

        let mut reports = Vec::new();
        for _ in 0..6 {
            reports.push(driver.tick(&link, &mut pwm).unwrap());
            assert_eq!(link.is_lit(), *reports.last().unwrap());
        }
        assert_eq!(pwm.applied, [0, 700, 0, 700, 0, 700]);
        assert_eq!(reports, [false, true, false, true, false, true]);
    }

    #[test]
    fn picks_up_new_duty_on_next_lit_tick() {
        let link = LedLink::new();
        link.publish(enabled(300));
        let mut pwm = RecordingPwm::default();
        let mut driver = FlashDriver::new();

        driver.tick(&link, &mut pwm).unwrap();
        driver.tick(&link, &mut pwm).unwrap();
        link.publish(enabled(900));
        driver.tick(&link, &mut pwm).unwrap();
        driver.tick(&link, &mut pwm).unwrap();
        assert_eq!(pwm.applied, [0, 300, 0, 900]);
    }

    #[test]
    fn toggle_survives_disable() {
        let link = LedLink::new();
        let mut pwm = RecordingPwm::default();
        let mut driver = FlashDriver::new();

        link.publish(enabled(500));
        driver.tick(&link, &mut pwm).unwrap(); // off, toggle → set
        link.publish(LedCommand { enabled: false, duty: Duty::saturating(500) });
        driver.tick(&link, &mut pwm).unwrap();
        driver.tick(&link, &mut pwm).unwrap();
        assert!(driver.toggle());

        link.publish(enabled(500));
        assert!(driver.tick(&link, &mut pwm).unwrap());
        assert_eq!(pwm.applied, [0, 0, 0, 500]);
    }

    #[test]
    fn zero_target_reports_dark() {
        let link = LedLink::new();
        link.publish(enabled(0));
        let mut pwm = RecordingPwm::default();
        let mut driver = FlashDriver::new();

        for _ in 0..4 {
            assert!(!driver.tick(&link, &mut pwm).unwrap());
            assert!(!link.is_lit());
        }
        assert_eq!(pwm.applied, [0, 0, 0, 0]);
    }

    #[test]
    fn pwm_failure_propagates() {
        let link = LedLink::new();
        link.publish(enabled(400));
        let mut pwm = RecordingPwm { fail_on_call: Some(1), ..Default::default() };
        let mut driver = FlashDriver::new();

        assert!(driver.tick(&link, &mut pwm).is_ok());
        assert_eq!(
            driver.tick(&link, &mut pwm),
            Err(Fault::Led(LedFault::ChannelDisabled))
        );
    }
}

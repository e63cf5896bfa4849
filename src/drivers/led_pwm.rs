//! Status LED on TIM3 CH4 (PB1).

use crate::state::Duty;

/// 10-bit duty onto the timer's own compare range.
pub fn scale_duty(duty: Duty, max_duty: u16) -> u16 {
    (duty.get() as u32 * max_duty as u32 / Duty::MAX.get() as u32) as u16
}

#[cfg(target_os = "none")]
pub use hw::LedPwm;

#[cfg(target_os = "none")]
mod hw {
    use embassy_stm32::gpio::OutputType;
    use embassy_stm32::peripherals::{PB1, TIM3};
    use embassy_stm32::time::hz;
    use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
    use embassy_stm32::timer::{Channel, CountingMode};

    use super::scale_duty;
    use crate::config::PWM_FREQ_HZ;
    use crate::error::{Fault, LedFault};
    use crate::peripheral::DutyOutput;
    use crate::state::Duty;

    pub struct LedPwm {
        pwm: SimplePwm<'static, TIM3>,
        max_duty: u16,
        enabled: bool,
    }

    impl LedPwm {
        /// Configure the timer and start the channel dark.
        pub fn new(tim: TIM3, pin: PB1) -> Result<Self, Fault> {
            let ch4 = PwmPin::new_ch4(pin, OutputType::PushPull);
            let mut pwm = SimplePwm::new(tim, None, None, None, Some(ch4), hz(PWM_FREQ_HZ), CountingMode::EdgeAlignedUp);

            let max_duty = pwm.get_max_duty();
            if max_duty == 0 {
                return Err(Fault::Led(LedFault::NoPeriod));
            }
            pwm.set_duty(Channel::Ch4, 0);
            pwm.enable(Channel::Ch4);
            log_debug!("led: pwm {} Hz, max duty {}", PWM_FREQ_HZ, max_duty);

            Ok(Self { pwm, max_duty, enabled: true })
        }
    }

    impl DutyOutput for LedPwm {
        fn apply(&mut self, duty: Duty) -> Result<(), Fault> {
            if !self.enabled {
                return Err(Fault::Led(LedFault::ChannelDisabled));
            }
            self.pwm.set_duty(Channel::Ch4, scale_duty(duty, self.max_duty));
            Ok(())
        }

        fn disable(&mut self) -> Result<(), Fault> {
            if self.enabled {
                self.pwm.set_duty(Channel::Ch4, 0);
                self.pwm.disable(Channel::Ch4);
                self.enabled = false;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_hits_the_timer_max() {
        assert_eq!(scale_duty(Duty::MAX, 959), 959);
        assert_eq!(scale_duty(Duty::OFF, 959), 0);
        assert_eq!(scale_duty(Duty::saturating(511), 1023), 511);
    }

    #[test]
    fn scaling_truncates() {
        // 102 * 959 / 1023 = 95.6
        assert_eq!(scale_duty(Duty::saturating(102), 959), 95);
        assert_eq!(scale_duty(Duty::saturating(1), 959), 0);
    }
}

//! Photoresistor divider on ADC1 / PC1.
//!
//! Readings are calibrated to millivolts against the internal reference, so
//! the brightness mapping does not depend on the exact supply voltage.

use crate::error::{Fault, LightFault};

/// Typical VREFINT voltage (STM32F405 datasheet).
pub const VREFINT_MV: u32 = 1210;

/// Pin reading to millivolts, given a VREFINT sample taken with the same
/// settings.
pub fn millivolts(raw: u16, vrefint_raw: u16) -> Result<i32, Fault> {
    if vrefint_raw == 0 {
        return Err(Fault::Light(LightFault::Reference));
    }
    Ok((raw as u32 * VREFINT_MV / vrefint_raw as u32) as i32)
}

#[cfg(target_os = "none")]
pub use hw::Photoresistor;

#[cfg(target_os = "none")]
mod hw {
    use embassy_stm32::adc::{Adc, SampleTime, VrefInt};
    use embassy_stm32::peripherals::{ADC1, PC1};
    use embassy_time::Delay;

    use super::millivolts;
    use crate::error::{Fault, LightFault};
    use crate::peripheral::{Device, LightSource};

    struct Channel {
        adc: Adc<'static, ADC1>,
        pin: PC1,
        vrefint: VrefInt,
    }

    pub struct Photoresistor {
        channel: Option<Channel>,
    }

    impl Photoresistor {
        /// Power the ADC and take one reference sample to prove it converts.
        pub async fn open(adc: ADC1, pin: PC1) -> Result<Self, Fault> {
            let mut adc = Adc::new(adc, &mut Delay);
            adc.set_sample_time(SampleTime::Cycles480);
            let mut vrefint = adc.enable_vrefint();

            let vref = adc.read(&mut vrefint);
            if vref == 0 {
                return Err(Fault::Light(LightFault::Reference));
            }
            log_debug!("light: vrefint raw {}", vref);

            Ok(Self { channel: Some(Channel { adc, pin, vrefint }) })
        }
    }

    impl LightSource for Photoresistor {
        async fn read(&mut self) -> Result<i32, Fault> {
            let ch = self.channel.as_mut().ok_or(Fault::Light(LightFault::Released))?;
            let vref = ch.adc.read(&mut ch.vrefint);
            let raw = ch.adc.read(&mut ch.pin);
            millivolts(raw, vref)
        }
    }

    impl Device for Photoresistor {
        fn name(&self) -> &'static str {
            "photoresistor"
        }

        async fn deinit(&mut self) -> Result<(), Fault> {
            // Dropping the driver switches the converter off
            self.channel = None;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_against_the_reference() {
        // 3.3 V supply: VREFINT ≈ 1502 counts
        assert_eq!(millivolts(1502, 1502), Ok(1210));
        assert_eq!(millivolts(0, 1502), Ok(0));
        assert_eq!(millivolts(4095, 1502), Ok(3298));
    }

    #[test]
    fn zero_reference_is_a_fault() {
        assert_eq!(millivolts(2000, 0), Err(Fault::Light(LightFault::Reference)));
    }
}

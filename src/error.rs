//! Fault taxonomy.
//!
//! Every peripheral call that can fail returns one of these. None of them is
//! retried: a fault during bring-up aborts startup, a fault afterwards halts
//! the firmware through [`fatal`].

use core::fmt;

/// Bring-up order. Teardown walks it backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Stage {
    Orientation,
    Speed,
    Light,
    Led,
}

impl Stage {
    pub const fn name(self) -> &'static str {
        match self {
            Stage::Orientation => "orientation",
            Stage::Speed => "speed",
            Stage::Light => "light",
            Stage::Led => "led",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Fault {
    /// Inertial sensor
    Imu(ImuFault),
    /// GPS receiver link
    Gps(GpsFault),
    /// Photoresistor ADC
    Light(LightFault),
    /// LED PWM channel
    Led(LedFault),
    /// Executor had no room for a task
    Spawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum ImuFault {
    /// SPI transfer failed
    Bus,
    /// WHO_AM_I answered with something other than an ICM-42688
    WrongIdentity(u8),
    /// No attitude estimate arrived in time
    NoSample,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum GpsFault {
    /// UART rejected the configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum LightFault {
    /// Internal reference sampled as zero; no millivolt conversion possible
    Reference,
    /// Read after the ADC was released
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum LedFault {
    /// Duty written to a channel that was already released
    ChannelDisabled,
    /// Timer reports a zero period
    NoPeriod,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Imu(ImuFault::Bus) => f.write_str("imu: spi transfer failed"),
            Fault::Imu(ImuFault::WrongIdentity(id)) => write!(f, "imu: unexpected WHO_AM_I {:#04x}", id),
            Fault::Imu(ImuFault::NoSample) => f.write_str("imu: no attitude sample"),
            Fault::Gps(GpsFault::Config) => f.write_str("gps: uart configuration rejected"),
            Fault::Light(LightFault::Reference) => f.write_str("light: vrefint read as zero"),
            Fault::Light(LightFault::Released) => f.write_str("light: adc released"),
            Fault::Led(LedFault::ChannelDisabled) => f.write_str("led: channel disabled"),
            Fault::Led(LedFault::NoPeriod) => f.write_str("led: timer has no period"),
            Fault::Spawn => f.write_str("executor: task spawn failed"),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bring-up stopped at `stage`; earlier stages have been released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct StartupError {
    pub stage: Stage,
    pub fault: Fault,
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "startup failed at {}: {}", self.stage, self.fault)
    }
}

/// Terminal path: one diagnostic line, then panic. On the board
/// `panic-probe` halts the core.
pub fn fatal(fault: Fault) -> ! {
    log_error!("fatal: {}", fault);
    panic!("fatal peripheral fault");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_peripheral() {
        let msg = std::format!("{}", Fault::Imu(ImuFault::WrongIdentity(0x12)));
        assert_eq!(msg, "imu: unexpected WHO_AM_I 0x12");

        let err = StartupError { stage: Stage::Light, fault: Fault::Light(LightFault::Reference) };
        assert_eq!(std::format!("{}", err), "startup failed at light: light: vrefint read as zero");
    }

    #[test]
    #[should_panic(expected = "fatal peripheral fault")]
    fn fatal_terminates() {
        fatal(Fault::Led(LedFault::ChannelDisabled));
    }
}

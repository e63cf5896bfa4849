/// Build-time configuration.
///
/// Everything the indicator can be tuned with lives here; nothing is
/// adjustable at runtime.
use crate::level::{LevelConfig, ReleaseRule};

// ── Level detection ───────────────────────────────────────────────────────────

/// Combined pitch/roll magnitude (degrees) at which the vehicle counts as out of level.
pub const THRESHOLD_ANGLE_DEG: f32 = 8.0;
/// Lower edge of the speed band (m/s) in which the alarm may trip.
pub const LOWER_SPEED_MPS: f32 = 3.0;
/// Upper edge of the speed band (m/s).
pub const UPPER_SPEED_MPS: f32 = 10.0;

/// `Latching` keeps the as-built release condition, which can never hold
/// for a scalar speed. Switch to `ReleaseRule::TiltOrSpeed` to let the alarm
/// clear once the vehicle is level again or leaves the speed band.
pub const RELEASE_RULE: ReleaseRule = ReleaseRule::Latching;

pub const LEVEL: LevelConfig = LevelConfig {
    threshold_deg: THRESHOLD_ANGLE_DEG,
    min_speed_mps: LOWER_SPEED_MPS,
    max_speed_mps: UPPER_SPEED_MPS,
    release: RELEASE_RULE,
};

/// Age after which the last GPS speed reads as standstill. `None` keeps the
/// last fix forever.
pub const SPEED_STALE_AFTER_MS: Option<u64> = None;

// ── Timing ────────────────────────────────────────────────────────────────────

/// Main loop cadence. Must not divide evenly into `FLASH_PERIOD_MS`, or the
/// light sample keeps landing on the same LED phase.
pub const POLL_PERIOD_MS: u64 = 600;
/// Flash timer period; the LED changes state once per period.
pub const FLASH_PERIOD_MS: u64 = 2000;
/// Attitude filter update rate.
pub const ATTITUDE_RATE_HZ: u64 = 100;
/// How long bring-up waits for the first attitude estimate.
pub const ATTITUDE_FIRST_SAMPLE_TIMEOUT_MS: u64 = 500;
/// Static gyro calibration at boot: samples × 10 ms.
pub const GYRO_CALIB_SAMPLES: usize = 100;

// ── Brightness mapping ────────────────────────────────────────────────────────

/// Photoresistor reading (mV) that maps to 0 % before clamping.
pub const LIGHT_OFFSET_MV: f32 = 500.0;
/// Span (mV) from 0 % to 100 %.
pub const LIGHT_SPAN_MV: f32 = 2598.0;
/// Lower brightness clamp so the LED never goes invisible.
pub const MIN_BRIGHTNESS: f32 = 0.1;

// ── Peripherals ───────────────────────────────────────────────────────────────

/// LED PWM carrier frequency.
pub const PWM_FREQ_HZ: u32 = 50_000;
/// GPS UART baud rate (receiver default).
pub const GPS_BAUD: u32 = 9600;

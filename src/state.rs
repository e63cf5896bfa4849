/// Shared state types for inter-task communication.
///
/// The value types are `Copy` so they can go through signals and atomics
/// without borrowing across contexts.
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
#[allow(unused_imports)]
use micromath::F32Ext;

use crate::error::Fault;

// ── Data types ────────────────────────────────────────────────────────────────

/// Vehicle attitude in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct Orientation {
    pub pitch_deg: f32,
    pub roll_deg: f32,
}

impl Orientation {
    pub const LEVEL: Self = Self { pitch_deg: 0.0, roll_deg: 0.0 };

    pub const fn new(pitch_deg: f32, roll_deg: f32) -> Self {
        Self { pitch_deg, roll_deg }
    }

    /// Squared combined tilt; compared against a squared threshold so the
    /// boundary does not depend on the `sqrt` approximation.
    pub fn tilt_sq(&self) -> f32 {
        self.pitch_deg * self.pitch_deg + self.roll_deg * self.roll_deg
    }

    /// Combined tilt, Euclidean norm of pitch and roll.
    pub fn tilt_deg(&self) -> f32 {
        self.tilt_sq().sqrt()
    }
}

/// One ground-speed report from the GPS.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct SpeedFix {
    pub mps: f32,
    /// Uptime when the sentence was parsed.
    pub at_ms: u64,
}

/// LED duty on the 10-bit scale the rest of the firmware speaks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct Duty(u16);

impl Duty {
    pub const OFF: Self = Self(0);
    pub const MAX: Self = Self(1023);

    /// Values above 1023 saturate.
    pub const fn saturating(raw: u16) -> Self {
        if raw > Self::MAX.0 {
            Self::MAX
        } else {
            Self(raw)
        }
    }

    pub const fn get(self) -> u16 {
        self.0
    }

    pub const fn is_off(self) -> bool {
        self.0 == 0
    }
}

/// What the main loop asks of the flash task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct LedCommand {
    pub enabled: bool,
    pub duty: Duty,
}

impl LedCommand {
    const ENABLED_BIT: u32 = 1 << 31;

    const fn pack(self) -> u32 {
        let flag = if self.enabled { Self::ENABLED_BIT } else { 0 };
        flag | self.duty.0 as u32
    }

    const fn unpack(word: u32) -> Self {
        Self {
            enabled: word & Self::ENABLED_BIT != 0,
            duty: Duty::saturating(word as u16),
        }
    }
}

// ── LED link ──────────────────────────────────────────────────────────────────

/// Main loop ⇄ flash task contract.
///
/// `enabled` and `duty` share one word, so the flash task never sees a duty
/// from one poll paired with the enable flag of another. `lit` flows the
/// other way and gates light sampling.
pub struct LedLink {
    command: AtomicU32,
    lit: AtomicBool,
}

impl LedLink {
    pub const fn new() -> Self {
        Self {
            command: AtomicU32::new(0),
            lit: AtomicBool::new(false),
        }
    }

    pub fn publish(&self, command: LedCommand) {
        self.command.store(command.pack(), Ordering::Release);
    }

    pub fn command(&self) -> LedCommand {
        LedCommand::unpack(self.command.load(Ordering::Acquire))
    }

    pub fn set_lit(&self, lit: bool) {
        self.lit.store(lit, Ordering::Release);
    }

    pub fn is_lit(&self) -> bool {
        self.lit.load(Ordering::Acquire)
    }
}

impl Default for LedLink {
    fn default() -> Self {
        Self::new()
    }
}

// ── Task teardown ─────────────────────────────────────────────────────────────

/// Stop handshake with one background task. The task owns its peripheral, so
/// it releases it itself and reports back how that went.
pub struct Shutdown {
    request: Signal<CriticalSectionRawMutex, ()>,
    done: Signal<CriticalSectionRawMutex, Result<(), Fault>>,
}

impl Shutdown {
    pub const fn new() -> Self {
        Self {
            request: Signal::new(),
            done: Signal::new(),
        }
    }

    /// Ask the task to stop and wait until it has released its peripheral.
    pub async fn stop(&self) -> Result<(), Fault> {
        self.request.signal(());
        self.done.wait().await
    }

    /// Task side: resolves once a stop has been asked for.
    pub async fn requested(&self) {
        self.request.wait().await
    }

    /// Task side: last call before the task returns.
    pub fn finished(&self, result: Result<(), Fault>) {
        self.done.signal(result);
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

// ── Statics ───────────────────────────────────────────────────────────────────

pub static LED_LINK: LedLink = LedLink::new();

/// Latest speed fix; a newer fix overwrites an unread one.
pub static SPEED_FIX: Signal<CriticalSectionRawMutex, SpeedFix> = Signal::new();

/// Latest attitude estimate, or the fault that stopped the attitude task.
pub static ATTITUDE: Signal<CriticalSectionRawMutex, Result<Orientation, Fault>> = Signal::new();

pub static ATTITUDE_SHUTDOWN: Shutdown = Shutdown::new();
pub static GPS_SHUTDOWN: Shutdown = Shutdown::new();
pub static LED_SHUTDOWN: Shutdown = Shutdown::new();

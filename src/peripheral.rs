//! Contracts between the core and the peripherals it drives.
//!
//! Each peripheral is acquired by its own async constructor and released
//! through [`Device::deinit`]. Reads either succeed or return a [`Fault`];
//! callers never retry.

use crate::error::Fault;
use crate::state::{Duty, Orientation};

#[allow(async_fn_in_trait)]
pub trait Device {
    fn name(&self) -> &'static str;

    async fn deinit(&mut self) -> Result<(), Fault>;
}

#[allow(async_fn_in_trait)]
pub trait OrientationSource {
    async fn read(&mut self) -> Result<Orientation, Fault>;
}

#[allow(async_fn_in_trait)]
pub trait LightSource {
    /// Calibrated reading in millivolts; waits for the conversion.
    async fn read(&mut self) -> Result<i32, Fault>;
}

/// LED output stage. Called from the flash task, so neither method may block.
pub trait DutyOutput {
    fn apply(&mut self, duty: Duty) -> Result<(), Fault>;

    fn disable(&mut self) -> Result<(), Fault>;
}

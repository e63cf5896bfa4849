//! Vehicle level indicator.
//!
//! Flashes a status LED while the vehicle is tilted past a threshold and
//! moving within a speed band, with LED brightness following ambient light.
//! Everything outside `board`, `tasks`, `usb` and the SPI IMU driver builds
//! and tests on the host.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod logging;

pub mod brightness;
pub mod config;
pub mod drivers;
pub mod error;
pub mod flash;
pub mod level;
pub mod monitor;
pub mod peripheral;
pub mod speed;
pub mod state;
pub mod supervisor;

#[cfg(target_os = "none")]
pub mod board;
#[cfg(target_os = "none")]
pub mod tasks;
#[cfg(target_os = "none")]
pub mod usb;

//! Logging macros shared by the library and both binaries.
//!
//! - Target (`target_os = "none"`): `defmt` over RTT
//! - Host unit tests: `println!`
//! - Other host builds: arguments are type-checked and discarded
//!
//! Format strings must stay within the subset both `defmt` and `core::fmt`
//! accept: plain `{}` placeholders, no width or precision.

#[cfg(target_os = "none")]
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { defmt::error!($($arg)*) };
}

#[cfg(target_os = "none")]
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { defmt::warn!($($arg)*) };
}

#[cfg(target_os = "none")]
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { defmt::info!($($arg)*) };
}

#[cfg(target_os = "none")]
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { defmt::debug!($($arg)*) };
}

#[cfg(all(not(target_os = "none"), test))]
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { std::println!("[ERROR] {}", format_args!($($arg)*)) };
}

#[cfg(all(not(target_os = "none"), test))]
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { std::println!("[WARN] {}", format_args!($($arg)*)) };
}

#[cfg(all(not(target_os = "none"), test))]
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { std::println!("[INFO] {}", format_args!($($arg)*)) };
}

#[cfg(all(not(target_os = "none"), test))]
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { std::println!("[DEBUG] {}", format_args!($($arg)*)) };
}

#[cfg(all(not(target_os = "none"), not(test)))]
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{ let _ = core::format_args!($($arg)*); }};
}

#[cfg(all(not(target_os = "none"), not(test)))]
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{ let _ = core::format_args!($($arg)*); }};
}

#[cfg(all(not(target_os = "none"), not(test)))]
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{ let _ = core::format_args!($($arg)*); }};
}

#[cfg(all(not(target_os = "none"), not(test)))]
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{ let _ = core::format_args!($($arg)*); }};
}

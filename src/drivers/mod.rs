pub mod ahrs;
pub mod gps;
pub mod led_pwm;
pub mod photoresistor;

#[cfg(target_os = "none")]
pub mod icm42688;

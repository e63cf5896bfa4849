pub mod attitude_task;
pub mod flash_task;
pub mod gps_task;

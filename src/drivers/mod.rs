//! Output drivers, button input, probe bus and on-board peripherals.

pub mod button;
pub mod ds18b20;
pub mod relay;
pub mod status_led;
pub mod task_pin;
pub mod watchdog;

//! Closed-loop actuator control.

pub mod thermostat;

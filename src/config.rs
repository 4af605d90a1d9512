//! Session configuration parameters
//!
//! Operator-tunable durations, setpoints and control tolerances. Loaded
//! once at boot from NVS and mutable through the settings setters on
//! [`BrewService`](crate::app::service::BrewService).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Operator-tunable brewing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    // --- Stage durations (seconds) ---
    pub mash_secs: u32,
    pub mash_out_secs: u32,
    pub boil_secs: u32,
    /// Warm-up countdown between mash-out and the boil.
    pub boil_heatup_secs: u32,

    // --- Setpoints (Celsius) ---
    pub mash_setpoint_c: f32,
    pub mash_out_setpoint_c: f32,
    /// Tolerance below the mash setpoint at which the mash gate opens.
    pub hysteresis_c: f32,
    /// Margin above the setpoint for the valve probe heat cut-off.
    pub valve_offset_c: f32,

    // --- Heat control ---
    /// Minimum time between two heat-valve switches.
    pub heat_dwell_secs: u16,

    // --- Presentation ---
    /// Offset applied to epoch seconds when formatting wall-clock times.
    pub utc_offset_secs: i32,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Telemetry report interval (seconds)
    pub telemetry_interval_secs: u32,
    /// Button hold that starts mashing (milliseconds)
    pub long_press_ms: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mash_secs: 90 * 60,
            mash_out_secs: 10 * 60,
            boil_secs: 60 * 60,
            boil_heatup_secs: 10 * 60,

            mash_setpoint_c: 64.0,
            mash_out_setpoint_c: 75.0,
            hysteresis_c: 1.0,
            valve_offset_c: 5.0,

            heat_dwell_secs: 5,

            utc_offset_secs: 3600, // CET

            control_loop_interval_ms: 500, // 2 Hz
            telemetry_interval_secs: 30,
            long_press_ms: 3000,
        }
    }
}

impl SessionConfig {
    /// Range-check every field. Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(60..=6 * 3600).contains(&self.mash_secs) {
            return Err(ConfigError::ValidationFailed("mash_secs must be 60–21600"));
        }
        if !(60..=3600).contains(&self.mash_out_secs) {
            return Err(ConfigError::ValidationFailed(
                "mash_out_secs must be 60–3600",
            ));
        }
        if !(60..=4 * 3600).contains(&self.boil_secs) {
            return Err(ConfigError::ValidationFailed("boil_secs must be 60–14400"));
        }
        if !(60..=2 * 3600).contains(&self.boil_heatup_secs) {
            return Err(ConfigError::ValidationFailed(
                "boil_heatup_secs must be 60–7200",
            ));
        }
        if !(30.0..=80.0).contains(&self.mash_setpoint_c) {
            return Err(ConfigError::ValidationFailed(
                "mash_setpoint_c must be 30.0–80.0",
            ));
        }
        if !(60.0..=90.0).contains(&self.mash_out_setpoint_c) {
            return Err(ConfigError::ValidationFailed(
                "mash_out_setpoint_c must be 60.0–90.0",
            ));
        }
        if !(0.0..=5.0).contains(&self.hysteresis_c) {
            return Err(ConfigError::ValidationFailed(
                "hysteresis_c must be 0.0–5.0",
            ));
        }
        if !(0.0..=30.0).contains(&self.valve_offset_c) {
            return Err(ConfigError::ValidationFailed(
                "valve_offset_c must be 0.0–30.0",
            ));
        }
        if !(1..=60).contains(&self.heat_dwell_secs) {
            return Err(ConfigError::ValidationFailed(
                "heat_dwell_secs must be 1–60",
            ));
        }
        if !(-12 * 3600..=14 * 3600).contains(&self.utc_offset_secs) {
            return Err(ConfigError::ValidationFailed(
                "utc_offset_secs must be -43200–50400",
            ));
        }
        if !(100..=5000).contains(&self.control_loop_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "control_loop_interval_ms must be 100–5000",
            ));
        }
        if !(5..=3600).contains(&self.telemetry_interval_secs) {
            return Err(ConfigError::ValidationFailed(
                "telemetry_interval_secs must be 5–3600",
            ));
        }
        if !(1000..=10_000).contains(&self.long_press_ms) {
            return Err(ConfigError::ValidationFailed(
                "long_press_ms must be 1000–10000",
            ));
        }
        Ok(())
    }

    /// Dwell between heat switches in milliseconds.
    pub fn heat_dwell_ms(&self) -> u64 {
        u64::from(self.heat_dwell_secs) * 1000
    }
}

/// A single settable field, as sent by the settings page or serial console.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigField {
    MashSecs(u32),
    MashOutSecs(u32),
    BoilSecs(u32),
    BoilHeatupSecs(u32),
    MashSetpoint(f32),
    MashOutSetpoint(f32),
    Hysteresis(f32),
    ValveOffset(f32),
}

impl SessionConfig {
    /// Return a copy with `field` applied. The caller validates the result.
    pub fn with_field(&self, field: ConfigField) -> Self {
        let mut next = self.clone();
        match field {
            ConfigField::MashSecs(v) => next.mash_secs = v,
            ConfigField::MashOutSecs(v) => next.mash_out_secs = v,
            ConfigField::BoilSecs(v) => next.boil_secs = v,
            ConfigField::BoilHeatupSecs(v) => next.boil_heatup_secs = v,
            ConfigField::MashSetpoint(v) => next.mash_setpoint_c = v,
            ConfigField::MashOutSetpoint(v) => next.mash_out_setpoint_c = v,
            ConfigField::Hysteresis(v) => next.hysteresis_c = v,
            ConfigField::ValveOffset(v) => next.valve_offset_c = v,
        }
        next
    }
}

//! DS18B20 temperature probe plausibility filter and latest-value cell.
//!
//! The one-wire conversion itself (750 ms at 12-bit resolution) runs in
//! the probe task and publishes each result into a [`ProbeCell`]. The
//! control loop only ever reads the cell, so a slow or hung bus never
//! stalls `tick()`.

use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::error::SensorError;

/// Value the DS18B20 library reports for a probe that did not answer.
pub const DISCONNECTED_C: f32 = -127.0;

/// Exclusive plausibility bounds for a brewing probe.
const MIN_PLAUSIBLE_C: f32 = -50.0;
const MAX_PLAUSIBLE_C: f32 = 150.0;

/// Accept a raw conversion result or classify why it is unusable.
pub fn validate_celsius(raw: f32) -> Result<f32, SensorError> {
    if raw.is_nan() {
        return Err(SensorError::NoReading);
    }
    if raw == DISCONNECTED_C {
        return Err(SensorError::Disconnected);
    }
    if !raw.is_finite() || raw <= MIN_PLAUSIBLE_C || raw >= MAX_PLAUSIBLE_C {
        return Err(SensorError::OutOfRange);
    }
    Ok(raw)
}

/// Lock-free single-value mailbox shared between the probe task (writer)
/// and the hardware adapter (reader). Holds `f32` bits; starts as NaN.
#[derive(Debug, Clone)]
pub struct ProbeCell {
    bits: Arc<AtomicU32>,
}

impl Default for ProbeCell {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeCell {
    pub fn new() -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(f32::NAN.to_bits())),
        }
    }

    /// Publish the latest raw conversion (may be the disconnected sentinel).
    pub fn publish(&self, celsius: f32) {
        self.bits.store(celsius.to_bits(), Ordering::Release);
    }

    /// Mark the probe as having no current reading.
    pub fn invalidate(&self) {
        self.publish(f32::NAN);
    }

    /// Latest raw value as published.
    pub fn raw(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Latest value, filtered for plausibility.
    pub fn read(&self) -> Result<f32, SensorError> {
        validate_celsius(self.raw())
    }
}

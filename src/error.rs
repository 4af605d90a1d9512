//! Unified error types for the brew controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! control loop's error handling uniform. All variants are `Copy` so they
//! can be handed back from `tick()` and operator commands without
//! allocation.
//!
//! Faults that never abort anything (a flaky probe, the valve ceiling
//! tripping, a checkpoint that could not be written) are additionally
//! tracked as a [`BrewFault`] bitmask so presentation layers can poll them.

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A checkpoint or config write did not reach flash. The in-RAM state
    /// transition that triggered it has still been applied.
    Persistence(StorageError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persistence(e) => write!(f, "persistence: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Persistence(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Why a probe has no usable reading. Reported, never propagated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The probe reported the DS18B20 "disconnected" sentinel.
    Disconnected,
    /// Reading is outside the physically plausible range.
    OutOfRange,
    /// No conversion has been published yet.
    NoReading,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "probe disconnected"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::NoReading => write!(f, "no reading yet"),
        }
    }
}

// ---------------------------------------------------------------------------
// Non-fatal faults
// ---------------------------------------------------------------------------

/// Conditions that are reported but never pause or abort a session.
/// Accumulated in a bitfield by the [`FaultMonitor`](crate::safety::FaultMonitor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BrewFault {
    /// Kettle probe reading absent or implausible.
    KettleProbe = 0b0000_0001,
    /// Valve (return line) probe reading absent or implausible.
    ValveProbe = 0b0000_0010,
    /// Valve probe at or above `setpoint + valve_offset`; heat is held off.
    ValveCeiling = 0b0000_0100,
    /// The last checkpoint write failed; a reboot may not recover the session.
    CheckpointUnsaved = 0b0000_1000,
}

impl BrewFault {
    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for BrewFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KettleProbe => write!(f, "kettle probe fault"),
            Self::ValveProbe => write!(f, "valve probe fault"),
            Self::ValveCeiling => write!(f, "valve temperature ceiling"),
            Self::CheckpointUnsaved => write!(f, "checkpoint not saved"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BrewService (domain)
//! ```
//!
//! Driven adapters (clock, probes, relays, event sinks, storage) implement
//! these traits. The [`BrewService`](super::service::BrewService) consumes
//! them via generics, so the brew state machine never touches hardware
//! directly.
//!
//! ## Durability
//!
//! - **ConfigPort** and **CheckpointPort** writes MUST be visible after a
//!   power cycle once the call returns `Ok`.
//! - **ConfigPort** implementations MUST validate before persisting.

use crate::checkpoint::Checkpoint;
use crate::config::SessionConfig;
use crate::sensors::ProbeReadings;

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: system timers → domain)
// ───────────────────────────────────────────────────────────────

/// One sample of both time bases, taken together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    /// Monotonic milliseconds since boot. Compared with wrapping arithmetic.
    pub mono_ms: u64,
    /// Wall-clock seconds since the Unix epoch, `None` until time sync.
    pub epoch_secs: Option<u64>,
}

impl Timestamp {
    pub const fn new(mono_ms: u64, epoch_secs: Option<u64>) -> Self {
        Self {
            mono_ms,
            epoch_secs,
        }
    }
}

/// Monotonic and wall-clock time source.
pub trait ClockPort {
    /// Milliseconds since boot, monotonic.
    fn monotonic_ms(&self) -> u64;

    /// Seconds since the Unix epoch. `None` while the wall clock has not
    /// been synchronised; checkpoint recovery treats that as "reject".
    fn epoch_secs(&self) -> Option<u64>;

    /// Sample both time bases.
    fn now(&self) -> Timestamp {
        Timestamp::new(self.monotonic_ms(), self.epoch_secs())
    }
}

// ───────────────────────────────────────────────────────────────
// Temperature port (driven adapter: probes → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: returns the latest already-available probe readings.
/// Must not block on a conversion.
pub trait TemperaturePort {
    fn read_probes(&mut self) -> ProbeReadings;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port plus the debounced confirmation input.
/// All setters are idempotent.
pub trait ActuatorPort {
    /// Open or close the heat source (gas valve relay).
    fn set_heat(&mut self, on: bool);

    /// Run or stop the circulation pump.
    fn set_pump(&mut self, on: bool);

    /// Sound or silence the confirmation buzzer.
    fn set_alert(&mut self, on: bool);

    /// `true` at most once per physical press; debounced by the adapter.
    fn confirmation_edge(&mut self) -> bool;

    /// Kill heat, pump and buzzer for a safe shutdown.
    fn all_off(&mut self) {
        self.set_heat(false);
        self.set_pump(false);
        self.set_alert(false);
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log, web
/// socket, display, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists session configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SessionConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SessionConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &SessionConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Checkpoint port (driven adapter: domain ↔ recovery record)
// ───────────────────────────────────────────────────────────────

/// Persists the brew-session recovery record.
pub trait CheckpointPort {
    /// Read the stored checkpoint. A missing or undecodable record is
    /// reported as [`Checkpoint::EMPTY`], never as an error.
    fn load_checkpoint(&self) -> Checkpoint;

    /// Write and commit the checkpoint.
    fn save_checkpoint(&mut self, checkpoint: &Checkpoint) -> Result<(), StorageError>;

    /// Replace the stored record with the sentinel.
    fn clear_checkpoint(&mut self) -> Result<(), StorageError> {
        self.save_checkpoint(&Checkpoint::EMPTY)
    }
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage underneath the config and checkpoint ports.
///
/// Write operations MUST be atomic, with no partial writes on power loss.
/// The ESP-IDF NVS API guarantees this natively; in-memory simulation
/// achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] and [`CheckpointPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error (write or commit failed).
    IoError,
    /// Record could not be encoded.
    Encode,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::Encode => write!(f, "encode failed"),
        }
    }
}

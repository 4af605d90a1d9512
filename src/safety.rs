//! Non-fatal fault monitor.
//!
//! The monitor runs every tick after the stage logic and keeps a
//! [`BrewFault`] bitmask that presentation layers poll. Unlike a safety
//! supervisor it never changes the stage: a flaky probe suppresses the
//! affected heat decision inside the thermostat, and the brew continues.
//!
//! ## Fault lifecycle
//!
//! 1. A condition raises a fault bit (logged once, at `warn`).
//! 2. The bit stays set while the condition holds.
//! 3. When the condition clears, the bit is cleared (logged at `info`).
//!
//! `CheckpointUnsaved` is driven by the service from the outcome of each
//! checkpoint write instead of from readings.

use log::{info, warn};

use crate::error::BrewFault;
use crate::sensors::ProbeReadings;

#[derive(Debug, Default)]
pub struct FaultMonitor {
    faults: u8,
}

impl FaultMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-evaluate probe faults and the valve ceiling.
    ///
    /// `setpoint_c` is the active heating setpoint, `None` when no
    /// thermostat-controlled stage is running (the ceiling is then moot).
    /// Returns the updated bitmask.
    pub fn evaluate(
        &mut self,
        readings: &ProbeReadings,
        setpoint_c: Option<f32>,
        valve_offset_c: f32,
    ) -> u8 {
        self.set(BrewFault::KettleProbe, readings.kettle.is_none());
        self.set(BrewFault::ValveProbe, readings.valve.is_none());

        let ceiling_hit = match (setpoint_c, readings.valve) {
            (Some(sp), Some(valve)) => valve >= sp + valve_offset_c,
            _ => false,
        };
        self.set(BrewFault::ValveCeiling, ceiling_hit);

        self.faults
    }

    /// Set or clear a fault bit based on a boolean condition.
    pub fn set(&mut self, fault: BrewFault, active: bool) {
        let was = self.has_fault(fault);
        if active {
            if !was {
                warn!("FAULT SET: {fault}");
            }
            self.faults |= fault.mask();
        } else {
            if was {
                info!("FAULT CLEARED: {fault}");
            }
            self.faults &= !fault.mask();
        }
    }

    pub fn faults(&self) -> u8 {
        self.faults
    }

    pub fn has_fault(&self, fault: BrewFault) -> bool {
        self.faults & fault.mask() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_probes_raise_and_clear() {
        let mut m = FaultMonitor::new();
        let flags = m.evaluate(&ProbeReadings::new(None, Some(60.0)), Some(64.0), 5.0);
        assert_eq!(flags, BrewFault::KettleProbe.mask());

        m.evaluate(&ProbeReadings::new(Some(60.0), Some(60.0)), Some(64.0), 5.0);
        assert_eq!(m.faults(), 0);
    }

    #[test]
    fn ceiling_only_counts_with_a_setpoint() {
        let mut m = FaultMonitor::new();
        let hot = ProbeReadings::new(Some(60.0), Some(69.0));
        m.evaluate(&hot, Some(64.0), 5.0);
        assert!(m.has_fault(BrewFault::ValveCeiling));

        m.evaluate(&hot, None, 5.0);
        assert!(!m.has_fault(BrewFault::ValveCeiling));
    }

    #[test]
    fn checkpoint_fault_survives_probe_evaluation() {
        let mut m = FaultMonitor::new();
        m.set(BrewFault::CheckpointUnsaved, true);
        m.evaluate(&ProbeReadings::new(Some(60.0), Some(60.0)), None, 5.0);
        assert!(m.has_fault(BrewFault::CheckpointUnsaved));
        m.set(BrewFault::CheckpointUnsaved, false);
        assert_eq!(m.faults(), 0);
    }
}

//! On/off heat-source controller with valve-probe ceiling and switch dwell.
//!
//! The heat source is a gas valve behind a mechanical relay, so the
//! controller is bang-bang rather than proportional. Every switch is
//! separated by at least `dwell_ms`, however fast the control loop runs.
//!
//! Rule order per tick (once the dwell has elapsed):
//!
//! 1. valve probe ≥ `setpoint + valve_offset` → OFF
//! 2. kettle probe < `setpoint` → ON
//! 3. otherwise → OFF
//!
//! A missing kettle reading holds the current state. A missing valve
//! reading means the ceiling cannot be checked, so heat is never switched
//! ON on that tick.

use log::{debug, info};

use crate::sensors::ProbeReadings;

/// Heat-valve controller state.
#[derive(Debug, Clone, Default)]
pub struct HeatController {
    heat_on: bool,
    /// Monotonic ms of the last switch; `None` until the first one.
    last_switch_ms: Option<u64>,
}

impl HeatController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently commanded heat state.
    pub fn is_on(&self) -> bool {
        self.heat_on
    }

    /// Monotonic time of the last switch, if any.
    pub fn last_switch_ms(&self) -> Option<u64> {
        self.last_switch_ms
    }

    /// Apply the thermostat rules against `setpoint_c`.
    /// Returns the commanded heat state after this tick.
    pub fn regulate(
        &mut self,
        now_ms: u64,
        dwell_ms: u64,
        readings: ProbeReadings,
        setpoint_c: f32,
        valve_offset_c: f32,
    ) -> bool {
        if !self.dwell_elapsed(now_ms, dwell_ms) {
            return self.heat_on;
        }

        if let Some(valve) = readings.valve {
            if valve >= setpoint_c + valve_offset_c {
                self.switch(now_ms, false);
                return self.heat_on;
            }
        }

        let Some(kettle) = readings.kettle else {
            return self.heat_on;
        };

        let want = kettle < setpoint_c;
        if want && readings.valve.is_none() {
            debug!("heat: valve probe missing, not switching on");
            return self.heat_on;
        }
        self.switch(now_ms, want);
        self.heat_on
    }

    /// Drive heat to `on` regardless of temperature, still honouring the dwell.
    pub fn force(&mut self, now_ms: u64, dwell_ms: u64, on: bool) -> bool {
        if on != self.heat_on && self.dwell_elapsed(now_ms, dwell_ms) {
            self.switch(now_ms, on);
        }
        self.heat_on
    }

    /// Operator action (stop, pause, reset, manual toggle): switch at once.
    pub fn set_immediate(&mut self, now_ms: u64, on: bool) {
        self.switch(now_ms, on);
    }

    fn dwell_elapsed(&self, now_ms: u64, dwell_ms: u64) -> bool {
        match self.last_switch_ms {
            None => true,
            Some(t) => now_ms.wrapping_sub(t) >= dwell_ms,
        }
    }

    fn switch(&mut self, now_ms: u64, on: bool) {
        if on == self.heat_on {
            return;
        }
        self.heat_on = on;
        self.last_switch_ms = Some(now_ms);
        info!("heat: {}", if on { "ON" } else { "OFF" });
    }
}

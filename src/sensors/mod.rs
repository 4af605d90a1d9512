//! Sensor subsystem: probe filtering and the aggregating [`TemperatureHub`].
//!
//! The hub owns the two probe cells and produces a [`ProbeReadings`]
//! snapshot each tick. A probe that is absent or implausible reads as
//! `None`; the control policy decides what that means.

pub mod probe_task;
pub mod temperature;

use log::warn;

use crate::error::SensorError;
use temperature::ProbeCell;

/// The two logical probes on the kettle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Wort temperature in the kettle.
    Kettle,
    /// Return-line temperature after the heat exchanger valve.
    Valve,
}

/// A point-in-time snapshot of both probes (°C).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProbeReadings {
    pub kettle: Option<f32>,
    pub valve: Option<f32>,
}

impl ProbeReadings {
    pub const fn new(kettle: Option<f32>, valve: Option<f32>) -> Self {
        Self { kettle, valve }
    }

    pub fn get(&self, probe: Probe) -> Option<f32> {
        match probe {
            Probe::Kettle => self.kettle,
            Probe::Valve => self.valve,
        }
    }
}

/// Aggregates both probe cells and produces a unified snapshot.
pub struct TemperatureHub {
    kettle: ProbeCell,
    valve: ProbeCell,
    /// Last error per probe, so a persistent fault is logged once.
    kettle_err: Option<SensorError>,
    valve_err: Option<SensorError>,
}

impl TemperatureHub {
    /// Construct a hub over cells whose writer halves belong to the probe task.
    pub fn new(kettle: ProbeCell, valve: ProbeCell) -> Self {
        Self {
            kettle,
            valve,
            kettle_err: None,
            valve_err: None,
        }
    }

    /// Read both probes. Never blocks.
    pub fn read_all(&mut self) -> ProbeReadings {
        let kettle = Self::read_one(Probe::Kettle, &self.kettle, &mut self.kettle_err);
        let valve = Self::read_one(Probe::Valve, &self.valve, &mut self.valve_err);
        ProbeReadings { kettle, valve }
    }

    fn read_one(probe: Probe, cell: &ProbeCell, last_err: &mut Option<SensorError>) -> Option<f32> {
        match cell.read() {
            Ok(c) => {
                *last_err = None;
                Some(c)
            }
            Err(e) => {
                if *last_err != Some(e) {
                    warn!("{:?} probe: {}", probe, e);
                }
                *last_err = Some(e);
                None
            }
        }
    }
}

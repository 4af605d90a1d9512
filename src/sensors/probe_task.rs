//! Background conversion loop feeding the probe cells.
//!
//! Both probes convert in parallel; after the conversion time each result
//! is published to its [`ProbeCell`], or the cell is invalidated when the
//! bus fails. The control loop only ever reads the cells.

use core::fmt::Debug;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, warn};

use super::temperature::ProbeCell;
use super::Probe;
use crate::drivers::ds18b20::{CONVERSION_MS, Ds18b20, OneWireError};

/// A single-probe bus with split conversion.
pub trait ProbeBus {
    type Error: Debug;
    fn start_conversion(&mut self) -> Result<(), Self::Error>;
    fn read_celsius(&mut self) -> Result<f32, Self::Error>;
}

impl<P, D> ProbeBus for Ds18b20<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    type Error = OneWireError<P::Error>;

    fn start_conversion(&mut self) -> Result<(), Self::Error> {
        Ds18b20::start_conversion(self)
    }

    fn read_celsius(&mut self) -> Result<f32, Self::Error> {
        Ds18b20::read_celsius(self)
    }
}

struct Channel<B> {
    probe: Probe,
    bus: B,
    cell: ProbeCell,
    failing: bool,
}

impl<B: ProbeBus> Channel<B> {
    fn start(&mut self) -> bool {
        match self.bus.start_conversion() {
            Ok(()) => true,
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    fn finish(&mut self) {
        match self.bus.read_celsius() {
            Ok(c) => {
                if self.failing {
                    debug!("{:?} probe: bus recovered", self.probe);
                }
                self.failing = false;
                self.cell.publish(c);
            }
            Err(e) => self.fail(&e),
        }
    }

    fn fail(&mut self, e: &B::Error) {
        if !self.failing {
            warn!("{:?} probe: bus error {:?}", self.probe, e);
        }
        self.failing = true;
        self.cell.invalidate();
    }
}

pub struct ProbeTask<K, V> {
    kettle: Channel<K>,
    valve: Channel<V>,
}

impl<K: ProbeBus, V: ProbeBus> ProbeTask<K, V> {
    pub fn new(kettle: (K, ProbeCell), valve: (V, ProbeCell)) -> Self {
        Self {
            kettle: Channel {
                probe: Probe::Kettle,
                bus: kettle.0,
                cell: kettle.1,
                failing: false,
            },
            valve: Channel {
                probe: Probe::Valve,
                bus: valve.0,
                cell: valve.1,
                failing: false,
            },
        }
    }

    /// One conversion round. `sleep_ms` must yield the CPU.
    pub fn cycle(&mut self, mut sleep_ms: impl FnMut(u32)) {
        let kettle_ok = self.kettle.start();
        let valve_ok = self.valve.start();
        sleep_ms(CONVERSION_MS);
        if kettle_ok {
            self.kettle.finish();
        }
        if valve_ok {
            self.valve.finish();
        }
    }

    pub fn run(mut self, mut sleep_ms: impl FnMut(u32)) -> ! {
        loop {
            self.cycle(&mut sleep_ms);
        }
    }
}

//! Hardware adapter, bridging real peripherals to the domain port traits.
//!
//! Owns the [`TemperatureHub`], the three relays and the confirmation
//! button, exposing them through [`TemperaturePort`] and [`ActuatorPort`].
//! Generic over `embedded-hal` pins so the same adapter runs on ESP-IDF
//! `PinDriver`s and on host test doubles.

use embedded_hal::digital::{InputPin, OutputPin};
use log::warn;

use crate::app::ports::{ActuatorPort, TemperaturePort};
use crate::drivers::button::{ButtonDriver, ButtonEvent};
use crate::drivers::relay::Relay;
use crate::sensors::{ProbeReadings, TemperatureHub};

/// Concrete adapter that combines all brew hardware behind port traits.
pub struct HardwareAdapter<O: OutputPin, I: InputPin> {
    probes: TemperatureHub,
    heat: Relay<O>,
    pump: Relay<O>,
    buzzer: Relay<O>,
    button: ButtonDriver<I>,
    pending_edge: bool,
}

impl<O: OutputPin, I: InputPin> HardwareAdapter<O, I> {
    pub fn new(
        probes: TemperatureHub,
        heat: Relay<O>,
        pump: Relay<O>,
        buzzer: Relay<O>,
        button: ButtonDriver<I>,
    ) -> Self {
        Self {
            probes,
            heat,
            pump,
            buzzer,
            button,
            pending_edge: false,
        }
    }

    /// Sample the button. A debounced press is queued as the next
    /// confirmation edge; the gesture is also returned so the caller can
    /// act on a long press.
    pub fn poll_button(&mut self, now_ms: u64) -> Option<ButtonEvent> {
        let event = self.button.poll(now_ms);
        if event == Some(ButtonEvent::Press) {
            self.pending_edge = true;
        }
        event
    }

    pub fn heat_on(&self) -> bool {
        self.heat.is_on()
    }

    pub fn pump_on(&self) -> bool {
        self.pump.is_on()
    }

    pub fn alert_on(&self) -> bool {
        self.buzzer.is_on()
    }
}

fn drive<P: OutputPin>(relay: &mut Relay<P>, on: bool) {
    if let Err(e) = relay.set(on) {
        warn!("{}: pin write failed: {:?}", relay.name(), e);
    }
}

// ── TemperaturePort implementation ────────────────────────────

impl<O: OutputPin, I: InputPin> TemperaturePort for HardwareAdapter<O, I> {
    fn read_probes(&mut self) -> ProbeReadings {
        self.probes.read_all()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<O: OutputPin, I: InputPin> ActuatorPort for HardwareAdapter<O, I> {
    fn set_heat(&mut self, on: bool) {
        drive(&mut self.heat, on);
    }

    fn set_pump(&mut self, on: bool) {
        drive(&mut self.pump, on);
    }

    fn set_alert(&mut self, on: bool) {
        drive(&mut self.buzzer, on);
    }

    fn confirmation_edge(&mut self) -> bool {
        core::mem::take(&mut self.pending_edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::relay::Polarity;
    use crate::sensors::temperature::ProbeCell;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Line(Rc<Cell<bool>>);

    impl ErrorType for Line {
        type Error = Infallible;
    }

    impl OutputPin for Line {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0.set(false);
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Infallible> {
            self.0.set(true);
            Ok(())
        }
    }

    impl InputPin for Line {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.0.get())
        }
        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.0.get())
        }
    }

    struct Bench {
        hw: HardwareAdapter<Line, Line>,
        heat: Line,
        button: Line,
        kettle: ProbeCell,
    }

    fn bench() -> Bench {
        let heat = Line::default();
        let button = Line(Rc::new(Cell::new(true)));
        let kettle = ProbeCell::new();
        let hub = TemperatureHub::new(kettle.clone(), ProbeCell::new());
        let hw = HardwareAdapter::new(
            hub,
            Relay::new("heat", heat.clone(), Polarity::ActiveLow),
            Relay::new("pump", Line::default(), Polarity::ActiveLow),
            Relay::new("buzzer", Line::default(), Polarity::ActiveHigh),
            ButtonDriver::new(button.clone(), 3000),
        );
        Bench {
            hw,
            heat,
            button,
            kettle,
        }
    }

    #[test]
    fn active_low_heat_relay() {
        let mut b = bench();
        b.hw.set_heat(true);
        assert!(b.hw.heat_on());
        assert!(!b.heat.0.get());
        b.hw.all_off();
        assert!(!b.hw.heat_on());
        assert!(b.heat.0.get());
    }

    #[test]
    fn press_yields_one_edge() {
        let mut b = bench();
        b.button.0.set(false);
        assert_eq!(b.hw.poll_button(0), None);
        assert_eq!(b.hw.poll_button(60), Some(ButtonEvent::Press));
        assert!(b.hw.confirmation_edge());
        assert!(!b.hw.confirmation_edge());

        assert_eq!(b.hw.poll_button(3100), Some(ButtonEvent::LongPress));
        assert!(!b.hw.confirmation_edge());
    }

    #[test]
    fn probes_pass_through() {
        let mut b = bench();
        b.kettle.publish(63.5);
        let r = b.hw.read_probes();
        assert_eq!(r.kettle, Some(63.5));
        assert_eq!(r.valve, None);
    }
}

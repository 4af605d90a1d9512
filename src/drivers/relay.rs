//! On/off output driver for the gas valve relay, pump relay and buzzer.
//!
//! A thin wrapper over an `embedded-hal` output pin that remembers the
//! commanded state, so repeated `set()` calls from the control loop do not
//! touch the GPIO. Polarity is configurable because the relay boards on
//! this kettle are active-low while the buzzer is active-high.

use embedded_hal::digital::OutputPin;
use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

pub struct Relay<P: OutputPin> {
    name: &'static str,
    pin: P,
    polarity: Polarity,
    /// `None` until the first write, so the first `set()` always drives the pin.
    state: Option<bool>,
}

impl<P: OutputPin> Relay<P> {
    pub fn new(name: &'static str, pin: P, polarity: Polarity) -> Self {
        Self {
            name,
            pin,
            polarity,
            state: None,
        }
    }

    /// Drive the output. Idempotent; only state changes reach the pin.
    pub fn set(&mut self, on: bool) -> Result<(), P::Error> {
        if self.state == Some(on) {
            return Ok(());
        }
        let level_high = match self.polarity {
            Polarity::ActiveHigh => on,
            Polarity::ActiveLow => !on,
        };
        if level_high {
            self.pin.set_high()?;
        } else {
            self.pin.set_low()?;
        }
        if self.state.is_some() {
            info!("{}: {}", self.name, if on { "ON" } else { "OFF" });
        }
        self.state = Some(on);
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.state == Some(true)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    #[derive(Default)]
    struct FakePin {
        high: bool,
        writes: u32,
    }

    impl ErrorType for FakePin {
        type Error = Infallible;
    }

    impl OutputPin for FakePin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            self.writes += 1;
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn repeated_set_writes_once() {
        let mut r = Relay::new("pump", FakePin::default(), Polarity::ActiveHigh);
        r.set(true).unwrap();
        r.set(true).unwrap();
        r.set(true).unwrap();
        assert!(r.is_on());
        assert_eq!(r.pin.writes, 1);
    }

    #[test]
    fn active_low_inverts_level() {
        let mut r = Relay::new("gas", FakePin::default(), Polarity::ActiveLow);
        r.set(false).unwrap();
        assert!(r.pin.high);
        r.set(true).unwrap();
        assert!(!r.pin.high);
        assert_eq!(r.pin.writes, 2);
    }
}

//! Addressable (WS2812) status LED driver.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: one RMT TX channel clocks out the 24-bit GRB frame.
//! On host/test: tracks the colour in-memory only.
//!
//! Writes are skipped when the colour has not changed.

use crate::indicator::Rgb;

#[cfg(target_os = "espidf")]
use esp_idf_hal::rmt::TxRmtDriver;

pub struct StatusLed {
    #[cfg(target_os = "espidf")]
    tx: TxRmtDriver<'static>,
    current: Option<Rgb>,
}

#[cfg(target_os = "espidf")]
impl StatusLed {
    pub fn new(tx: TxRmtDriver<'static>) -> Self {
        Self { tx, current: None }
    }

    fn write_hw(&mut self, (r, g, b): Rgb) -> Result<(), esp_idf_svc::sys::EspError> {
        use core::time::Duration;
        use esp_idf_hal::rmt::{FixedLengthSignal, PinState, Pulse};

        let ticks_hz = self.tx.counter_clock()?;
        let t0h = Pulse::new_with_duration(ticks_hz, PinState::High, &Duration::from_nanos(350))?;
        let t0l = Pulse::new_with_duration(ticks_hz, PinState::Low, &Duration::from_nanos(800))?;
        let t1h = Pulse::new_with_duration(ticks_hz, PinState::High, &Duration::from_nanos(700))?;
        let t1l = Pulse::new_with_duration(ticks_hz, PinState::Low, &Duration::from_nanos(600))?;

        let grb = (u32::from(g) << 16) | (u32::from(r) << 8) | u32::from(b);
        let mut signal = FixedLengthSignal::<24>::new();
        for i in 0..24 {
            let bit = grb & (1 << (23 - i)) != 0;
            let pulses = if bit { (t1h, t1l) } else { (t0h, t0l) };
            signal.set(i, &pulses)?;
        }
        self.tx.start_blocking(&signal)
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for StatusLed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl StatusLed {
    pub fn new() -> Self {
        Self { current: None }
    }

    #[allow(clippy::unnecessary_wraps)]
    fn write_hw(&mut self, _rgb: Rgb) -> Result<(), core::convert::Infallible> {
        Ok(())
    }
}

impl StatusLed {
    pub fn set_colour(&mut self, rgb: Rgb) {
        if self.current == Some(rgb) {
            return;
        }
        match self.write_hw(rgb) {
            Ok(()) => self.current = Some(rgb),
            Err(e) => log::warn!("Status LED write failed: {:?}", e),
        }
    }

    pub fn off(&mut self) {
        self.set_colour((0, 0, 0));
    }

    pub fn current_colour(&self) -> Rgb {
        self.current.unwrap_or((0, 0, 0))
    }
}

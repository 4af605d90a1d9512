//! DS18B20 temperature probe over a bit-banged one-wire bus.
//!
//! One probe per bus, so every transaction addresses it with SKIP ROM.
//! The pin must be open-drain with a pull-up: driving it high releases
//! the line. Conversions are split in two (`start_conversion`, then
//! `read_celsius` at least 750 ms later) so the probe task can sleep
//! instead of busy-waiting on the bus.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// 12-bit conversion time.
pub const CONVERSION_MS: u32 = 750;

const SKIP_ROM: u8 = 0xCC;
const CONVERT_T: u8 = 0x44;
const READ_SCRATCHPAD: u8 = 0xBE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneWireError<E> {
    /// No presence pulse after reset: probe missing or bus shorted.
    NoPresence,
    /// Scratchpad CRC mismatch.
    Crc,
    Pin(E),
}

impl<E> From<E> for OneWireError<E> {
    fn from(e: E) -> Self {
        Self::Pin(e)
    }
}

pub struct Ds18b20<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Ds18b20<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    /// Kick off a temperature conversion.
    pub fn start_conversion(&mut self) -> Result<(), OneWireError<P::Error>> {
        self.reset()?;
        self.write_byte(SKIP_ROM)?;
        self.write_byte(CONVERT_T)
    }

    /// Read the result of the last conversion.
    pub fn read_celsius(&mut self) -> Result<f32, OneWireError<P::Error>> {
        self.reset()?;
        self.write_byte(SKIP_ROM)?;
        self.write_byte(READ_SCRATCHPAD)?;
        let mut pad = [0u8; 9];
        for b in &mut pad {
            *b = self.read_byte()?;
        }
        decode_scratchpad(&pad).ok_or(OneWireError::Crc)
    }

    fn reset(&mut self) -> Result<(), OneWireError<P::Error>> {
        self.pin.set_low()?;
        self.delay.delay_us(480);
        self.pin.set_high()?;
        self.delay.delay_us(70);
        let present = self.pin.is_low()?;
        self.delay.delay_us(410);
        if present {
            Ok(())
        } else {
            Err(OneWireError::NoPresence)
        }
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), P::Error> {
        self.pin.set_low()?;
        if bit {
            self.delay.delay_us(6);
            self.pin.set_high()?;
            self.delay.delay_us(64);
        } else {
            self.delay.delay_us(60);
            self.pin.set_high()?;
            self.delay.delay_us(10);
        }
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool, P::Error> {
        self.pin.set_low()?;
        self.delay.delay_us(6);
        self.pin.set_high()?;
        self.delay.delay_us(9);
        let bit = self.pin.is_high()?;
        self.delay.delay_us(55);
        Ok(bit)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), OneWireError<P::Error>> {
        for i in 0..8 {
            self.write_bit(byte & (1 << i) != 0)?;
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, P::Error> {
        let mut byte = 0u8;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }
}

/// Dallas/Maxim CRC-8 (polynomial x^8 + x^5 + x^4 + 1, LSB first).
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (crc ^ b) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            b >>= 1;
        }
    }
    crc
}

/// Temperature from a scratchpad, `None` if the CRC does not match.
pub fn decode_scratchpad(pad: &[u8; 9]) -> Option<f32> {
    if crc8(&pad[..8]) != pad[8] {
        return None;
    }
    let raw = i16::from_le_bytes([pad[0], pad[1]]);
    Some(f32::from(raw) / 16.0)
}

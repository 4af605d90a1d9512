//! Non-blocking button debouncer with press and long-press detection.
//!
//! ## Hardware
//!
//! Active-low momentary switch with the internal pull-up enabled. The
//! pin is sampled from the control loop; there is no interrupt and no
//! blocking delay.
//!
//! ## Gesture detection
//!
//! | Gesture     | Condition                                  | Event       |
//! |-------------|--------------------------------------------|-------------|
//! | Press       | Held continuously for the debounce time    | `Press`     |
//! | Long press  | Held for `long_press_ms` (once per hold)   | `LongPress` |
//!
//! A long press is always preceded by its `Press`.

use embedded_hal::digital::InputPin;

pub const DEBOUNCE_MS: u64 = 50;

/// Button events emitted after gesture classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Press,
    LongPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Released,
    Bouncing { since_ms: u64 },
    Held { since_ms: u64, long_sent: bool },
}

pub struct ButtonDriver<P: InputPin> {
    pin: P,
    long_press_ms: u64,
    state: GestureState,
}

impl<P: InputPin> ButtonDriver<P> {
    pub fn new(pin: P, long_press_ms: u32) -> Self {
        Self {
            pin,
            long_press_ms: u64::from(long_press_ms),
            state: GestureState::Released,
        }
    }

    /// Sample the pin. Call every loop iteration. A read error counts as
    /// "released".
    pub fn poll(&mut self, now_ms: u64) -> Option<ButtonEvent> {
        let pressed = self.pin.is_low().unwrap_or(false);
        self.sample(now_ms, pressed)
    }

    /// Advance the gesture state machine with one raw sample.
    pub fn sample(&mut self, now_ms: u64, pressed: bool) -> Option<ButtonEvent> {
        match self.state {
            GestureState::Released => {
                if pressed {
                    self.state = GestureState::Bouncing { since_ms: now_ms };
                }
                None
            }

            GestureState::Bouncing { since_ms } => {
                if !pressed {
                    self.state = GestureState::Released;
                    return None;
                }
                if now_ms.wrapping_sub(since_ms) >= DEBOUNCE_MS {
                    self.state = GestureState::Held {
                        since_ms,
                        long_sent: false,
                    };
                    return Some(ButtonEvent::Press);
                }
                None
            }

            GestureState::Held { since_ms, long_sent } => {
                if !pressed {
                    self.state = GestureState::Released;
                    return None;
                }
                if !long_sent && now_ms.wrapping_sub(since_ms) >= self.long_press_ms {
                    self.state = GestureState::Held {
                        since_ms,
                        long_sent: true,
                    };
                    return Some(ButtonEvent::LongPress);
                }
                None
            }
        }
    }

    pub fn is_held(&self) -> bool {
        matches!(self.state, GestureState::Held { .. })
    }
}

// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Status LED.

use embedded_hal::digital::v2::{OutputPin, PinState};

/// Whether the LED is driven active-high or active-low on the board wiring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActiveLevel {
    High,
    Low,
}

impl ActiveLevel {
    fn pin_state(self, on: bool) -> PinState {
        match (self, on) {
            (ActiveLevel::High, true) | (ActiveLevel::Low, false) => PinState::High,
            (ActiveLevel::High, false) | (ActiveLevel::Low, true) => PinState::Low,
        }
    }
}

/// LED that remembers its active level and last commanded state.
///
/// Pin errors are ignored; a stuck LED must never stop the task that blinks it.
pub struct Led<PIN: OutputPin> {
    pin: PIN,
    active: ActiveLevel,
    is_on: bool,
}

impl<PIN: OutputPin> Led<PIN> {
    /// Wrap `pin` and switch the LED off.
    pub fn new(pin: PIN, active: ActiveLevel) -> Self {
        let mut led = Self {
            pin,
            active,
            is_on: false,
        };
        led.set(false);
        led
    }

    pub fn active_high(pin: PIN) -> Self {
        Self::new(pin, ActiveLevel::High)
    }

    pub fn active_low(pin: PIN) -> Self {
        Self::new(pin, ActiveLevel::Low)
    }

    pub fn set(&mut self, on: bool) {
        let _ = self.pin.set_state(self.active.pin_state(on));
        self.is_on = on;
    }

    pub fn toggle(&mut self) {
        self.set(!self.is_on);
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.is_on
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::pin::{Mock as PinMock, State, Transaction};

    #[test]
    fn active_low_inverts_pin() {
        let mut pin = PinMock::new(&[
            Transaction::set(State::High),
            Transaction::set(State::Low),
            Transaction::set(State::High),
        ]);
        let mut led = Led::active_low(pin.clone());

        led.toggle();
        assert!(led.is_on());
        led.toggle();
        assert!(!led.is_on());
        pin.done();
    }

    #[test]
    fn active_high_starts_off() {
        let mut pin = PinMock::new(&[Transaction::set(State::Low), Transaction::set(State::High)]);
        let mut led = Led::active_high(pin.clone());

        assert!(!led.is_on());
        led.set(true);
        assert!(led.is_on());
        pin.done();
    }
}

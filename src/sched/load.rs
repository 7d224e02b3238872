// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! CPU load of the scheduler tier.
//!
//! The tick interrupt reports how many cycles each tick spent in tasks. Over a window of
//! [`LOAD_WINDOW_TICKS`] ticks that becomes a permille figure.

use crate::config::LOAD_WINDOW_TICKS;

pub struct LoadMeter {
    busy: u64,
    total: u64,
    ticks: u32,
    permille: u32,
}

impl LoadMeter {
    pub const fn new() -> Self {
        Self {
            busy: 0,
            total: 0,
            ticks: 0,
            permille: 0,
        }
    }

    /// Account one tick: `busy_cycles` out of `tick_cycles`.
    pub fn record(&mut self, busy_cycles: u32, tick_cycles: u32) {
        self.busy += busy_cycles as u64;
        self.total += tick_cycles as u64;
        self.ticks += 1;

        if self.ticks >= LOAD_WINDOW_TICKS {
            self.permille = if self.total == 0 {
                0
            } else {
                ((self.busy * 1000) / self.total).min(1000) as u32
            };
            self.busy = 0;
            self.total = 0;
            self.ticks = 0;
        }
    }

    /// Load over the last complete window.
    #[inline]
    pub fn permille(&self) -> u32 {
        self.permille
    }
}

impl Default for LoadMeter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_after_full_window() {
        let mut meter = LoadMeter::new();
        for _ in 0..LOAD_WINDOW_TICKS - 1 {
            meter.record(250, 1000);
        }
        assert_eq!(meter.permille(), 0);

        meter.record(250, 1000);
        assert_eq!(meter.permille(), 250);
    }

    #[test]
    fn overrun_saturates() {
        let mut meter = LoadMeter::new();
        for _ in 0..LOAD_WINDOW_TICKS {
            meter.record(3000, 1000);
        }
        assert_eq!(meter.permille(), 1000);
    }
}

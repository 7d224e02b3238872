// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Independent watchdog (IWDG) using direct PAC register access.
//!
//! The boot loader normally starts the watchdog before jumping here. [`Iwdg::start`] programs the
//! same timeout again so the firmware also runs guarded when flashed without it.

use embedded_hal::watchdog::Watchdog;
use stm32f7xx_hal::pac;

const KEY_REFRESH: u32 = 0xAAAA;
const KEY_UNLOCK: u32 = 0x5555;
const KEY_START: u32 = 0xCCCC;

// LSI (32 kHz) / 32 gives a 1 ms counter tick.
const PRESCALER_DIV32: u32 = 0b011;
const MAX_RELOAD: u32 = 0x0FFF;

// IWDG_SR
const SR_PVU: u32 = 1 << 0;
const SR_RVU: u32 = 1 << 1;

pub struct Iwdg {
    iwdg: pac::IWDG,
}

impl Iwdg {
    /// Start the watchdog (or restart it with a new timeout if already running).
    pub fn start(iwdg: pac::IWDG, timeout_ms: u32) -> Self {
        let reload = timeout_ms.clamp(1, MAX_RELOAD + 1) - 1;

        iwdg.kr.write(|w| unsafe { w.bits(KEY_START) });
        iwdg.kr.write(|w| unsafe { w.bits(KEY_UNLOCK) });
        iwdg.pr.write(|w| unsafe { w.bits(PRESCALER_DIV32) });
        iwdg.rlr.write(|w| unsafe { w.bits(reload) });
        while iwdg.sr.read().bits() & (SR_PVU | SR_RVU) != 0 {}
        iwdg.kr.write(|w| unsafe { w.bits(KEY_REFRESH) });

        Self { iwdg }
    }
}

impl Watchdog for Iwdg {
    #[inline]
    fn feed(&mut self) {
        self.iwdg.kr.write(|w| unsafe { w.bits(KEY_REFRESH) });
    }
}

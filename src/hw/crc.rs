// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! STM32 hardware CRC unit.
//!
//! Programmed to the reset defaults the boot loader relies on: polynomial 0x04C11DB7, initial
//! value 0xFFFFFFFF, 32-bit input, no reversal.

use stm32f7xx_hal::pac;

use crate::pininit::crc::{Crc32, CRC32_INIT, CRC32_POLY};

const CR_RESET: u32 = 1 << 0;

pub struct HwCrc {
    crc: pac::CRC,
}

impl HwCrc {
    pub fn new(crc: pac::CRC) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.ahb1enr.modify(|_, w| w.crcen().set_bit());

        crc.init.write(|w| unsafe { w.bits(CRC32_INIT) });
        crc.pol.write(|w| unsafe { w.bits(CRC32_POLY) });
        // 32-bit polynomial, no input or output reversal
        crc.cr.write(|w| unsafe { w.bits(0) });

        Self { crc }
    }

    #[inline]
    pub fn free(self) -> pac::CRC {
        self.crc
    }
}

impl Crc32 for HwCrc {
    fn reset(&mut self) {
        self.crc.cr.modify(|r, w| unsafe { w.bits(r.bits() | CR_RESET) });
    }

    #[inline]
    fn feed(&mut self, word: u32) {
        self.crc.dr.write(|w| unsafe { w.bits(word) });
    }

    #[inline]
    fn value(&self) -> u32 {
        self.crc.dr.read().bits()
    }
}

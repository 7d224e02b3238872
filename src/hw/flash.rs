// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Internal flash programming for STM32F7 (single-bank layout) using direct PAC register access.
//!
//! Only used at startup, before interrupts are enabled, so busy-waiting on the controller is
//! acceptable here.

use core::ptr;

use stm32f7xx_hal::pac;

use crate::pininit::{FlashError, NvStorage};

const FLASH_BASE: u32 = 0x0800_0000;

const KEY1: u32 = 0x4567_0123;
const KEY2: u32 = 0xCDEF_89AB;

// FLASH_SR
const SR_EOP: u32 = 1 << 0;
const SR_OPERR: u32 = 1 << 1;
const SR_WRPERR: u32 = 1 << 4;
const SR_PGAERR: u32 = 1 << 5;
const SR_PGPERR: u32 = 1 << 6;
const SR_ERSERR: u32 = 1 << 7;
const SR_BSY: u32 = 1 << 16;
const SR_ERRORS: u32 = SR_OPERR | SR_WRPERR | SR_PGAERR | SR_PGPERR | SR_ERSERR;

// FLASH_CR
const CR_PG: u32 = 1 << 0;
const CR_SER: u32 = 1 << 1;
const CR_SNB_SHIFT: u32 = 3;
const CR_SNB_MASK: u32 = 0x1F << CR_SNB_SHIFT;
const CR_PSIZE_X32: u32 = 0b10 << 8;
const CR_PSIZE_MASK: u32 = 0b11 << 8;
const CR_STRT: u32 = 1 << 16;
const CR_LOCK: u32 = 1 << 31;

/// Sector number for an address, single-bank 2 MiB layout: 4 x 32K, 1 x 128K, 7 x 256K.
fn sector_of(address: u32) -> Option<u8> {
    let offset = address.checked_sub(FLASH_BASE)?;
    match offset {
        0..=0x1_FFFF => Some((offset / 0x8000) as u8),
        0x2_0000..=0x3_FFFF => Some(4),
        0x4_0000..=0x1F_FFFF => Some(5 + ((offset - 0x4_0000) / 0x4_0000) as u8),
        _ => None,
    }
}

pub struct Flash {
    flash: pac::FLASH,
}

impl Flash {
    pub fn new(flash: pac::FLASH) -> Self {
        Self { flash }
    }

    #[inline]
    pub fn free(self) -> pac::FLASH {
        self.flash
    }

    fn wait_ready(&self) {
        while self.flash.sr.read().bits() & SR_BSY != 0 {}
    }

    /// Check and clear the error flags of the last operation.
    fn take_errors(&self) -> Result<(), FlashError> {
        let sr = self.flash.sr.read().bits();
        self.flash
            .sr
            .write(|w| unsafe { w.bits(sr & (SR_ERRORS | SR_EOP)) });

        if sr & SR_WRPERR != 0 {
            Err(FlashError::WriteProtected)
        } else if sr & SR_ERRORS != 0 {
            Err(FlashError::Programming)
        } else {
            Ok(())
        }
    }

    fn modify_cr(&self, clear: u32, set: u32) {
        self.flash
            .cr
            .modify(|r, w| unsafe { w.bits((r.bits() & !clear) | set) });
    }
}

impl NvStorage for Flash {
    type Error = FlashError;

    fn read_word(&self, address: u32) -> u32 {
        unsafe { ptr::read_volatile(address as *const u32) }
    }

    fn unlock(&mut self) {
        if self.flash.cr.read().bits() & CR_LOCK != 0 {
            self.flash.keyr.write(|w| unsafe { w.bits(KEY1) });
            self.flash.keyr.write(|w| unsafe { w.bits(KEY2) });
        }
    }

    fn lock(&mut self) {
        self.modify_cr(0, CR_LOCK);
    }

    fn erase_block(&mut self, address: u32) -> Result<(), FlashError> {
        let sector = sector_of(address).ok_or(FlashError::WriteProtected)?;
        if self.flash.cr.read().bits() & CR_LOCK != 0 {
            return Err(FlashError::Locked);
        }

        self.wait_ready();
        self.take_errors()?;

        self.modify_cr(
            CR_PSIZE_MASK | CR_SNB_MASK | CR_PG,
            CR_PSIZE_X32 | CR_SER | ((sector as u32) << CR_SNB_SHIFT),
        );
        self.modify_cr(0, CR_STRT);
        self.wait_ready();
        self.modify_cr(CR_SER | CR_SNB_MASK, 0);

        self.take_errors()
    }

    fn program_word(&mut self, address: u32, word: u32) -> Result<(), FlashError> {
        if self.flash.cr.read().bits() & CR_LOCK != 0 {
            return Err(FlashError::Locked);
        }

        self.wait_ready();
        self.take_errors()?;

        self.modify_cr(CR_PSIZE_MASK | CR_SER, CR_PSIZE_X32 | CR_PG);
        unsafe { ptr::write_volatile(address as *mut u32, word) };
        cortex_m::asm::dsb();
        self.wait_ready();
        self.modify_cr(CR_PG, 0);

        self.take_errors()?;

        if self.read_word(address) != word {
            return Err(FlashError::Verify { address });
        }

        Ok(())
    }
}

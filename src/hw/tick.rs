// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! TIM2 as the scheduler time base.

use stm32f7xx_hal::pac;

use crate::config::{SCHED_TICK_MS, TICK_TIMER_CLOCK_HZ};

// TIM2_CR1
const CR1_CEN: u32 = 1 << 0;
const CR1_URS: u32 = 1 << 2;

// TIM2_DIER / TIM2_SR
const UPDATE: u32 = 1 << 0;

// TIM2_EGR
const EGR_UG: u32 = 1 << 0;

const COUNTER_HZ: u32 = 1_000_000;

pub struct TickTimer {
    tim: pac::TIM2,
}

impl TickTimer {
    /// Start a periodic update interrupt every `SCHED_TICK_MS`.
    pub fn start(tim: pac::TIM2) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim2en().set_bit());

        tim.cr1.write(|w| unsafe { w.bits(0) });
        tim.psc
            .write(|w| unsafe { w.bits(TICK_TIMER_CLOCK_HZ / COUNTER_HZ - 1) });
        tim.arr
            .write(|w| unsafe { w.bits(COUNTER_HZ / 1000 * SCHED_TICK_MS - 1) });
        tim.egr.write(|w| unsafe { w.bits(EGR_UG) });
        tim.sr.write(|w| unsafe { w.bits(0) });
        tim.dier.write(|w| unsafe { w.bits(UPDATE) });
        tim.cr1.write(|w| unsafe { w.bits(CR1_URS | CR1_CEN) });

        Self { tim }
    }

    /// Clear the pending update flag. Usable before the timer has been handed to its handler.
    #[inline]
    pub fn acknowledge() {
        let tim = unsafe { &*pac::TIM2::ptr() };
        tim.sr.write(|w| unsafe { w.bits(!UPDATE) });
    }

    #[inline]
    pub fn free(self) -> pac::TIM2 {
        self.tim
    }
}

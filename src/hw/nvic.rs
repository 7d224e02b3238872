// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Maps the priority table onto NVIC lines.

use cortex_m::peripheral::NVIC;
use stm32f7xx_hal::pac::Interrupt;

use crate::irq::{Vector, VECTORS};

pub fn interrupt(vector: Vector) -> Interrupt {
    match vector {
        Vector::EmergencyStop => Interrupt::TIM1_BRK_TIM9,
        Vector::ControlLoop => Interrupt::TIM1_UP_TIM10,
        Vector::SchedulerTick => Interrupt::TIM2,
    }
}

/// Set every priority from [`VECTORS`], then unmask the lines.
///
/// Call once, after all handler state has been handed over.
pub fn install(nvic: &mut NVIC) {
    for entry in VECTORS {
        unsafe { nvic.set_priority(interrupt(entry.vector), entry.priority) };
    }
    for entry in VECTORS {
        log_debug!("unmask {} at {=u8:#x}", entry.vector, entry.priority);
        unsafe { NVIC::unmask(interrupt(entry.vector)) };
    }
}

// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Build-time configuration for the power board.
//!
//! Anything an operator may change at runtime lives in [`crate::params`] instead.

use crate::control::Polarity;

/// Firmware version published through the `version` spot value.
pub const FIRMWARE_VERSION: i32 = 4;

/// Core clock.
pub const SYSCLK_HZ: u32 = 216_000_000;

/// TIM1 kernel clock (APB2 timer clock at 216 MHz SYSCLK).
pub const PWM_TIMER_CLOCK_HZ: u32 = 216_000_000;

/// TIM2 kernel clock (APB1 timer clock).
pub const TICK_TIMER_CLOCK_HZ: u32 = 108_000_000;

/// APB1 clock feeding bxCAN.
pub const CAN_CLOCK_HZ: u32 = 54_000_000;

/// PWM resolution in bits for `pwmfrq = 0`. Each `pwmfrq` step adds one bit and halves the
/// switching frequency.
pub const MIN_PWM_DIGITS: u8 = 11;

/// Highest PWM resolution TIM1 supports (16-bit auto-reload register).
pub const MAX_PWM_DIGITS: u8 = 16;

/// Polarity of the bridge outputs for this power stage.
pub const OUTPUT_POLARITY: Polarity = Polarity::ActiveHigh;

/// Scheduler tick period driven by TIM2.
pub const SCHED_TICK_MS: u32 = 1;

/// Core cycles in one scheduler tick, the load meter's reference.
pub const CYCLES_PER_TICK: u32 = SYSCLK_HZ / 1000 * SCHED_TICK_MS;

/// Period of the fast housekeeping task (mode poll).
pub const FAST_TASK_PERIOD_MS: u32 = 10;

/// Period of the slow housekeeping task (LED, watchdog, CPU load).
pub const SLOW_TASK_PERIOD_MS: u32 = 100;

/// Number of scheduler ticks the CPU load meter averages over.
pub const LOAD_WINDOW_TICKS: u32 = 100;

/// Timeout of the independent watchdog started by the boot loader. The slow task must refresh
/// it well within this window.
pub const WATCHDOG_TIMEOUT_MS: u32 = 2_000;

/// Flash address of the pin-init record read by the boot loader (start of sector 1).
pub const PINDEF_ADDRESS: u32 = 0x0800_8000;

/// Flash sector holding the pin-init record.
pub const PINDEF_SECTOR: u8 = 1;

/// Size of the erase block the record lives in. The whole sector is consumed.
pub const PINDEF_BLOCK_SIZE: u32 = 32 * 1024;

/// Number of pin commands the record layout reserves room for.
pub const PIN_COMMAND_SLOTS: usize = 10;

// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # drivecore
//!
//! Real-time control skeleton for the OmniTiles power board, written in Rust, targeting an
//! STM32F777 MCU.
//!
//! Three interrupt tiers share one [`Drive`] context:
//!
//! | Priority | Source | Work |
//! | -------- | ------ | ---- |
//! | 0x00 | TIM1 break | [`Drive::emergency_stop`] |
//! | 0x10 | TIM1 update | [`control::ControlLoop::on_update`] |
//! | 0xE0 | TIM2 tick | [`sched::Scheduler::run`] and the periodic [`sched::tasks`] |
//!
//! Before any of them is unmasked, [`pininit::persist`] hands the safe pin states to the boot
//! loader.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`pininit`] | CRC-guarded pin-init record shared with the boot loader |
//! | [`drive`] | Shared context, emergency path and mode transitions |
//! | [`mode`] | Requested/actual operating mode and the fault latch |
//! | [`control`] | PI regulator and the control-loop handler |
//! | [`sched`] | Cooperative tick scheduler, CPU load meter and periodic tasks |
//! | [`params`] | Parameter store with change notification |
//! | [`transport`] | CAN frame map and bit timing |
//! | [`irq`] | Interrupt vector priority table |
//! | [`hw`] | MCU-level wrappers (flash, CRC, TIM1, TIM2, ADC, CAN, watchdog, NVIC) |
//!
//! ## Getting Started
//!
//! Run the host tests:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --features board --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

#[macro_use]
pub mod logging;

pub mod atomic;
pub mod config;
pub mod control;
pub mod drive;
pub mod hw;
pub mod irq;
pub mod mode;
pub mod params;
pub mod pininit;
pub mod sched;
pub mod transport;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use drive::{Drive, PowerStage};
pub use mode::OpMode;
pub use params::{ParamId, ParamStore};

// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Scheduler tier
//!
//! Lowest-priority work. TIM2 fires every millisecond and runs [`Scheduler::run`] over an [`App`],
//! which owns the watchdog, status LED, CAN transport and load meter.
//!
//! ## Modules
//!
//! - [`scheduler`] - Fixed-capacity periodic task table.
//! - [`load`] - CPU load meter.
//! - [`tasks`] - The 10 ms and 100 ms housekeeping tasks.

pub mod load;
pub mod scheduler;
pub mod tasks;

pub use load::LoadMeter;
pub use scheduler::{Scheduler, SchedulerError, Task};
pub use tasks::App;

// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Cooperative tick scheduler.
//!
//! Runs from the lowest-priority timer interrupt once per [`SCHED_TICK_MS`]. Tasks are plain
//! function pointers bound to one context type; they run to completion in registration order and
//! never preempt each other.

use crate::config::SCHED_TICK_MS;

/// Periodic task body.
pub type Task<C> = fn(&mut C);

/// Task registration errors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum SchedulerError {
    /// Every slot is taken.
    Full,
    /// Period shorter than one tick.
    ZeroPeriod,
}

struct Slot<C> {
    task: Task<C>,
    period: u32,
    remaining: u32,
}

/// Fixed-capacity table of periodic tasks.
pub struct Scheduler<C, const N: usize = 4> {
    slots: [Option<Slot<C>>; N],
    len: usize,
}

impl<C, const N: usize> Scheduler<C, N> {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
            len: 0,
        }
    }

    /// Register `task` to run every `period_ms`. The first run happens one full period later.
    pub fn add_task(&mut self, task: Task<C>, period_ms: u32) -> Result<(), SchedulerError> {
        let period = period_ms / SCHED_TICK_MS;
        if period == 0 {
            return Err(SchedulerError::ZeroPeriod);
        }

        let slot = self.slots.get_mut(self.len).ok_or(SchedulerError::Full)?;
        *slot = Some(Slot {
            task,
            period,
            remaining: period,
        });
        self.len += 1;

        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One tick. Call from the scheduler timer interrupt.
    pub fn run(&mut self, ctx: &mut C) {
        for slot in self.slots.iter_mut().flatten() {
            slot.remaining -= 1;
            if slot.remaining == 0 {
                slot.remaining = slot.period;
                (slot.task)(ctx);
            }
        }
    }
}

impl<C, const N: usize> Default for Scheduler<C, N> {
    fn default() -> Self {
        Self::new()
    }
}

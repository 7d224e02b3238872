// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Operating mode state machine.
//!
//! The operator writes the *requested* mode (`start`); the firmware owns the *actual* mode
//! (`opmode`). [`decide`] is the pure transition table the mode poll runs; side effects are
//! carried out by [`crate::Drive::poll_mode`].
//!
//! An emergency trip latches a fault. While latched the poll refuses to start, even if `start`
//! still reads `Run`. The latch clears when the operator requests `Off`, or writes `start` again
//! through the parameter store.

use core::sync::atomic::{AtomicBool, Ordering};

/// Operating mode as stored in `start` and `opmode`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
#[repr(i32)]
pub enum OpMode {
    Off = 0,
    Run = 1,
}

impl OpMode {
    /// Decode a parameter value. Anything else is not a valid request.
    pub fn from_param(value: i32) -> Option<Self> {
        match value {
            0 => Some(OpMode::Off),
            1 => Some(OpMode::Run),
            _ => None,
        }
    }

    #[inline]
    pub fn as_param(self) -> i32 {
        self as i32
    }
}

/// What one mode poll should do.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum Transition {
    /// Nothing to do.
    Hold,
    /// Run the start sequence.
    Start,
    /// Run the stop sequence.
    Stop,
    /// Run was requested but a fault is latched.
    Blocked,
}

/// Transition table.
///
/// `actual` is `None` if `opmode` holds something other than a known mode, which is treated as
/// "not running".
pub fn decide(requested: Option<OpMode>, actual: Option<OpMode>, faulted: bool) -> Transition {
    match requested {
        Some(OpMode::Run) if actual != Some(OpMode::Run) => {
            if faulted {
                Transition::Blocked
            } else {
                Transition::Start
            }
        }
        Some(OpMode::Off) if actual != Some(OpMode::Off) => Transition::Stop,
        _ => Transition::Hold,
    }
}

/// Fault latch shared between the emergency interrupt and the mode poll.
pub struct ModeMachine {
    fault_latched: AtomicBool,
}

impl ModeMachine {
    pub const fn new() -> Self {
        Self {
            fault_latched: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn latch_fault(&self) {
        self.fault_latched.store(true, Ordering::SeqCst);
    }

    /// Clear the latch. Returns whether it was set.
    #[inline]
    pub fn clear_fault(&self) -> bool {
        self.fault_latched.swap(false, Ordering::SeqCst)
    }

    #[inline]
    pub fn is_faulted(&self) -> bool {
        self.fault_latched.load(Ordering::SeqCst)
    }
}

impl Default for ModeMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use OpMode::{Off, Run};

    #[test]
    fn run_request_starts_only_from_stopped() {
        assert_eq!(decide(Some(Run), Some(Off), false), Transition::Start);
        assert_eq!(decide(Some(Run), None, false), Transition::Start);
        assert_eq!(decide(Some(Run), Some(Run), false), Transition::Hold);
    }

    #[test]
    fn off_request_stops_only_from_running() {
        assert_eq!(decide(Some(Off), Some(Run), false), Transition::Stop);
        assert_eq!(decide(Some(Off), Some(Off), false), Transition::Hold);
        assert_eq!(decide(Some(Off), Some(Run), true), Transition::Stop);
    }

    #[test]
    fn latched_fault_blocks_start() {
        assert_eq!(decide(Some(Run), Some(Off), true), Transition::Blocked);
        // Already running is not a restart.
        assert_eq!(decide(Some(Run), Some(Run), true), Transition::Hold);
    }

    #[test]
    fn unknown_request_is_ignored() {
        assert_eq!(decide(None, Some(Run), false), Transition::Hold);
        assert_eq!(decide(None, Some(Off), true), Transition::Hold);
    }

    #[test]
    fn param_encoding() {
        assert_eq!(OpMode::from_param(1), Some(Run));
        assert_eq!(OpMode::from_param(0), Some(Off));
        assert_eq!(OpMode::from_param(2), None);
        assert_eq!(Run.as_param(), 1);
    }

    #[test]
    fn latch_reports_previous_state() {
        let mode = ModeMachine::new();
        assert!(!mode.clear_fault());
        mode.latch_fault();
        assert!(mode.is_faulted());
        assert!(mode.clear_fault());
        assert!(!mode.is_faulted());
    }
}

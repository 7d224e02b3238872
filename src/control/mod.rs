// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Control
//!
//! Everything the TIM1 update interrupt runs, plus the settings it shares with lower tiers.
//!
//! ## Modules
//!
//! - [`pid`] - General-purpose PID block.
//! - [`regulator`] - DC bus voltage regulator driving the boost duty cycle.
//! - [`control_loop`] - Update-interrupt handler and its shared, lock-free settings.

pub mod control_loop;
pub mod pid;
pub mod regulator;

pub use control_loop::{ControlLoop, ControlShared, FeedbackSource, RawFeedback};
pub use pid::Pid;
pub use regulator::{BoostRegulator, ControlAlgorithm, Feedback};

/// Logic level that switches a bridge transistor on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

/// Snapshot of every setting the control loop consumes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Settings {
    pub polarity: Polarity,
    /// PWM resolution in bits. Full scale duty is `2^pwm_digits - 1`.
    pub pwm_digits: u8,
    /// Control loop rate in Hz.
    pub frequency: f32,
    /// DC bus voltage setpoint in volts.
    pub udc_setpoint: f32,
    pub kp: f32,
    pub ki: f32,
    /// Current divider, ADC digits per ampere.
    pub il1_gain: f32,
    pub il2_gain: f32,
}

impl Settings {
    /// Largest duty count at the configured resolution.
    #[inline]
    pub fn max_duty(&self) -> u16 {
        ((1u32 << self.pwm_digits) - 1).min(u16::MAX as u32) as u16
    }
}

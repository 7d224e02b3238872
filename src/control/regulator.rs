// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! DC bus voltage regulator.
//!
//! The control loop only knows the [`ControlAlgorithm`] trait. [`BoostRegulator`] is the algorithm
//! the board ships with: a PI loop on `udc` whose output is the boost switch duty in timer counts.

// std's inherent `round` shadows the trait on the host.
#[cfg(not(test))]
use micromath::F32Ext;

use super::{Pid, Settings};

/// Feedback sample in physical units.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Feedback {
    /// DC bus voltage in volts.
    pub udc: f32,
    /// Inductor currents in amperes.
    pub il1: f32,
    pub il2: f32,
}

/// Interface between the update interrupt and the algorithm it runs.
pub trait ControlAlgorithm {
    /// Apply new settings. Called between samples, never during `run`.
    fn configure(&mut self, settings: &Settings);

    /// Prepare for the first sample after the outputs were armed.
    fn start(&mut self);

    /// Called once after the outputs were disarmed.
    fn stop(&mut self);

    /// Compute the duty count for one sample.
    fn run(&mut self, feedback: &Feedback) -> u16;
}

/// PI regulator of the DC bus voltage.
pub struct BoostRegulator {
    pid: Pid,
    setpoint: f32,
    dt: f32,
    max_duty: u16,
}

impl BoostRegulator {
    pub const fn new() -> Self {
        Self {
            pid: Pid::new(0.0, 0.0, 0.0).with_output_limits(0.0, 0.0),
            setpoint: 0.0,
            dt: 0.0,
            max_duty: 0,
        }
    }
}

impl Default for BoostRegulator {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlAlgorithm for BoostRegulator {
    fn configure(&mut self, settings: &Settings) {
        self.setpoint = settings.udc_setpoint;
        self.dt = if settings.frequency > 0.0 {
            1.0 / settings.frequency
        } else {
            0.0
        };
        self.max_duty = settings.max_duty();

        self.pid.set_gains(settings.kp, settings.ki, 0.0);
        self.pid.set_output_limits(0.0, self.max_duty as f32);
    }

    fn start(&mut self) {
        self.pid.reset();
    }

    fn stop(&mut self) {
        self.pid.reset();
    }

    fn run(&mut self, feedback: &Feedback) -> u16 {
        // A broken sample must not reach the integrator.
        if !feedback.udc.is_finite() {
            return 0;
        }

        let out = self.pid.update(self.setpoint, feedback.udc, self.dt);
        if out > 0.0 {
            (out.round() as u16).min(self.max_duty)
        } else {
            0
        }
    }
}

// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! PID block for closed-loop control.
//!
//! Works in `no_std` and does not allocate memory. Gains and limits can be changed while the
//! controller runs, so parameter updates take effect on the next sample.

/// PID controller with runtime-tunable gains and output clamping.
pub struct Pid {
    /// Proportional gain
    kp: f32,
    /// Integral gain (per second)
    ki: f32,
    /// Derivative gain (seconds)
    kd: f32,

    /// Integrator state
    integral: f32,
    /// Last process variable (for derivative term)
    prev_measurement: f32,

    /// Output clamp, also bounds the integrator
    out_min: f32,
    out_max: f32,

    first_update: bool,
}

impl Pid {
    /// Create a new controller with output limits `[-1, 1]`.
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self {
            kp,
            ki,
            kd,

            integral: 0.0,
            prev_measurement: 0.0,

            out_min: -1.0,
            out_max: 1.0,

            first_update: true,
        }
    }

    /// Set output limits.
    pub const fn with_output_limits(mut self, min: f32, max: f32) -> Self {
        self.out_min = min;
        self.out_max = max;
        self
    }

    pub fn set_gains(&mut self, kp: f32, ki: f32, kd: f32) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    /// Change the output limits. The integrator is pulled back inside the new range.
    pub fn set_output_limits(&mut self, min: f32, max: f32) {
        self.out_min = min;
        self.out_max = max;
        self.integral = self.integral.clamp(min, max);
    }

    /// Reset integrator + derivative history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_measurement = 0.0;
        self.first_update = true;
    }

    #[inline]
    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// Update the controller.
    ///
    /// `dt` is the sample period in seconds. Returns a command in `[out_min, out_max]`.
    pub fn update(&mut self, setpoint: f32, measurement: f32, dt: f32) -> f32 {
        let error = setpoint - measurement;

        let p = self.kp * error;

        // Integrator stays inside the output range so it unwinds quickly after saturation.
        self.integral = (self.integral + error * dt * self.ki).clamp(self.out_min, self.out_max);
        let i = self.integral;

        // Derivative on measurement
        let d = if self.first_update || dt <= 0.0 {
            self.first_update = false;
            0.0
        } else {
            self.kd * ((self.prev_measurement - measurement) / dt)
        };
        self.prev_measurement = measurement;

        (p + i + d).clamp(self.out_min, self.out_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proportional_only_follows_error() {
        let mut pid = Pid::new(2.0, 0.0, 0.0).with_output_limits(-100.0, 100.0);
        assert_eq!(pid.update(10.0, 4.0, 0.001), 12.0);
        assert_eq!(pid.update(10.0, 12.0, 0.001), -4.0);
    }

    #[test]
    fn integrator_is_bounded_by_output_limits() {
        let mut pid = Pid::new(0.0, 1000.0, 0.0).with_output_limits(0.0, 50.0);
        for _ in 0..1000 {
            pid.update(100.0, 0.0, 0.01);
        }
        assert_eq!(pid.integral(), 50.0);

        pid.set_output_limits(0.0, 20.0);
        assert_eq!(pid.integral(), 20.0);
    }

    #[test]
    fn reset_clears_history() {
        let mut pid = Pid::new(0.0, 10.0, 0.0).with_output_limits(-10.0, 10.0);
        pid.update(1.0, 0.0, 0.1);
        assert!(pid.integral() > 0.0);

        pid.reset();
        assert_eq!(pid.integral(), 0.0);
    }

    #[test]
    fn derivative_skips_first_sample() {
        let mut pid = Pid::new(0.0, 0.0, 1.0).with_output_limits(-100.0, 100.0);
        assert_eq!(pid.update(0.0, 5.0, 0.5), 0.0);
        // Measurement rose by 1 in 0.5 s
        assert_eq!(pid.update(0.0, 6.0, 0.5), -2.0);
    }
}

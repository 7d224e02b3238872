// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Control-loop interrupt handler.
//!
//! [`ControlLoop`] is owned by the TIM1 update interrupt. Lower tiers talk to it only through
//! [`ControlShared`], a set of atomics inside [`crate::Drive`]:
//!
//! - `armed` gates the actuation output; the emergency path clears it.
//! - Settings are copied from the parameter store by the change notification and picked up by
//!   the interrupt at the start of the next sample.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use super::{ControlAlgorithm, Feedback, Settings};
use crate::atomic::AtomicF32;
use crate::config::{MAX_PWM_DIGITS, MIN_PWM_DIGITS, OUTPUT_POLARITY};
use crate::drive::{Drive, PowerStage};
use crate::params::{ParamId, ParamStore};

/// Raw ADC counts, refreshed in the background by continuous conversion.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RawFeedback {
    pub udc: u16,
    pub il1: u16,
    pub il2: u16,
}

/// Latest feedback sample. Must not block.
pub trait FeedbackSource {
    fn sample(&mut self) -> RawFeedback;
}

/// Control-loop state written by lower tiers.
pub struct ControlShared {
    armed: AtomicBool,
    restart: AtomicBool,
    dirty: AtomicBool,

    pwm_digits: AtomicU8,
    frequency: AtomicF32,
    udc_setpoint: AtomicF32,
    kp: AtomicF32,
    ki: AtomicF32,
    il1_gain: AtomicF32,
    il2_gain: AtomicF32,
}

impl ControlShared {
    pub const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            restart: AtomicBool::new(false),
            dirty: AtomicBool::new(true),

            pwm_digits: AtomicU8::new(MIN_PWM_DIGITS),
            frequency: AtomicF32::zero(),
            udc_setpoint: AtomicF32::zero(),
            kp: AtomicF32::zero(),
            ki: AtomicF32::zero(),
            il1_gain: AtomicF32::zero(),
            il2_gain: AtomicF32::zero(),
        }
    }

    /// Copy the loop settings out of the parameter store.
    pub fn apply(&self, params: &ParamStore) {
        let digits = (MIN_PWM_DIGITS as i32 + params.get_int(ParamId::Pwmfrq))
            .clamp(MIN_PWM_DIGITS as i32, MAX_PWM_DIGITS as i32);

        self.pwm_digits.store(digits as u8, Ordering::Relaxed);
        self.frequency.store(params.get(ParamId::Frq));
        self.udc_setpoint.store(params.get(ParamId::Udcspnt));
        self.kp.store(params.get(ParamId::Udckp));
        self.ki.store(params.get(ParamId::Udcki));
        self.il1_gain.store(params.get(ParamId::Il1gain));
        self.il2_gain.store(params.get(ParamId::Il2gain));

        // Published last. A sample that races with this write reads a mix once, then sees `dirty`
        // again on the next sample.
        self.dirty.store(true, Ordering::Release);
    }

    pub fn settings(&self) -> Settings {
        Settings {
            polarity: OUTPUT_POLARITY,
            pwm_digits: self.pwm_digits.load(Ordering::Relaxed),
            frequency: self.frequency.load(),
            udc_setpoint: self.udc_setpoint.load(),
            kp: self.kp.load(),
            ki: self.ki.load(),
            il1_gain: self.il1_gain.load(),
            il2_gain: self.il2_gain.load(),
        }
    }

    /// Enable actuation. The algorithm restarts from a clean state on the next sample.
    pub fn arm(&self) {
        self.restart.store(true, Ordering::Release);
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Disable actuation. Takes effect on the next sample at the latest.
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    fn take_restart(&self) -> bool {
        self.restart.swap(false, Ordering::AcqRel)
    }
}

impl Default for ControlShared {
    fn default() -> Self {
        Self::new()
    }
}

/// State owned by the update interrupt.
pub struct ControlLoop<A, F> {
    algorithm: A,
    feedback: F,
    settings: Settings,
    running: bool,
}

impl<A, F> ControlLoop<A, F>
where
    A: ControlAlgorithm,
    F: FeedbackSource,
{
    pub fn new(mut algorithm: A, feedback: F, shared: &ControlShared) -> Self {
        let settings = shared.settings();
        algorithm.configure(&settings);

        Self {
            algorithm,
            feedback,
            settings,
            running: false,
        }
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// One control period. Runs to completion, never blocks, never allocates.
    pub fn on_update<P: PowerStage>(&mut self, drive: &Drive<P>) {
        let raw = self.feedback.sample();
        drive.power.acknowledge_update();

        let shared = &drive.control;
        if shared.take_dirty() {
            self.settings = shared.settings();
            self.algorithm.configure(&self.settings);
        }

        let feedback = self.convert(raw, &drive.params);

        let duty = if shared.is_armed() {
            if shared.take_restart() || !self.running {
                self.algorithm.start();
                self.running = true;
            }
            self.algorithm.run(&feedback)
        } else {
            if self.running {
                self.algorithm.stop();
                self.running = false;
            }
            0
        };

        // If a trip lands between the check above and here, the outputs are already disabled.
        drive.power.set_duty(duty);

        drive.params.set_flt(ParamId::Udc, feedback.udc);
        drive.params.set_int(ParamId::Boosteramp, duty as i32);
        drive.params.set_flt(ParamId::Il1, feedback.il1);
        drive.params.set_flt(ParamId::Il2, feedback.il2);
    }

    fn convert(&self, raw: RawFeedback, params: &ParamStore) -> Feedback {
        let udc_gain = params.get(ParamId::Udcgain);
        let udc_offset = params.get(ParamId::Udcofs);

        Feedback {
            udc: divide(raw.udc as f32 - udc_offset, udc_gain),
            il1: divide(raw.il1 as f32, self.settings.il1_gain),
            il2: divide(raw.il2 as f32, self.settings.il2_gain),
        }
    }
}

#[inline]
fn divide(value: f32, gain: f32) -> f32 {
    if gain != 0.0 {
        value / gain
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::BoostRegulator;
    use crate::mock::{MockFeedback, MockPowerStage, PowerEvent};

    fn drive() -> Drive<MockPowerStage> {
        let drive = Drive::new(MockPowerStage::new());
        drive.params.set_flt(ParamId::Udcgain, 10.0);
        drive.params.set_flt(ParamId::Udcofs, 100.0);
        drive.params.set_flt(ParamId::Il1gain, 2.0);
        drive.params.set_flt(ParamId::Il2gain, 0.0);
        drive.params.set_flt(ParamId::Udcspnt, 400.0);
        drive.params.set_flt(ParamId::Udckp, 1.0);
        drive.params.set_flt(ParamId::Udcki, 0.0);
        drive.control.apply(&drive.params);
        drive
    }

    fn sample(udc: u16, il1: u16, il2: u16) -> MockFeedback {
        MockFeedback::new(RawFeedback { udc, il1, il2 })
    }

    #[test]
    fn publishes_converted_feedback_when_disarmed() {
        let drive = drive();
        let mut ctl = ControlLoop::new(BoostRegulator::new(), sample(3100, 50, 77), &drive.control);

        ctl.on_update(&drive);

        assert_eq!(drive.params.get(ParamId::Udc), 300.0);
        assert_eq!(drive.params.get(ParamId::Il1), 25.0);
        // Zero divider reads as zero current.
        assert_eq!(drive.params.get(ParamId::Il2), 0.0);
        assert_eq!(drive.params.get_int(ParamId::Boosteramp), 0);
        assert_eq!(
            drive.power.events(),
            vec![PowerEvent::AcknowledgeUpdate, PowerEvent::SetDuty(0)]
        );
    }

    #[test]
    fn armed_loop_commands_regulator_output() {
        let drive = drive();
        let mut ctl = ControlLoop::new(BoostRegulator::new(), sample(3100, 0, 0), &drive.control);

        drive.control.arm();
        ctl.on_update(&drive);

        assert_eq!(drive.params.get_int(ParamId::Boosteramp), 100);
        assert_eq!(drive.power.last_duty(), Some(100));
    }

    #[test]
    fn disarm_forces_zero_duty_on_next_sample() {
        let drive = drive();
        let mut ctl = ControlLoop::new(BoostRegulator::new(), sample(3100, 0, 0), &drive.control);

        drive.control.arm();
        ctl.on_update(&drive);
        drive.control.disarm();
        ctl.on_update(&drive);

        assert_eq!(drive.power.last_duty(), Some(0));
        assert_eq!(drive.params.get_int(ParamId::Boosteramp), 0);
    }

    #[test]
    fn settings_changes_are_picked_up() {
        let drive = drive();
        let mut ctl = ControlLoop::new(BoostRegulator::new(), sample(3100, 0, 0), &drive.control);
        drive.control.arm();
        ctl.on_update(&drive);

        drive.params.set_flt(ParamId::Udcspnt, 350.0);
        drive.params.set_int(ParamId::Pwmfrq, 3);
        drive.control.apply(&drive.params);
        ctl.on_update(&drive);

        assert_eq!(ctl.settings().udc_setpoint, 350.0);
        assert_eq!(ctl.settings().pwm_digits, MIN_PWM_DIGITS + 3);
        assert_eq!(drive.power.last_duty(), Some(50));
    }

    #[test]
    fn pwm_resolution_is_bounded() {
        let shared = ControlShared::new();
        let params = ParamStore::new();

        params.set_int(ParamId::Pwmfrq, 40);
        shared.apply(&params);
        assert_eq!(shared.settings().pwm_digits, MAX_PWM_DIGITS);

        params.set_int(ParamId::Pwmfrq, -3);
        shared.apply(&params);
        assert_eq!(shared.settings().pwm_digits, MIN_PWM_DIGITS);
    }
}

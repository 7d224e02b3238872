// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Shared drive context.
//!
//! [`Drive`] is the single piece of state every interrupt tier sees. It lives in a `static` and
//! holds only atomics plus the [`PowerStage`] handle, whose methods all take `&self` and are
//! single register writes.
//!
//! ## Paths
//!
//! - [`Drive::emergency_stop`]: TIM1 break, highest priority.
//! - [`Drive::poll_mode`]: 10 ms task, requested vs. actual mode.
//! - [`Drive::on_param_change`]: after every operator write, and once at startup.
//! - [`Drive::set_param`]: operator write path for a terminal or CAN front-end. The board image
//!   ships without one, so on hardware `start` only changes when such a front-end is linked in.

use crate::config::FIRMWARE_VERSION;
use crate::control::{ControlShared, Polarity};
use crate::mode::{decide, ModeMachine, OpMode, Transition};
use crate::params::{ParamError, ParamId, ParamStore};

/// Power stage behind the control loop: PWM timer, bridge outputs, fault input and DC contactor.
///
/// Every method must be non-blocking and allocation-free; the emergency interrupt calls them.
pub trait PowerStage {
    /// Program output polarity, PWM resolution and the update interrupt rate.
    fn configure(&self, polarity: Polarity, pwm_digits: u8, loop_hz: f32);

    /// Connect the PWM to the bridge pins.
    fn enable_outputs(&self);

    /// Force the bridge pins to their idle state.
    fn disable_outputs(&self);

    /// Close (`true`) or open the DC contactor.
    fn set_contactor(&self, closed: bool);

    /// Clear any stale fault flag and enable the fault interrupt.
    fn arm_fault_trigger(&self);

    /// Disable the fault interrupt.
    fn disarm_fault_trigger(&self);

    fn set_duty(&self, duty: u16);

    /// Clear the pending update flag.
    fn acknowledge_update(&self);
}

/// Context shared by all interrupt tiers.
pub struct Drive<P> {
    pub params: ParamStore,
    pub mode: ModeMachine,
    pub control: ControlShared,
    pub power: P,
}

impl<P: PowerStage> Drive<P> {
    pub const fn new(power: P) -> Self {
        Self {
            params: ParamStore::new(),
            mode: ModeMachine::new(),
            control: ControlShared::new(),
            power,
        }
    }

    /// Startup: publish the version and push every setting to its consumer.
    pub fn init(&self) {
        self.params.set_int(ParamId::Version, FIRMWARE_VERSION);
        self.params.set_int(ParamId::Opmode, OpMode::Off.as_param());
        self.on_param_change(None);

        log_info!("drive ready, firmware version {}", FIRMWARE_VERSION);
    }

    /// Fault shutdown.
    ///
    /// Unconditional and idempotent. Leaves the drive stopped with the fault latched; only an
    /// operator request can bring it back.
    pub fn emergency_stop(&self) {
        self.power.disarm_fault_trigger();
        self.control.disarm();
        self.power.disable_outputs();
        self.power.set_contactor(false);
        self.params.set_int(ParamId::Opmode, OpMode::Off.as_param());
        self.mode.latch_fault();
    }

    /// Compare requested and actual mode and carry out the resulting transition.
    pub fn poll_mode(&self) -> Transition {
        let requested = OpMode::from_param(self.params.get_int(ParamId::Start));
        let actual = OpMode::from_param(self.params.get_int(ParamId::Opmode));

        // Asking for Off is the operator's acknowledgement of a trip.
        if requested == Some(OpMode::Off) && self.mode.clear_fault() {
            log_info!("fault latch cleared");
        }

        let transition = decide(requested, actual, self.mode.is_faulted());
        match transition {
            Transition::Start => {
                if self.start() {
                    log_info!("mode: run");
                } else {
                    log_warn!("mode: start aborted by fault");
                    return Transition::Blocked;
                }
            }
            Transition::Stop => {
                self.stop();
                log_info!("mode: off");
            }
            Transition::Hold | Transition::Blocked => {}
        }

        transition
    }

    /// Start sequence. Returns `false` if a trip interrupted it.
    fn start(&self) -> bool {
        let settings = self.control.settings();
        self.power
            .configure(settings.polarity, settings.pwm_digits, settings.frequency);

        self.control.arm();
        self.power.arm_fault_trigger();
        self.power.enable_outputs();
        self.power.set_contactor(true);
        self.params.set_int(ParamId::Opmode, OpMode::Run.as_param());

        // The trip runs to completion above us, so a latch seen here means it fired somewhere
        // inside the sequence and some of it ran after the trip. Undo it.
        if self.mode.is_faulted() {
            self.power.disarm_fault_trigger();
            self.power.set_contactor(false);
            self.control.disarm();
            self.power.disable_outputs();
            self.params.set_int(ParamId::Opmode, OpMode::Off.as_param());
            return false;
        }

        true
    }

    fn stop(&self) {
        self.power.set_contactor(false);
        self.control.disarm();
        self.power.disable_outputs();
        self.power.disarm_fault_trigger();
        self.params.set_int(ParamId::Opmode, OpMode::Off.as_param());
    }

    /// Change notification. `None` propagates everything.
    pub fn on_param_change(&self, changed: Option<ParamId>) {
        if let Some(id) = changed {
            log_debug!("param {} changed", id.name());
        }

        self.control.apply(&self.params);
    }

    /// Operator write: validate, store, notify.
    ///
    /// A write to `start` acknowledges a latched fault. The latch is cleared before the new value
    /// is stored, so a trip landing after the store stays latched.
    pub fn set_param(&self, id: ParamId, value: f32) -> Result<(), ParamError> {
        ParamStore::check(id, value)?;

        if id == ParamId::Start && self.mode.clear_fault() {
            log_info!("fault acknowledged by operator");
        }

        self.params.set_flt(id, value);
        self.on_param_change(Some(id));
        Ok(())
    }

    /// Operator write by terminal name.
    pub fn set_param_by_name(&self, name: &str, value: f32) -> Result<ParamId, ParamError> {
        let id = ParamId::from_name(name).ok_or(ParamError::UnknownName)?;
        self.set_param(id, value)?;
        Ok(id)
    }
}

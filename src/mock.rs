// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Test doubles for the hardware seams.
//!
//! Available in unit tests and with the `mock` feature. Needs `std`.

extern crate std;

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::vec::Vec;

use core::sync::atomic::{AtomicBool, Ordering};

use crate::config::{PINDEF_ADDRESS, PINDEF_BLOCK_SIZE};
use crate::control::{FeedbackSource, Polarity, RawFeedback};
use crate::drive::PowerStage;
use crate::params::ParamStore;
use crate::pininit::{FlashError, NvStorage, RECORD_WORDS};
use crate::transport::{encode_frame, Transport, FRAME_MAP};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ================================================================================================
// Power stage
// ================================================================================================

/// Call made on [`MockPowerStage`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PowerEvent {
    Configure { polarity: Polarity, pwm_digits: u8 },
    EnableOutputs,
    DisableOutputs,
    Contactor(bool),
    ArmFaultTrigger,
    DisarmFaultTrigger,
    SetDuty(u16),
    AcknowledgeUpdate,
}

/// Power stage that records every call in order.
///
/// An observer function can be installed to act in the middle of a sequence, e.g. to fire the
/// emergency path from inside a start.
pub struct MockPowerStage {
    events: Mutex<Vec<PowerEvent>>,
    observer: Mutex<Option<fn(&PowerEvent)>>,
    contactor: AtomicBool,
}

impl MockPowerStage {
    pub const fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            observer: Mutex::new(None),
            contactor: AtomicBool::new(false),
        }
    }

    /// Calls made so far, duty updates and update acknowledgements included.
    pub fn events(&self) -> Vec<PowerEvent> {
        lock(&self.events).clone()
    }

    pub fn clear_events(&self) {
        lock(&self.events).clear();
    }

    pub fn set_observer(&self, observer: fn(&PowerEvent)) {
        *lock(&self.observer) = Some(observer);
    }

    pub fn contactor_closed(&self) -> bool {
        self.contactor.load(Ordering::SeqCst)
    }

    pub fn last_duty(&self) -> Option<u16> {
        lock(&self.events).iter().rev().find_map(|event| match event {
            PowerEvent::SetDuty(duty) => Some(*duty),
            _ => None,
        })
    }

    fn record(&self, event: PowerEvent) {
        lock(&self.events).push(event);

        // Copied out so the observer may call back into this stage.
        let observer = *lock(&self.observer);
        if let Some(observer) = observer {
            observer(&event);
        }
    }
}

impl Default for MockPowerStage {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerStage for MockPowerStage {
    fn configure(&self, polarity: Polarity, pwm_digits: u8, _loop_hz: f32) {
        self.record(PowerEvent::Configure {
            polarity,
            pwm_digits,
        });
    }

    fn enable_outputs(&self) {
        self.record(PowerEvent::EnableOutputs);
    }

    fn disable_outputs(&self) {
        self.record(PowerEvent::DisableOutputs);
    }

    fn set_contactor(&self, closed: bool) {
        self.contactor.store(closed, Ordering::SeqCst);
        self.record(PowerEvent::Contactor(closed));
    }

    fn arm_fault_trigger(&self) {
        self.record(PowerEvent::ArmFaultTrigger);
    }

    fn disarm_fault_trigger(&self) {
        self.record(PowerEvent::DisarmFaultTrigger);
    }

    fn set_duty(&self, duty: u16) {
        self.record(PowerEvent::SetDuty(duty));
    }

    fn acknowledge_update(&self) {
        self.record(PowerEvent::AcknowledgeUpdate);
    }
}

// ================================================================================================
// Feedback
// ================================================================================================

/// Feedback source returning a fixed sample until changed.
pub struct MockFeedback {
    raw: RawFeedback,
}

impl MockFeedback {
    pub fn new(raw: RawFeedback) -> Self {
        Self { raw }
    }

    pub fn set(&mut self, raw: RawFeedback) {
        self.raw = raw;
    }
}

impl FeedbackSource for MockFeedback {
    fn sample(&mut self) -> RawFeedback {
        self.raw
    }
}

// ================================================================================================
// Flash
// ================================================================================================

/// Operation performed on [`MockFlash`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlashOp {
    Unlock,
    Lock,
    Erase(u32),
    Program(u32, u32),
}

/// In-memory copy of the pin-init sector.
///
/// Starts erased (all ones). Programming requires the controller to be unlocked and the target
/// word to be erased, as on the real part.
pub struct MockFlash {
    words: Vec<u32>,
    unlocked: bool,
    ops: Vec<FlashOp>,
    fail_program_at: Option<u32>,
}

impl MockFlash {
    pub fn new() -> Self {
        Self {
            words: std::vec![0xFFFF_FFFF; (PINDEF_BLOCK_SIZE / 4) as usize],
            unlocked: false,
            ops: Vec::new(),
            fail_program_at: None,
        }
    }

    /// Sector already holding `image` at its start. No operations are recorded.
    pub fn with_image(image: &[u32]) -> Self {
        let mut flash = Self::new();
        flash.words[..image.len()].copy_from_slice(image);
        flash
    }

    /// Make programming the word at `address` fail.
    pub fn fail_program_at(&mut self, address: u32) {
        self.fail_program_at = Some(address);
    }

    pub fn ops(&self) -> &[FlashOp] {
        &self.ops
    }

    pub fn erase_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, FlashOp::Erase(_)))
            .count()
    }

    pub fn program_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, FlashOp::Program(..)))
            .count()
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// First [`RECORD_WORDS`] words of the sector.
    pub fn image(&self) -> [u32; RECORD_WORDS] {
        let mut image = [0u32; RECORD_WORDS];
        image.copy_from_slice(&self.words[..RECORD_WORDS]);
        image
    }

    fn index(&self, address: u32) -> Option<usize> {
        let offset = address.checked_sub(PINDEF_ADDRESS)?;
        if offset % 4 != 0 {
            return None;
        }
        let idx = (offset / 4) as usize;
        (idx < self.words.len()).then_some(idx)
    }
}

impl Default for MockFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl NvStorage for MockFlash {
    type Error = FlashError;

    fn read_word(&self, address: u32) -> u32 {
        self.index(address)
            .map_or(0xFFFF_FFFF, |idx| self.words[idx])
    }

    fn unlock(&mut self) {
        self.ops.push(FlashOp::Unlock);
        self.unlocked = true;
    }

    fn lock(&mut self) {
        self.ops.push(FlashOp::Lock);
        self.unlocked = false;
    }

    fn erase_block(&mut self, address: u32) -> Result<(), FlashError> {
        self.ops.push(FlashOp::Erase(address));
        if !self.unlocked {
            return Err(FlashError::Locked);
        }
        if self.index(address).is_none() {
            return Err(FlashError::WriteProtected);
        }

        self.words.fill(0xFFFF_FFFF);
        Ok(())
    }

    fn program_word(&mut self, address: u32, word: u32) -> Result<(), FlashError> {
        self.ops.push(FlashOp::Program(address, word));
        if !self.unlocked {
            return Err(FlashError::Locked);
        }
        if self.fail_program_at == Some(address) {
            return Err(FlashError::Programming);
        }

        let idx = self.index(address).ok_or(FlashError::Programming)?;
        if self.words[idx] != 0xFFFF_FFFF {
            return Err(FlashError::Programming);
        }

        self.words[idx] = word;
        Ok(())
    }
}

// ================================================================================================
// Transport and watchdog
// ================================================================================================

/// Transport that keeps every frame it was asked to send.
#[derive(Default)]
pub struct MockTransport {
    sends: usize,
    frames: Vec<(u16, [u8; 8])>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `send_all` calls.
    pub fn sends(&self) -> usize {
        self.sends
    }

    pub fn frames(&self) -> &[(u16, [u8; 8])] {
        &self.frames
    }

    pub fn reset(&mut self) {
        self.sends = 0;
        self.frames.clear();
    }
}

impl Transport for MockTransport {
    fn send_all(&mut self, params: &ParamStore) {
        self.sends += 1;
        for mapping in &FRAME_MAP {
            self.frames.push((mapping.id, encode_frame(params, mapping)));
        }
    }
}

/// Watchdog that counts refreshes.
#[derive(Default)]
pub struct MockWatchdog {
    feeds: u32,
}

impl MockWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feeds(&self) -> u32 {
        self.feeds
    }
}

impl embedded_hal::watchdog::Watchdog for MockWatchdog {
    fn feed(&mut self) {
        self.feeds += 1;
    }
}

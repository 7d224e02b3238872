// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Pin-init handoff
//!
//! The boot loader drives a few pins to safe levels before this firmware starts, using a
//! CRC-guarded record in its own flash sector. The record is rebuilt from [`desired_record`] on
//! every boot and [`persist`] rewrites the sector only when its checksum differs. Changes take
//! effect on the next reset.
//!
//! ## Modules
//!
//! - [`crc`] - CRC-32 matching the STM32 CRC unit.
//! - [`record`] - Record layout, encode and boot-side decode.
//! - [`writer`] - Flash back-end trait and the compare-and-rewrite step.

pub mod crc;
pub mod record;
pub mod writer;

pub use crc::{Crc32, SoftCrc32};
pub use record::{
    desired_record, DecodeError, Direction, Level, PinCommand, PinConfigRecord, Port,
    PIN_DATA_WORDS, RECORD_WORDS,
};
pub use writer::{persist, FlashError, NvStorage, PersistOutcome};

// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Periodic CAN publication of spot values.
//!
//! Each frame carries two entries as little-endian `i32` in 1/32 fixed point (`value * 32`).
//! The frame map is fixed at build time.

use crate::config::CAN_CLOCK_HZ;
use crate::params::{ParamId, ParamStore};

/// Fixed-point scale of published values.
pub const VALUE_SCALE: f32 = 32.0;

/// One outgoing frame: standard identifier and the two entries it carries.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameMapping {
    pub id: u16,
    pub values: [ParamId; 2],
}

pub const FRAME_MAP: [FrameMapping; 3] = [
    FrameMapping {
        id: 0x100,
        values: [ParamId::Udc, ParamId::Boosteramp],
    },
    FrameMapping {
        id: 0x101,
        values: [ParamId::Il1, ParamId::Il2],
    },
    FrameMapping {
        id: 0x102,
        values: [ParamId::Opmode, ParamId::Cpuload],
    },
];

/// Outgoing transport for spot values.
pub trait Transport {
    /// Queue every mapped frame. Must not block; frames that do not fit are dropped.
    fn send_all(&mut self, params: &ParamStore);
}

/// Payload of one mapped frame.
pub fn encode_frame(params: &ParamStore, mapping: &FrameMapping) -> [u8; 8] {
    let mut data = [0u8; 8];
    for (chunk, id) in data.chunks_exact_mut(4).zip(mapping.values) {
        let fixed = (params.get(id) * VALUE_SCALE) as i32;
        chunk.copy_from_slice(&fixed.to_le_bytes());
    }
    data
}

/// How often the spot values go out (`canperiod`).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum CanPeriod {
    Ms100,
    Ms10,
}

impl CanPeriod {
    pub fn from_param(value: i32) -> Self {
        match value {
            1 => CanPeriod::Ms10,
            _ => CanPeriod::Ms100,
        }
    }
}

/// Bus bit rate (`canspeed`).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum CanSpeed {
    K125,
    K250,
    K500,
    M1,
}

impl CanSpeed {
    pub fn from_param(value: i32) -> Option<Self> {
        match value {
            0 => Some(CanSpeed::K125),
            1 => Some(CanSpeed::K250),
            2 => Some(CanSpeed::K500),
            3 => Some(CanSpeed::M1),
            _ => None,
        }
    }

    #[inline]
    pub fn bit_rate(self) -> u32 {
        match self {
            CanSpeed::K125 => 125_000,
            CanSpeed::K250 => 250_000,
            CanSpeed::K500 => 500_000,
            CanSpeed::M1 => 1_000_000,
        }
    }

    /// CAN_BTR value: 18 time quanta per bit, sample point at 2/3 (TS1 = 11, TS2 = 6, SJW = 1).
    pub fn btr(self) -> u32 {
        const TQ_PER_BIT: u32 = 18;
        const TS1: u32 = 11;
        const TS2: u32 = 6;

        let prescaler = CAN_CLOCK_HZ / (self.bit_rate() * TQ_PER_BIT);
        ((TS2 - 1) << 20) | ((TS1 - 1) << 16) | (prescaler - 1)
    }
}

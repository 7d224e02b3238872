// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Interrupt priority table.
//!
//! STM32F7 implements the upper four priority bits, lower value wins. The board code walks
//! [`VECTORS`] once at startup, sets every priority and then unmasks the lines.

/// Interrupt sources of the three tiers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum Vector {
    /// TIM1 break input.
    EmergencyStop,
    /// TIM1 update.
    ControlLoop,
    /// TIM2 update, 1 ms tick.
    SchedulerTick,
}

/// One entry of the priority table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VectorEntry {
    pub vector: Vector,
    /// Raw NVIC priority byte.
    pub priority: u8,
}

pub const VECTORS: [VectorEntry; 3] = [
    VectorEntry {
        vector: Vector::EmergencyStop,
        priority: 0x00,
    },
    VectorEntry {
        vector: Vector::ControlLoop,
        priority: 0x10,
    },
    VectorEntry {
        vector: Vector::SchedulerTick,
        priority: 0xE0,
    },
];

impl Vector {
    pub fn priority(self) -> u8 {
        VECTORS
            .iter()
            .find(|entry| entry.vector == self)
            .map_or(u8::MAX, |entry| entry.priority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_strictly_ordered() {
        assert!(Vector::EmergencyStop.priority() < Vector::ControlLoop.priority());
        assert!(Vector::ControlLoop.priority() < Vector::SchedulerTick.priority());
    }

    #[test]
    fn priorities_use_implemented_bits_only() {
        for entry in VECTORS {
            assert_eq!(entry.priority & 0x0F, 0, "{:?}", entry.vector);
        }
    }
}

// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Lock-free cells for state shared between interrupt priorities.
//!
//! Cortex-M7 has native 32-bit loads and stores, so every cell here is a single word and can be
//! read or written from any priority without masking interrupts.

use core::sync::atomic::{AtomicU32, Ordering};

/// `f32` stored as its bit pattern in an `AtomicU32`.
pub struct AtomicF32 {
    bits: AtomicU32,
}

impl AtomicF32 {
    pub const fn zero() -> Self {
        Self {
            bits: AtomicU32::new(0),
        }
    }

    /// Create a cell holding `value`.
    ///
    /// `f32::to_bits` is const, so this can initialise `static` items.
    pub const fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_loads_negative_fractions() {
        let cell = AtomicF32::new(1.5);
        assert_eq!(cell.load(), 1.5);

        cell.store(-0.125);
        assert_eq!(cell.load(), -0.125);
    }
}

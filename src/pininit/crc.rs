// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! CRC-32 as computed by the STM32 CRC unit.
//!
//! Polynomial 0x04C11DB7, initial value 0xFFFFFFFF, 32-bit words fed MSB first, no reflection,
//! no final XOR. The board uses the peripheral (`hw::crc`), host tests use [`SoftCrc32`]; both
//! must agree bit for bit with the boot loader.

use crc::{Crc, Digest, CRC_32_MPEG_2};

pub const CRC32_POLY: u32 = 0x04C1_1DB7;
pub const CRC32_INIT: u32 = 0xFFFF_FFFF;

/// Word-wise CRC-32 engine.
pub trait Crc32 {
    /// Load the initial value.
    fn reset(&mut self);

    fn feed(&mut self, word: u32);

    fn value(&self) -> u32;

    /// Reset, feed `words` and return the result.
    fn checksum(&mut self, words: &[u32]) -> u32 {
        self.reset();
        for &word in words {
            self.feed(word);
        }
        self.value()
    }
}

// The STM32 unit is CRC-32/MPEG-2 with each word fed as big-endian bytes.
static ENGINE: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// Software implementation on the `crc` crate.
#[derive(Clone)]
pub struct SoftCrc32 {
    digest: Digest<'static, u32>,
}

impl SoftCrc32 {
    pub fn new() -> Self {
        Self {
            digest: ENGINE.digest(),
        }
    }
}

impl Default for SoftCrc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc32 for SoftCrc32 {
    fn reset(&mut self) {
        self.digest = ENGINE.digest();
    }

    #[inline]
    fn feed(&mut self, word: u32) {
        self.digest.update(&word.to_be_bytes());
    }

    fn value(&self) -> u32 {
        self.digest.clone().finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_hardware_reference_values() {
        let mut crc = SoftCrc32::new();
        assert_eq!(crc.checksum(&[0x1234_5678]), 0xDF8A_8A2B);
        assert_eq!(crc.checksum(&[0]), 0xC704_DD7B);
        assert_eq!(crc.checksum(&[0x3132_3334, 0x3536_3738]), 0x49E3_C2FB);
    }

    #[test]
    fn checksum_resets_between_runs() {
        let mut crc = SoftCrc32::new();
        crc.feed(0xDEAD_BEEF);
        assert_eq!(crc.checksum(&[0]), 0xC704_DD7B);
    }

    #[test]
    fn engine_matches_unit_parameters() {
        assert_eq!(CRC_32_MPEG_2.poly, CRC32_POLY);
        assert_eq!(CRC_32_MPEG_2.init, CRC32_INIT);
        assert!(!CRC_32_MPEG_2.refin && !CRC_32_MPEG_2.refout);
        assert_eq!(CRC_32_MPEG_2.xorout, 0);
    }

    #[test]
    fn value_does_not_consume_state() {
        let mut crc = SoftCrc32::new();
        crc.feed(0x1234_5678);
        assert_eq!(crc.value(), 0xDF8A_8A2B);
        assert_eq!(crc.value(), 0xDF8A_8A2B);
    }

    #[test]
    fn empty_input_is_initial_value() {
        let mut crc = SoftCrc32::new();
        assert_eq!(crc.checksum(&[]), CRC32_INIT);
    }
}

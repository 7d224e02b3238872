// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Write the pin-init record to flash when it changed.

use super::crc::Crc32;
use super::record::{PinConfigRecord, PIN_DATA_WORDS, RECORD_WORDS};
use crate::config::PINDEF_ADDRESS;

/// Errors reported by a flash back-end.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum FlashError {
    /// Write attempted while the controller was locked.
    Locked,
    /// Sector is write-protected.
    WriteProtected,
    /// Programming sequence, alignment or parallelism error.
    Programming,
    /// Word did not read back as written.
    Verify { address: u32 },
}

/// Word-addressed non-volatile storage with block erase.
pub trait NvStorage {
    type Error;

    fn read_word(&self, address: u32) -> u32;

    fn unlock(&mut self);

    fn lock(&mut self);

    /// Erase the whole block containing `address`.
    fn erase_block(&mut self, address: u32) -> Result<(), Self::Error>;

    fn program_word(&mut self, address: u32, word: u32) -> Result<(), Self::Error>;
}

/// What [`persist`] did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum PersistOutcome {
    /// Stored checksum already matched.
    Unchanged,
    /// Block erased and `words` words programmed.
    Rewritten { words: usize },
}

/// Make the stored record match `record`.
///
/// Only the checksum word is compared. On mismatch the block is erased and the image programmed
/// word by word in increasing address order, checksum last, so an interrupted write never leaves
/// a valid checksum over partial data. Flash is locked again on every path.
pub fn persist<S, C>(
    storage: &mut S,
    crc: &mut C,
    record: &PinConfigRecord,
) -> Result<PersistOutcome, S::Error>
where
    S: NvStorage,
    C: Crc32,
{
    let image = record.encode(crc);

    let stored = storage.read_word(word_address(PIN_DATA_WORDS));
    if stored == image[PIN_DATA_WORDS] {
        return Ok(PersistOutcome::Unchanged);
    }

    storage.unlock();
    let result = rewrite(storage, &image);
    storage.lock();

    result.map(|()| PersistOutcome::Rewritten { words: RECORD_WORDS })
}

fn rewrite<S: NvStorage>(storage: &mut S, image: &[u32; RECORD_WORDS]) -> Result<(), S::Error> {
    storage.erase_block(PINDEF_ADDRESS)?;

    for (idx, word) in image.iter().enumerate() {
        storage.program_word(word_address(idx), *word)?;
    }

    Ok(())
}

#[inline]
fn word_address(idx: usize) -> u32 {
    PINDEF_ADDRESS + 4 * idx as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PIN_COMMAND_SLOTS;
    use crate::mock::{FlashOp, MockFlash};
    use crate::pininit::crc::SoftCrc32;
    use crate::pininit::record::{desired_record, Level, PinCommand, Port};

    #[test]
    fn blank_flash_is_written_once() {
        let mut flash = MockFlash::new();
        let mut crc = SoftCrc32::new();

        assert_eq!(
            persist(&mut flash, &mut crc, &desired_record()),
            Ok(PersistOutcome::Rewritten { words: RECORD_WORDS })
        );
        assert_eq!(
            persist(&mut flash, &mut crc, &desired_record()),
            Ok(PersistOutcome::Unchanged)
        );

        assert_eq!(flash.erase_count(), 1);
        assert_eq!(flash.program_count(), RECORD_WORDS);
        assert!(!flash.is_unlocked());
    }

    #[test]
    fn matching_checksum_touches_nothing() {
        let mut crc = SoftCrc32::new();
        let mut flash = MockFlash::with_image(&desired_record().encode(&mut crc));

        assert_eq!(
            persist(&mut flash, &mut crc, &desired_record()),
            Ok(PersistOutcome::Unchanged)
        );
        assert!(flash.ops().is_empty());
    }

    #[test]
    fn mismatch_erases_then_programs_in_address_order() {
        let mut crc = SoftCrc32::new();
        let mut flash = MockFlash::with_image(&desired_record().encode(&mut crc));

        let mut commands = [None; PIN_COMMAND_SLOTS];
        commands[0] = Some(PinCommand::output(Port::C, 1 << 13, Level::Low));
        commands[1] = Some(PinCommand::output(Port::E, 1 << 2, Level::Low));
        let changed = PinConfigRecord::new(commands);
        persist(&mut flash, &mut crc, &changed).unwrap();

        let ops = flash.ops();
        assert_eq!(ops.first(), Some(&FlashOp::Unlock));
        assert_eq!(ops[1], FlashOp::Erase(PINDEF_ADDRESS));
        assert_eq!(ops.last(), Some(&FlashOp::Lock));

        let addresses: Vec<u32> = ops
            .iter()
            .filter_map(|op| match op {
                FlashOp::Program(address, _) => Some(*address),
                _ => None,
            })
            .collect();
        assert_eq!(addresses.len(), RECORD_WORDS);
        assert!(addresses.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(addresses[0], PINDEF_ADDRESS);

        // Checksum is the last word programmed.
        assert_eq!(
            ops[ops.len() - 2],
            FlashOp::Program(word_address(PIN_DATA_WORDS), changed.checksum(&mut crc))
        );
        assert_eq!(flash.image(), changed.encode(&mut crc));
    }

    #[test]
    fn program_failure_relocks_and_reports() {
        let mut flash = MockFlash::new();
        flash.fail_program_at(word_address(3));

        assert_eq!(
            persist(&mut flash, &mut SoftCrc32::new(), &desired_record()),
            Err(FlashError::Programming)
        );
        assert_eq!(flash.ops().last(), Some(&FlashOp::Lock));
        assert!(!flash.is_unlocked());
        // Checksum never written, next boot retries.
        assert_eq!(flash.read_word(word_address(PIN_DATA_WORDS)), 0xFFFF_FFFF);
    }
}
